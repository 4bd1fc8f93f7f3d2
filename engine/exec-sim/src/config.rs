//! Simulator configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{QtyQ, TsNs};

/// Self-trade prevention policy, applied when a pending order reaches its
/// activation time.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum StpPolicy {
    /// No check; activation proceeds.
    None,
    /// Reject the activating order if it would self-cross.
    RejectIncoming,
    /// Cancel resting opposite-side orders that would self-cross, then
    /// activate the incoming normally.
    CancelResting,
}

/// `fee = floor(notional_q * fee_ppm / 1_000_000)`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub maker_fee_ppm: u64,
    pub taker_fee_ppm: u64,
}

/// Spot-like risk limits.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Max absolute position in base qty_q. 0 disables the bound.
    pub max_abs_position_qty_q: QtyQ,
    /// Disallow selling more base than currently unlocked.
    pub spot_no_short: bool,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self { max_abs_position_qty_q: 0, spot_no_short: true }
    }
}

/// All knobs of one simulator instance. Passed explicitly to the
/// constructor; there is no process-wide configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SimulatorParams {
    /// Agent -> exchange latency added to the submission time to obtain
    /// the activation time.
    pub outbound_latency_ns: TsNs,

    /// Exchange -> agent observation latency. Reserved for the ingest
    /// collaborator; the core does not consume it.
    pub observation_latency_ns: TsNs,

    /// Lifetime cap on submissions since reset (not a concurrent cap).
    pub max_orders: usize,

    /// Cap on lifecycle events.
    pub max_events: usize,

    /// Cap on fill events.
    pub max_fills: usize,

    /// Depletion attribution ratio in [0, 1_000_000]:
    /// `effective = floor(depletion * alpha_ppm / 1_000_000)` with the
    /// min-depletion rule applied.
    pub alpha_ppm: u64,

    pub stp: StpPolicy,
    pub fees: FeeSchedule,
    pub risk: RiskLimits,
}

impl Default for SimulatorParams {
    fn default() -> Self {
        Self {
            outbound_latency_ns: 0,
            observation_latency_ns: 0,
            max_orders: 4096,
            max_events: 65_536,
            max_fills: 65_536,
            alpha_ppm: 1_000_000,
            stp: StpPolicy::RejectIncoming,
            fees: FeeSchedule::default(),
            risk: RiskLimits::default(),
        }
    }
}

#[derive(Error, Debug, Eq, PartialEq)]
pub enum ParamsError {
    #[error("max_orders must be > 0")]
    OrdersZero,
    #[error("max_events must be > 0")]
    EventsZero,
    #[error("max_fills must be > 0")]
    FillsZero,
    #[error("alpha_ppm must be <= 1_000_000, got {0}")]
    AlphaOutOfRange(u64),
    #[error("latencies must be non-negative")]
    NegativeLatency,
}

impl SimulatorParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.max_orders == 0 {
            return Err(ParamsError::OrdersZero);
        }
        if self.max_events == 0 {
            return Err(ParamsError::EventsZero);
        }
        if self.max_fills == 0 {
            return Err(ParamsError::FillsZero);
        }
        if self.alpha_ppm > 1_000_000 {
            return Err(ParamsError::AlphaOutOfRange(self.alpha_ppm));
        }
        if self.outbound_latency_ns < 0 || self.observation_latency_ns < 0 {
            return Err(ParamsError::NegativeLatency);
        }
        Ok(())
    }
}
