//! Deterministic market-execution simulator over replayed L2 snapshots.
//!
//! The simulator executes a single agent's orders against pre-recorded
//! top-N order-book snapshots under explicit models of outbound latency,
//! queue position, passive and aggressive fills, self-trade prevention,
//! and fixed-point accounting. Identical snapshots, configuration, and
//! ordered agent actions yield bitwise-identical orders, events, fills,
//! and ledger.
//!
//! Everything is single-threaded and synchronous by contract: the only
//! yield point is the return from [`Simulator::step`] back to the caller,
//! who drives time by feeding snapshots in receive-timestamp order.

mod book;
mod config;
mod events;
mod fixed;
mod ledger;
mod lookup;
mod pending;
mod queue;
mod sim;
mod stp;
mod store;
mod sweep;
mod types;

pub use config::{FeeSchedule, ParamsError, RiskLimits, SimulatorParams, StpPolicy};
pub use events::{Event, EventType, FillEvent};
pub use fixed::{fee_cash, mul_div_floor, notional_cash};
pub use ledger::Ledger;
pub use lookup::{ask_level, bid_level, effective_depletion, level_for, LevelLookup};
pub use sim::Simulator;
pub use store::Order;
pub use types::{
    CashQ, LimitOrderRequest, LiquidityFlag, MarketOrderRequest, OrderId, OrderState, OrderType,
    PriceQ, QtyQ, RejectReason, Side, Tif, TsNs, Visibility,
};
