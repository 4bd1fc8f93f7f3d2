//! Lifecycle and fill event records.

use serde::{Deserialize, Serialize};

use crate::types::{CashQ, LiquidityFlag, OrderId, OrderState, PriceQ, QtyQ, RejectReason, Side, TsNs};

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum EventType {
    Submit = 0,
    Activate = 1,
    Cancel = 2,
    Reject = 3,
}

/// One lifecycle transition. `order_id` is 0 for submissions rejected
/// before an id was assigned.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub ts: TsNs,
    pub order_id: OrderId,
    pub kind: EventType,
    pub state: OrderState,
    pub reason: Option<RejectReason>,
}

/// One fill at one price level. Aggregate fills never span levels: a
/// sweep that consumes three levels emits three of these.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FillEvent {
    pub ts: TsNs,
    pub order_id: OrderId,
    pub side: Side,
    pub price_q: PriceQ,
    pub qty_q: QtyQ,
    pub liq: LiquidityFlag,
    pub notional_cash_q: CashQ,
    pub fee_cash_q: CashQ,
}
