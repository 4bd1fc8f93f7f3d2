//! Core identifiers, enums, and request types.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Simulator-assigned dense order id. 0 is never a valid id; the order
/// placement APIs return 0 to signal rejection.
pub type OrderId = u64;

/// Fixed-point price (scale 10^8, quote per base).
pub type PriceQ = i64;
/// Fixed-point quantity (scale 10^8, base units).
pub type QtyQ = i64;
/// Fixed-point cash (quote units, same quantisation as price * qty / scale).
pub type CashQ = i64;
/// Simulator-clock nanoseconds (the capture stream's receive domain).
pub type TsNs = i64;

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

impl Side {
    #[inline]
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum OrderType {
    Limit = 0,
    Market = 1,
}

/// Time-in-force. Carried on the order; GTC is the honoured contract in
/// this version, IOC/FOK enforcement is reserved for a later one.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Tif {
    Gtc = 0,
    Ioc = 1,
    Fok = 2,
}

/// State of an order's price relative to the visible top-N.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Visibility {
    /// Price currently within the visible range.
    Visible = 0,
    /// Price outside the visible range (deep book or through the touch).
    Blind = 1,
    /// Was visible at a slot, has since disappeared; queue tracking frozen.
    Frozen = 2,
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum OrderState {
    Pending = 0,
    Active = 1,
    Partial = 2,
    Filled = 3,
    Cancelled = 4,
    Rejected = 5,
}

impl OrderState {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Filled | OrderState::Cancelled | OrderState::Rejected)
    }

    /// Resting in a bucket, eligible for matching.
    #[inline]
    pub fn is_resting(&self) -> bool {
        matches!(self, OrderState::Active | OrderState::Partial)
    }
}

/// Rejection reasons - explicit, enumerable.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    InvalidParams = 1,
    InsufficientFunds = 2,
    /// Capacity exhaustion: order store, event log, or an STP cancel
    /// burst that would overflow the event log.
    InsufficientResources = 3,
    SelfTradePrevention = 4,
    UnknownOrderId = 5,
    AlreadyTerminal = 6,
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum LiquidityFlag {
    Maker = 0,
    Taker = 1,
}

/// Compact handle into the dense order table.
#[repr(transparent)]
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct OrderHandle(pub u32);

pub const H_NONE: OrderHandle = OrderHandle(u32::MAX);

impl fmt::Debug for OrderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == H_NONE { write!(f, "H_NONE") } else { write!(f, "H({})", self.0) }
    }
}

/// Limit order request.
#[derive(Clone, Copy, Debug)]
pub struct LimitOrderRequest {
    pub side: Side,
    pub price_q: PriceQ,
    pub qty_q: QtyQ,
    pub tif: Tif,
    /// Client correlation id; stored as metadata, never used for lookup.
    pub client_order_id: u64,
}

impl LimitOrderRequest {
    pub fn new(side: Side, price_q: PriceQ, qty_q: QtyQ) -> Self {
        Self { side, price_q, qty_q, tif: Tif::Gtc, client_order_id: 0 }
    }
}

/// Market order request. Accepted as a request type; rejected as
/// unsupported by this version of the engine.
#[derive(Clone, Copy, Debug)]
pub struct MarketOrderRequest {
    pub side: Side,
    pub qty_q: QtyQ,
    pub tif: Tif,
    pub client_order_id: u64,
}

impl MarketOrderRequest {
    pub fn new(side: Side, qty_q: QtyQ) -> Self {
        Self { side, qty_q, tif: Tif::Ioc, client_order_id: 0 }
    }
}
