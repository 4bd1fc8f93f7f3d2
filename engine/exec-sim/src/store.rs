//! Dense order storage with a direct-address id table.
//!
//! Orders are appended to a contiguous vector in submission order; dense
//! ids are assigned monotonically from 1. `max_orders` is a lifetime cap
//! since the last reset, not a concurrent one, so the id also bounds the
//! direct-address table.

use crate::types::{
    OrderHandle, OrderId, OrderState, OrderType, PriceQ, QtyQ, RejectReason, Side, Tif, TsNs,
    Visibility, H_NONE,
};

/// One order as stored by the simulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    /// Client correlation id; metadata only.
    pub client_order_id: u64,
    pub typ: OrderType,
    pub side: Side,
    pub tif: Tif,

    /// Limit price; 0 for market orders.
    pub price_q: PriceQ,
    pub qty_q: QtyQ,
    pub filled_qty_q: QtyQ,

    /// Displayed liquidity modelled as standing between this order and
    /// the front of the queue at its price.
    pub qty_ahead_q: QtyQ,
    /// Last observed displayed qty at the order's level; meaningful only
    /// while not Blind.
    pub last_level_qty_q: QtyQ,
    /// Last observed level index, `None` when the price has no slot.
    pub last_level_idx: Option<u8>,
    pub visibility: Visibility,

    /// Simulator-clock timestamps.
    pub submit_ts: TsNs,
    /// `submit_ts + outbound_latency`.
    pub activate_ts: TsNs,

    pub state: OrderState,
    pub reject_reason: Option<RejectReason>,

    // Intrusive per-price FIFO links (handles into the order table).
    // Valid iff the order is resting in a bucket.
    pub(crate) prev: OrderHandle,
    pub(crate) next: OrderHandle,
}

impl Order {
    #[inline]
    pub fn remaining_qty_q(&self) -> QtyQ {
        self.qty_q - self.filled_qty_q
    }
}

/// Append-only order table keyed by dense ids.
pub struct OrderStore {
    orders: Vec<Order>,
    /// Direct-address table: id -> handle, `H_NONE` when absent.
    /// Sized `max_orders + 1`; index 0 stays unused.
    id_to_index: Vec<OrderHandle>,
    next_id: OrderId,
    max_orders: usize,
}

impl OrderStore {
    pub fn new(max_orders: usize) -> Self {
        let mut s = Self {
            orders: Vec::new(),
            id_to_index: Vec::new(),
            next_id: 1,
            max_orders,
        };
        s.reset();
        s
    }

    pub fn reset(&mut self) {
        self.orders.clear();
        self.orders.reserve(self.max_orders);
        self.id_to_index.clear();
        self.id_to_index.resize(self.max_orders + 1, H_NONE);
        self.next_id = 1;
    }

    /// Whether one more submission fits under the lifetime cap.
    #[inline]
    pub fn has_capacity(&self) -> bool {
        self.next_id as usize <= self.max_orders && self.orders.len() < self.max_orders
    }

    /// Store an order, assigning its dense id. Caller must check
    /// [`has_capacity`](Self::has_capacity) first.
    pub fn insert(&mut self, mut order: Order) -> (OrderId, OrderHandle) {
        debug_assert!(self.has_capacity());
        let id = self.next_id;
        self.next_id += 1;
        let h = OrderHandle(self.orders.len() as u32);
        order.id = id;
        order.prev = H_NONE;
        order.next = H_NONE;
        self.orders.push(order);
        self.id_to_index[id as usize] = h;
        (id, h)
    }

    #[inline]
    pub fn handle_of(&self, id: OrderId) -> Option<OrderHandle> {
        if id == 0 || id as usize >= self.id_to_index.len() {
            return None;
        }
        let h = self.id_to_index[id as usize];
        if h == H_NONE { None } else { Some(h) }
    }

    #[inline]
    pub fn get(&self, h: OrderHandle) -> &Order {
        &self.orders[h.0 as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, h: OrderHandle) -> &mut Order {
        &mut self.orders[h.0 as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    #[inline]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_limit(side: Side, price_q: PriceQ, qty_q: QtyQ) -> Order {
        Order {
            id: 0,
            client_order_id: 0,
            typ: OrderType::Limit,
            side,
            tif: Tif::Gtc,
            price_q,
            qty_q,
            filled_qty_q: 0,
            qty_ahead_q: 0,
            last_level_qty_q: 0,
            last_level_idx: None,
            visibility: Visibility::Blind,
            submit_ts: 0,
            activate_ts: 0,
            state: OrderState::Pending,
            reject_reason: None,
            prev: H_NONE,
            next: H_NONE,
        }
    }

    #[test]
    fn dense_ids_and_direct_address() {
        let mut s = OrderStore::new(4);
        let (id1, h1) = s.insert(blank_limit(Side::Buy, 100, 10));
        let (id2, h2) = s.insert(blank_limit(Side::Sell, 101, 5));
        assert_eq!(id1, 1);
        assert_eq!(id2, 2);
        assert_eq!(s.handle_of(id1), Some(h1));
        assert_eq!(s.handle_of(id2), Some(h2));
        assert_eq!(s.get(h2).price_q, 101);
        assert_eq!(s.handle_of(0), None);
        assert_eq!(s.handle_of(3), None);
        assert_eq!(s.handle_of(999), None);
    }

    #[test]
    fn lifetime_cap() {
        let mut s = OrderStore::new(2);
        assert!(s.has_capacity());
        s.insert(blank_limit(Side::Buy, 100, 1));
        s.insert(blank_limit(Side::Buy, 99, 1));
        assert!(!s.has_capacity());
        // The cap is lifetime: nothing is freed by terminal states.
        s.get_mut(OrderHandle(0)).state = OrderState::Cancelled;
        assert!(!s.has_capacity());
    }

    #[test]
    fn reset_restores_capacity() {
        let mut s = OrderStore::new(1);
        s.insert(blank_limit(Side::Buy, 100, 1));
        assert!(!s.has_capacity());
        s.reset();
        assert!(s.has_capacity());
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
        let (id, _) = s.insert(blank_limit(Side::Buy, 100, 1));
        assert_eq!(id, 1);
    }

    #[test]
    fn remaining_qty() {
        let mut o = blank_limit(Side::Buy, 100, 10);
        o.filled_qty_q = 4;
        assert_eq!(o.remaining_qty_q(), 6);
    }
}
