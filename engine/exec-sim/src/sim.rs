//! The simulator: order entry, the step orchestrator, and fill/ledger
//! application.

use l2_snap::SnapshotRecord;
use tracing::{debug, trace};

use crate::book::BookSide;
use crate::config::{ParamsError, SimulatorParams};
use crate::events::{Event, EventType, FillEvent};
use crate::fixed::{checked_notional_cash, fee_cash, notional_cash};
use crate::ledger::Ledger;
use crate::pending::{PendingEntry, PendingQueue};
use crate::store::{Order, OrderStore};
use crate::types::{
    LimitOrderRequest, LiquidityFlag, MarketOrderRequest, OrderHandle, OrderId, OrderState,
    OrderType, PriceQ, QtyQ, RejectReason, Side, TsNs, Visibility, H_NONE,
};

/// Deterministic execution simulator over a replayed snapshot stream.
///
/// One instance owns exactly one execution timeline: the order store, the
/// ledger, both logs, the pending heap, and both bucket collections are
/// mutated only by this instance's methods. The caller drives time by
/// feeding snapshots in receive-timestamp order.
pub struct Simulator {
    params: SimulatorParams,
    now: TsNs,
    ledger: Ledger,

    pub(crate) store: OrderStore,
    pending: PendingQueue,
    next_seq: u64,

    pub(crate) bids: BookSide,
    pub(crate) asks: BookSide,

    pub(crate) events: Vec<Event>,
    pub(crate) fills: Vec<FillEvent>,
}

impl Simulator {
    pub fn new(params: SimulatorParams) -> Result<Self, ParamsError> {
        params.validate()?;
        let mut sim = Self {
            store: OrderStore::new(params.max_orders),
            params,
            now: 0,
            ledger: Ledger::default(),
            pending: PendingQueue::new(),
            next_seq: 1,
            bids: BookSide::new(Side::Buy),
            asks: BookSide::new(Side::Sell),
            events: Vec::new(),
            fills: Vec::new(),
        };
        sim.reset(0, Ledger::default());
        Ok(sim)
    }

    /// Clear all state for a deterministic replay. `start_ts` sets the
    /// simulator clock baseline.
    pub fn reset(&mut self, start_ts: TsNs, initial_ledger: Ledger) {
        debug_assert!(initial_ledger.locked_cash_q >= 0);
        debug_assert!(initial_ledger.locked_position_qty_q >= 0);

        self.now = start_ts;
        self.ledger = initial_ledger;
        self.store.reset();
        self.pending.clear();
        self.next_seq = 1;
        self.bids.clear();
        self.asks.clear();
        self.events.clear();
        self.events.reserve(self.params.max_events.min(1 << 20));
        self.fills.clear();
        self.fills.reserve(self.params.max_fills.min(1 << 20));
    }

    // --- Read-only views (for tests/harnesses; not for hot-path use) ---

    #[inline]
    pub fn now(&self) -> TsNs {
        self.now
    }

    #[inline]
    pub fn params(&self) -> &SimulatorParams {
        &self.params
    }

    #[inline]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[inline]
    pub fn orders(&self) -> &[Order] {
        self.store.orders()
    }

    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.store.handle_of(order_id).map(|h| self.store.get(h))
    }

    #[inline]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[inline]
    pub fn fills(&self) -> &[FillEvent] {
        &self.fills
    }

    // --- Order entry ---

    /// Place a limit order. Returns the assigned order id, 0 on rejection.
    pub fn place_limit(&mut self, req: &LimitOrderRequest) -> OrderId {
        // Lifetime cap on submissions.
        if !self.store.has_capacity() {
            return self.reject_submission(RejectReason::InsufficientResources);
        }
        if req.price_q <= 0 || req.qty_q <= 0 {
            return self.reject_submission(RejectReason::InvalidParams);
        }
        // Auditability: the Submit event must be recordable.
        if !self.can_log_event() {
            return self.reject_submission(RejectReason::InsufficientResources);
        }
        if let Err(reason) = self.risk_check_and_lock_limit(req.side, req.price_q, req.qty_q) {
            return self.reject_submission(reason);
        }

        let activate_ts = self.now.saturating_add(self.params.outbound_latency_ns);
        let order = Order {
            id: 0,
            client_order_id: req.client_order_id,
            typ: OrderType::Limit,
            side: req.side,
            tif: req.tif,
            price_q: req.price_q,
            qty_q: req.qty_q,
            filled_qty_q: 0,
            qty_ahead_q: 0,
            last_level_qty_q: 0,
            last_level_idx: None,
            visibility: Visibility::Blind,
            submit_ts: self.now,
            activate_ts,
            state: OrderState::Pending,
            reject_reason: None,
            prev: H_NONE,
            next: H_NONE,
        };
        let (id, _) = self.store.insert(order);
        let logged =
            self.push_event(self.now, id, EventType::Submit, OrderState::Pending, None);
        debug_assert!(logged, "submit headroom was pre-checked");

        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(PendingEntry { activate_ts, seq, order_id: id });
        trace!(order_id = id, side = ?req.side, price_q = req.price_q, qty_q = req.qty_q, "limit submitted");
        id
    }

    /// Market orders have no pricing/locking rule in this version and are
    /// rejected up front. Always returns 0.
    pub fn place_market(&mut self, req: &MarketOrderRequest) -> OrderId {
        if req.qty_q <= 0 {
            return self.reject_submission(RejectReason::InvalidParams);
        }
        self.reject_submission(RejectReason::InvalidParams)
    }

    /// Cancel by order id. True iff the order moved to Cancelled and a
    /// Cancel event was recorded; fails fast otherwise with no state
    /// change.
    pub fn cancel(&mut self, order_id: OrderId) -> bool {
        match self.cancel_inner(order_id) {
            Ok(()) => true,
            Err(reason) => {
                debug!(order_id, ?reason, "cancel refused");
                false
            }
        }
    }

    fn cancel_inner(&mut self, order_id: OrderId) -> Result<(), RejectReason> {
        let h = self.store.handle_of(order_id).ok_or(RejectReason::UnknownOrderId)?;
        let state = self.store.get(h).state;
        if state.is_terminal() {
            return Err(RejectReason::AlreadyTerminal);
        }
        // Auditability: the Cancel event must be recordable.
        if !self.can_log_event() {
            return Err(RejectReason::InsufficientResources);
        }

        if state.is_resting() {
            self.remove_resting(h);
        }
        self.unlock_remaining(h);
        self.store.get_mut(h).state = OrderState::Cancelled;
        let logged =
            self.push_event(self.now, order_id, EventType::Cancel, OrderState::Cancelled, None);
        debug_assert!(logged, "cancel headroom was pre-checked");
        Ok(())
    }

    // --- Step orchestrator ---

    /// Apply one snapshot. Strictly ordered: clock, queue/visibility with
    /// passive fills, aggressive sweep, pending activation (with STP),
    /// bucket compaction. Activation last is what makes a just-activated
    /// order ineligible for fills until the next step.
    pub fn step(&mut self, rec: &SnapshotRecord) {
        self.now = rec.ts_recv_ns;

        // Bucket references must stay stable across the passes.
        self.bids.set_defer_compact(true);
        self.asks.set_defer_compact(true);

        for bidx in 0..self.bids.len() {
            self.update_bucket_passive(Side::Buy, bidx, rec);
        }
        for aidx in 0..self.asks.len() {
            self.update_bucket_passive(Side::Sell, aidx, rec);
        }

        self.apply_aggressive_fills(rec);

        self.activate_pending(rec);

        self.bids.set_defer_compact(false);
        self.asks.set_defer_compact(false);
        self.bids.compact();
        self.asks.compact();
    }

    fn activate_pending(&mut self, rec: &SnapshotRecord) {
        while let Some(entry) = self.pending.pop_due(self.now) {
            let Some(h) = self.store.handle_of(entry.order_id) else {
                continue;
            };
            // Cancelled or rejected while pending: discard silently.
            if self.store.get(h).state != OrderState::Pending {
                continue;
            }

            if !self.apply_stp_on_activate(h) {
                continue;
            }

            if !self.push_event(
                self.now,
                entry.order_id,
                EventType::Activate,
                OrderState::Active,
                None,
            ) {
                self.unlock_remaining(h);
                let o = self.store.get_mut(h);
                o.state = OrderState::Rejected;
                o.reject_reason = Some(RejectReason::InsufficientResources);
                debug!(order_id = entry.order_id, "activation rejected: event log full");
                continue;
            }

            self.store.get_mut(h).state = OrderState::Active;
            self.init_queue_on_activate(rec, h);

            let (side, price_q) = {
                let o = self.store.get(h);
                (o.side, o.price_q)
            };
            let book = match side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            let bidx = book.get_or_insert(price_q);
            let joined_empty = book.bucket(bidx).size == 0;
            book.push_back(&mut self.store, bidx, h);
            if joined_empty {
                // Anchor the bucket's observation to the activation-time
                // lookup so the next snapshot's depletion is measured
                // against this one.
                let o = self.store.get(h);
                let (vis, idx, qty) = (o.visibility, o.last_level_idx, o.last_level_qty_q);
                let b = book.bucket_mut(bidx);
                b.visibility = vis;
                b.last_level_idx = idx;
                b.last_level_qty_q = qty;
            } else {
                // Join an already-tracked bucket: mirror its state and
                // stand behind the currently displayed quantity.
                let b = *book.bucket(bidx);
                let o = self.store.get_mut(h);
                o.visibility = b.visibility;
                o.last_level_idx = b.last_level_idx;
                o.last_level_qty_q = b.last_level_qty_q;
                o.qty_ahead_q = b.last_level_qty_q;
            }
            trace!(order_id = entry.order_id, "activated");
        }
    }

    // --- Internal helpers shared by the pass modules ---

    #[inline]
    pub(crate) fn can_log_event(&self) -> bool {
        self.events.len() < self.params.max_events
    }

    #[inline]
    pub(crate) fn can_log_fill(&self) -> bool {
        self.fills.len() < self.params.max_fills
    }

    /// Append a lifecycle event; false when the log is at capacity, in
    /// which case the caller must reject or refuse deterministically.
    pub(crate) fn push_event(
        &mut self,
        ts: TsNs,
        order_id: OrderId,
        kind: EventType,
        state: OrderState,
        reason: Option<RejectReason>,
    ) -> bool {
        if self.events.len() >= self.params.max_events {
            return false;
        }
        self.events.push(Event { ts, order_id, kind, state, reason });
        true
    }

    fn reject_submission(&mut self, reason: RejectReason) -> OrderId {
        // Best effort: the log itself may be what is exhausted.
        let _ = self.push_event(self.now, 0, EventType::Reject, OrderState::Rejected, Some(reason));
        debug!(?reason, "submission rejected");
        0
    }

    fn risk_check_and_lock_limit(
        &mut self,
        side: Side,
        price_q: PriceQ,
        qty_q: QtyQ,
    ) -> Result<(), RejectReason> {
        let max_abs = self.params.risk.max_abs_position_qty_q;
        if max_abs > 0 {
            let projected = match side {
                Side::Buy => self.ledger.position_qty_q.saturating_add(qty_q),
                Side::Sell => self.ledger.position_qty_q.saturating_sub(qty_q),
            };
            if projected.saturating_abs() > max_abs {
                return Err(RejectReason::InsufficientFunds);
            }
        }

        match side {
            Side::Buy => {
                let required = checked_notional_cash(price_q, qty_q)
                    .ok_or(RejectReason::InvalidParams)?;
                if self.ledger.available_cash_q() < required {
                    return Err(RejectReason::InsufficientFunds);
                }
                self.ledger.lock_cash(required);
            }
            Side::Sell => {
                // Base is only reserved under spot-no-short; with
                // shorting allowed there is nothing to hold back.
                if self.params.risk.spot_no_short {
                    if self.ledger.available_position_qty_q() < qty_q {
                        return Err(RejectReason::InsufficientFunds);
                    }
                    self.ledger.lock_position(qty_q);
                }
            }
        }
        Ok(())
    }

    /// Release the locks still held for an order's unfilled remainder.
    pub(crate) fn unlock_remaining(&mut self, h: OrderHandle) {
        let (typ, side, price_q, remaining) = {
            let o = self.store.get(h);
            (o.typ, o.side, o.price_q, o.remaining_qty_q())
        };
        if typ != OrderType::Limit || remaining <= 0 {
            return;
        }
        match side {
            Side::Buy => self.ledger.release_cash(notional_cash(price_q, remaining)),
            Side::Sell => {
                if self.params.risk.spot_no_short {
                    self.ledger.release_position(remaining);
                }
            }
        }
    }

    /// Apply a single fill: ledger, locks, order state, fill event. The
    /// whole mutation is applied before the next fill is observed.
    /// Caller has verified fill-log headroom.
    pub(crate) fn apply_fill(
        &mut self,
        h: OrderHandle,
        price_q: PriceQ,
        qty_q: QtyQ,
        liq: LiquidityFlag,
    ) {
        debug_assert!(qty_q > 0);
        debug_assert!(self.can_log_fill());
        let (id, side, limit_q, qty_total, filled_before) = {
            let o = self.store.get(h);
            (o.id, o.side, o.price_q, o.qty_q, o.filled_qty_q)
        };
        debug_assert!(filled_before + qty_q <= qty_total);

        let notional_q = notional_cash(price_q, qty_q);
        let fee_ppm = match liq {
            LiquidityFlag::Maker => self.params.fees.maker_fee_ppm,
            LiquidityFlag::Taker => self.params.fees.taker_fee_ppm,
        };
        let fee_q = fee_cash(notional_q, fee_ppm);

        let rem_before = qty_total - filled_before;
        let rem_after = rem_before - qty_q;
        match side {
            Side::Buy => {
                self.ledger.cash_q -= notional_q + fee_q;
                self.ledger.position_qty_q += qty_q;
                // The lock was sized at the limit price; releasing the
                // difference of remaining-notionals drains it to exactly
                // zero over the order's lifetime despite flooring.
                let release =
                    notional_cash(limit_q, rem_before) - notional_cash(limit_q, rem_after);
                self.ledger.release_cash(release);
            }
            Side::Sell => {
                self.ledger.cash_q += notional_q - fee_q;
                self.ledger.position_qty_q -= qty_q;
                if self.params.risk.spot_no_short {
                    self.ledger.release_position(qty_q);
                }
            }
        }

        let o = self.store.get_mut(h);
        o.filled_qty_q += qty_q;
        o.state = if o.filled_qty_q == o.qty_q { OrderState::Filled } else { OrderState::Partial };

        self.fills.push(FillEvent {
            ts: self.now,
            order_id: id,
            side,
            price_q,
            qty_q,
            liq,
            notional_cash_q: notional_q,
            fee_cash_q: fee_q,
        });
        trace!(order_id = id, price_q, qty_q, ?liq, "fill");
    }

    /// Unlink a resting order from its bucket (and thus all active sets).
    pub(crate) fn remove_resting(&mut self, h: OrderHandle) {
        let (side, price_q) = {
            let o = self.store.get(h);
            (o.side, o.price_q)
        };
        let book = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        match book.find(price_q) {
            Some(bidx) => book.erase(&mut self.store, bidx, h),
            None => debug_assert!(false, "resting order's price missing from bucket index"),
        }
    }
}
