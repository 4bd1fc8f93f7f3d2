//! Queue/visibility state machine and the passive fill allocator.
//!
//! Depletion is inferred bucket-level and applied to members in strict
//! FIFO: a single effective-depletion value is shared across the bucket,
//! first advancing queue positions, then filling whoever reaches the
//! front. This is the only place that consumes effective depletion, so
//! no two orders can both receive the full amount.

use l2_snap::SnapshotRecord;

use crate::lookup;
use crate::sim::Simulator;
use crate::types::{LiquidityFlag, OrderHandle, OrderState, OrderType, PriceQ, QtyQ, Side, Visibility, H_NONE};

impl Simulator {
    /// Initialise visibility/queue state at the moment an order becomes
    /// active, from the activation step's snapshot.
    pub(crate) fn init_queue_on_activate(&mut self, rec: &SnapshotRecord, h: OrderHandle) {
        let (typ, side, price_q) = {
            let o = self.store.get(h);
            (o.typ, o.side, o.price_q)
        };
        if typ != OrderType::Limit || price_q <= 0 {
            let o = self.store.get_mut(h);
            o.visibility = Visibility::Blind;
            o.last_level_idx = None;
            o.last_level_qty_q = 0;
            o.qty_ahead_q = 0;
            return;
        }

        let m = lookup::level_for(rec, side, price_q);
        let o = self.store.get_mut(h);
        if !m.within_range {
            o.visibility = Visibility::Blind;
            o.last_level_idx = None;
            o.last_level_qty_q = 0;
            o.qty_ahead_q = 0;
            return;
        }

        o.visibility = Visibility::Visible;
        if m.found {
            o.last_level_idx = m.idx;
            o.last_level_qty_q = m.qty_q;
            // Join the tail of the displayed queue.
            o.qty_ahead_q = m.qty_q;
        } else {
            o.last_level_idx = None;
            o.last_level_qty_q = 0;
            // Within range but not displayed: you are the queue.
            o.qty_ahead_q = 0;
        }
    }

    /// One bucket's per-step transition: trade-through signal, visibility
    /// state machine, then passive allocation of effective depletion.
    pub(crate) fn update_bucket_passive(&mut self, side: Side, bidx: usize, rec: &SnapshotRecord) {
        let (bucket_price, bucket) = match side {
            Side::Buy => (self.bids.price(bidx), *self.bids.bucket(bidx)),
            Side::Sell => (self.asks.price(bidx), *self.asks.bucket(bidx)),
        };
        // Emptied earlier in this step; compaction is deferred.
        if bucket.size == 0 {
            return;
        }

        let best_bid = rec.bids[0].price_q;
        let best_ask = rec.asks[0].price_q;
        let crossed = match side {
            Side::Buy => lookup::is_valid_ask_price(best_ask) && best_ask <= bucket_price,
            Side::Sell => lookup::is_valid_bid_price(best_bid) && best_bid >= bucket_price,
        };
        // Trade-through only invalidates queue position. The fill, if
        // any, comes out of the aggressive pass at the opposing price.
        if crossed {
            self.zero_qty_ahead(side, bidx);
        }

        let m = lookup::level_for(rec, side, bucket_price);

        if m.found {
            let reanchor = matches!(bucket.visibility, Visibility::Frozen | Visibility::Blind)
                || bucket.last_level_idx.is_none();
            if reanchor {
                // Back in the visible book without a tracked slot:
                // re-anchor every member pessimistically behind the
                // displayed quantity. Not depletion, so no fill here.
                self.set_bucket_observation(side, bidx, Visibility::Visible, m.idx, m.qty_q);
                self.reanchor_members(side, bidx, m.idx, m.qty_q);
                return;
            }

            let depl = (bucket.last_level_qty_q - m.qty_q).max(0);
            let eff = lookup::effective_depletion(depl, self.params().alpha_ppm);
            self.set_bucket_observation(side, bidx, Visibility::Visible, m.idx, m.qty_q);
            // A crossed bucket never fills passively: queue position is
            // already zeroed and the aggressive pass fills at the
            // opposing price.
            if !crossed && eff > 0 {
                self.allocate_passive(side, bidx, bucket_price, eff);
            }
            return;
        }

        if m.within_range {
            if bucket.visibility == Visibility::Blind {
                // Surfaced into the visible range with nothing displayed.
                self.set_bucket_observation(side, bidx, Visibility::Visible, None, 0);
                self.mirror_members_visible_empty(side, bidx);
            } else if bucket.visibility == Visibility::Visible && bucket.last_level_idx.is_some() {
                self.freeze_bucket(side, bidx);
            }
        } else if bucket.visibility == Visibility::Visible {
            self.freeze_bucket(side, bidx);
        }
    }

    // --- Member walks ---

    #[inline]
    fn bucket_head(&self, side: Side, bidx: usize) -> OrderHandle {
        match side {
            Side::Buy => self.bids.bucket(bidx).head,
            Side::Sell => self.asks.bucket(bidx).head,
        }
    }

    fn set_bucket_observation(
        &mut self,
        side: Side,
        bidx: usize,
        vis: Visibility,
        idx: Option<u8>,
        qty_q: QtyQ,
    ) {
        let b = match side {
            Side::Buy => self.bids.bucket_mut(bidx),
            Side::Sell => self.asks.bucket_mut(bidx),
        };
        b.visibility = vis;
        b.last_level_idx = idx;
        b.last_level_qty_q = qty_q;
    }

    fn zero_qty_ahead(&mut self, side: Side, bidx: usize) {
        let mut cur = self.bucket_head(side, bidx);
        while cur != H_NONE {
            let o = self.store.get_mut(cur);
            let next = o.next;
            if o.state.is_resting() && o.typ == OrderType::Limit {
                o.qty_ahead_q = 0;
            }
            cur = next;
        }
    }

    fn reanchor_members(&mut self, side: Side, bidx: usize, idx: Option<u8>, qty_q: QtyQ) {
        let mut cur = self.bucket_head(side, bidx);
        while cur != H_NONE {
            let o = self.store.get_mut(cur);
            let next = o.next;
            if o.state.is_resting() && o.typ == OrderType::Limit {
                o.visibility = Visibility::Visible;
                o.last_level_idx = idx;
                o.last_level_qty_q = qty_q;
                o.qty_ahead_q = qty_q;
            }
            cur = next;
        }
    }

    fn mirror_members_visible_empty(&mut self, side: Side, bidx: usize) {
        let mut cur = self.bucket_head(side, bidx);
        while cur != H_NONE {
            let o = self.store.get_mut(cur);
            let next = o.next;
            if o.state.is_resting() && o.typ == OrderType::Limit {
                o.visibility = Visibility::Visible;
                o.last_level_idx = None;
                o.last_level_qty_q = 0;
                o.qty_ahead_q = 0;
            }
            cur = next;
        }
    }

    fn freeze_bucket(&mut self, side: Side, bidx: usize) {
        self.set_bucket_observation(side, bidx, Visibility::Frozen, None, 0);
        let mut cur = self.bucket_head(side, bidx);
        while cur != H_NONE {
            let o = self.store.get_mut(cur);
            let next = o.next;
            if o.state.is_resting() && o.typ == OrderType::Limit {
                o.visibility = Visibility::Frozen;
                o.last_level_idx = None;
                o.last_level_qty_q = 0;
                // qty_ahead stays frozen with the tracking.
            }
            cur = next;
        }
    }

    /// FIFO allocation of one effective-depletion amount across the
    /// bucket: advance queue positions first, then fill at the front.
    fn allocate_passive(&mut self, side: Side, bidx: usize, price_q: PriceQ, mut eff: QtyQ) {
        let (b_idx, b_qty) = match side {
            Side::Buy => {
                let b = self.bids.bucket(bidx);
                (b.last_level_idx, b.last_level_qty_q)
            }
            Side::Sell => {
                let b = self.asks.bucket(bidx);
                (b.last_level_idx, b.last_level_qty_q)
            }
        };

        let mut cur = self.bucket_head(side, bidx);
        while cur != H_NONE && eff > 0 {
            let next = self.store.get(cur).next;

            {
                let o = self.store.get_mut(cur);
                if !o.state.is_resting() || o.typ != OrderType::Limit {
                    cur = next;
                    continue;
                }
                // Keep the member's observation in line with the bucket.
                o.visibility = Visibility::Visible;
                o.last_level_idx = b_idx;
                o.last_level_qty_q = b_qty;

                // (1) consume depletion to move forward in the queue
                if o.qty_ahead_q > 0 {
                    let consume = o.qty_ahead_q.min(eff);
                    o.qty_ahead_q -= consume;
                    eff -= consume;
                    if eff == 0 {
                        break;
                    }
                }
            }

            // (2) at the front of the queue: fill from the residual
            if self.store.get(cur).qty_ahead_q == 0 {
                let remaining = self.store.get(cur).remaining_qty_q();
                if remaining > 0 {
                    if !self.can_log_fill() {
                        break;
                    }
                    let fill = remaining.min(eff);
                    self.apply_fill(cur, price_q, fill, LiquidityFlag::Maker);
                    eff -= fill;
                    if self.store.get(cur).state == OrderState::Filled {
                        self.remove_resting(cur);
                    }
                }
            }

            cur = next;
        }
    }
}
