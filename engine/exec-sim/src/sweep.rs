//! Aggressive sweep: marketable resting orders take visible opposing
//! depth.

use l2_snap::{SnapshotRecord, DEPTH};

use crate::lookup::{is_valid_ask_price, is_valid_bid_price};
use crate::sim::Simulator;
use crate::types::{LiquidityFlag, OrderState, OrderType, PriceQ, QtyQ, Side, H_NONE};

impl Simulator {
    /// Sweep every marketable resting order against this snapshot's
    /// opposing depth, best-outward, one Taker fill event per consumed
    /// level.
    ///
    /// A step-scoped mutable copy of the visible quantities makes
    /// competing agent orders consume liquidity sequentially and
    /// deterministically within the step.
    pub(crate) fn apply_aggressive_fills(&mut self, rec: &SnapshotRecord) {
        let best_bid = rec.bids[0].price_q;
        let best_ask = rec.asks[0].price_q;

        let mut bid_rem = [0 as QtyQ; DEPTH];
        let mut ask_rem = [0 as QtyQ; DEPTH];
        for i in 0..DEPTH {
            bid_rem[i] = if is_valid_bid_price(rec.bids[i].price_q) { rec.bids[i].qty_q } else { 0 };
            ask_rem[i] = if is_valid_ask_price(rec.asks[i].price_q) { rec.asks[i].qty_q } else { 0 };
        }

        // Buy takers: bid buckets from best (highest price) outward while
        // the limit clears the best ask.
        if is_valid_ask_price(best_ask) {
            let mut pi = self.bids.len();
            while pi > 0 {
                pi -= 1;
                let limit_q = self.bids.price(pi);
                if limit_q < best_ask {
                    break;
                }
                self.sweep_bucket(Side::Buy, pi, limit_q, rec, &mut ask_rem);
            }
        }

        // Sell takers mirror against bids.
        if is_valid_bid_price(best_bid) {
            let mut pi = 0;
            while pi < self.asks.len() {
                let limit_q = self.asks.price(pi);
                if limit_q > best_bid {
                    break;
                }
                self.sweep_bucket(Side::Sell, pi, limit_q, rec, &mut bid_rem);
                pi += 1;
            }
        }
    }

    fn sweep_bucket(
        &mut self,
        side: Side,
        bidx: usize,
        limit_q: PriceQ,
        rec: &SnapshotRecord,
        opp_rem: &mut [QtyQ; DEPTH],
    ) {
        let mut cur = match side {
            Side::Buy => self.bids.bucket(bidx).head,
            Side::Sell => self.asks.bucket(bidx).head,
        };

        while cur != H_NONE {
            let next = self.store.get(cur).next;
            let (state, typ, mut remaining) = {
                let o = self.store.get(cur);
                (o.state, o.typ, o.remaining_qty_q())
            };
            if !state.is_resting() || typ != OrderType::Limit || remaining <= 0 {
                cur = next;
                continue;
            }

            for lvl in 0..DEPTH {
                if remaining == 0 {
                    break;
                }
                let px = match side {
                    Side::Buy => rec.asks[lvl].price_q,
                    Side::Sell => rec.bids[lvl].price_q,
                };
                let valid = match side {
                    Side::Buy => is_valid_ask_price(px),
                    Side::Sell => is_valid_bid_price(px),
                };
                if !valid {
                    break; // visible depth exhausted
                }
                let within_limit = match side {
                    Side::Buy => px <= limit_q,
                    Side::Sell => px >= limit_q,
                };
                if !within_limit {
                    break; // next level violates the limit
                }
                if opp_rem[lvl] <= 0 {
                    continue; // consumed earlier this step
                }
                if !self.can_log_fill() {
                    return;
                }

                let dq = remaining.min(opp_rem[lvl]);
                self.apply_fill(cur, px, dq, LiquidityFlag::Taker);
                remaining -= dq;
                opp_rem[lvl] -= dq;

                if self.store.get(cur).state == OrderState::Filled {
                    self.remove_resting(cur);
                    break;
                }
            }

            cur = next;
        }
    }
}
