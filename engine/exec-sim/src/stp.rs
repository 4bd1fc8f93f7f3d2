//! Self-trade prevention, enforced at the moment a pending order reaches
//! its activation time. Pending orders are never on either side of the
//! check. Detection compares the incoming against the best prices of the
//! agent's own resting orders, re-derived from the bucket index so the
//! summary cannot drift from the books.

use tracing::debug;

use crate::config::StpPolicy;
use crate::events::EventType;
use crate::sim::Simulator;
use crate::types::{OrderHandle, OrderId, OrderState, OrderType, PriceQ, RejectReason, Side, H_NONE};

impl Simulator {
    /// Returns true if activation may proceed.
    pub(crate) fn apply_stp_on_activate(&mut self, h: OrderHandle) -> bool {
        if self.params().stp == StpPolicy::None {
            return true;
        }

        let (id, typ, side, price_q) = {
            let o = self.store.get(h);
            (o.id, o.typ, o.side, o.price_q)
        };
        let best_opposite = match side {
            Side::Buy => self.asks.best_price(),
            Side::Sell => self.bids.best_price(),
        };
        let self_cross = match best_opposite {
            None => false,
            // A market order always self-crosses when anything rests
            // opposite; a limit crosses on an inclusive price test.
            Some(best) => match typ {
                OrderType::Market => true,
                OrderType::Limit => match side {
                    Side::Buy => price_q >= best,
                    Side::Sell => price_q <= best,
                },
            },
        };
        if !self_cross {
            return true;
        }

        match self.params().stp {
            StpPolicy::RejectIncoming => {
                let mut reason = RejectReason::SelfTradePrevention;
                if !self.push_event(
                    self.now(),
                    id,
                    EventType::Reject,
                    OrderState::Rejected,
                    Some(reason),
                ) {
                    // Could not even log the rejection.
                    reason = RejectReason::InsufficientResources;
                }
                self.unlock_remaining(h);
                let o = self.store.get_mut(h);
                o.state = OrderState::Rejected;
                o.reject_reason = Some(reason);
                debug!(order_id = id, "incoming rejected by self-trade prevention");
                false
            }
            StpPolicy::CancelResting => self.stp_cancel_resting(h, id, side, typ, price_q),
            StpPolicy::None => unreachable!("checked above"),
        }
    }

    fn stp_cancel_resting(
        &mut self,
        h: OrderHandle,
        id: OrderId,
        side: Side,
        typ: OrderType,
        price_q: PriceQ,
    ) -> bool {
        let market = typ == OrderType::Market;

        // The whole cancel burst must fit in the event log, or nothing
        // happens and the incoming is rejected instead.
        let victims = self.collect_crossing(side, price_q, market);
        if self.events.len() + victims.len() > self.params().max_events {
            let reason = RejectReason::InsufficientResources;
            let _ = self.push_event(
                self.now(),
                id,
                EventType::Reject,
                OrderState::Rejected,
                Some(reason),
            );
            self.unlock_remaining(h);
            let o = self.store.get_mut(h);
            o.state = OrderState::Rejected;
            o.reject_reason = Some(reason);
            debug!(
                order_id = id,
                cancels = victims.len(),
                "cancel-resting burst exceeds event capacity; incoming rejected"
            );
            return false;
        }

        for victim in victims {
            let victim_id = self.store.get(victim).id;
            self.remove_resting(victim);
            self.unlock_remaining(victim);
            self.store.get_mut(victim).state = OrderState::Cancelled;
            let logged = self.push_event(
                self.now(),
                victim_id,
                EventType::Cancel,
                OrderState::Cancelled,
                None,
            );
            debug_assert!(logged, "burst headroom was pre-checked");
            debug!(order_id = victim_id, "resting order cancelled by self-trade prevention");
        }
        true
    }

    /// Every resting opposite-side order the incoming would cross, in
    /// deterministic order: opposing buckets best-outward, FIFO within.
    fn collect_crossing(&self, side: Side, price_q: PriceQ, market: bool) -> Vec<OrderHandle> {
        let mut out = Vec::new();
        match side {
            Side::Buy => {
                // Crossing asks: lowest first, while ask price <= incoming.
                for pi in 0..self.asks.len() {
                    if !market && self.asks.price(pi) > price_q {
                        break;
                    }
                    let mut cur = self.asks.bucket(pi).head;
                    while cur != H_NONE {
                        out.push(cur);
                        cur = self.store.get(cur).next;
                    }
                }
            }
            Side::Sell => {
                // Crossing bids: highest first, while bid price >= incoming.
                for pi in (0..self.bids.len()).rev() {
                    if !market && self.bids.price(pi) < price_q {
                        break;
                    }
                    let mut cur = self.bids.bucket(pi).head;
                    while cur != H_NONE {
                        out.push(cur);
                        cur = self.store.get(cur).next;
                    }
                }
            }
        }
        out
    }
}
