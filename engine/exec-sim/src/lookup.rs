//! Per-side lookup of a price in the visible top-N, and the effective
//! depletion rule.

use l2_snap::{SnapshotRecord, ASK_NULL_PRICE_Q, BID_NULL_PRICE_Q, DEPTH};

use crate::types::{PriceQ, QtyQ, Side};

/// Result of probing a snapshot side for a price.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LevelLookup {
    /// Exact price present in top-N.
    pub found: bool,
    /// Within the visible `[best, worst]` range.
    pub within_range: bool,
    /// Level index if found.
    pub idx: Option<u8>,
    /// Displayed qty at that level if found.
    pub qty_q: QtyQ,
    pub best_q: PriceQ,
    pub worst_q: PriceQ,
}

#[inline]
pub fn is_valid_bid_price(p: PriceQ) -> bool {
    p != BID_NULL_PRICE_Q
}

#[inline]
pub fn is_valid_ask_price(p: PriceQ) -> bool {
    p != ASK_NULL_PRICE_Q
}

/// Monotone scan with early exit; O(DEPTH) worst case.
pub fn bid_level(rec: &SnapshotRecord, price_q: PriceQ) -> LevelLookup {
    let mut out = LevelLookup::default();
    let best = rec.bids[0].price_q;
    if !is_valid_bid_price(best) {
        return out;
    }

    let mut worst = best;
    let mut last_valid: usize = 0;
    for (i, l) in rec.bids.iter().enumerate().take(DEPTH) {
        if !is_valid_bid_price(l.price_q) {
            break;
        }
        worst = l.price_q;
        last_valid = i;
    }
    out.best_q = best;
    out.worst_q = worst;

    // Bids are non-increasing: visible range is [worst, best].
    if price_q > best || price_q < worst {
        return out;
    }
    out.within_range = true;

    for (i, l) in rec.bids.iter().enumerate().take(last_valid + 1) {
        if l.price_q == price_q {
            out.found = true;
            out.idx = Some(i as u8);
            out.qty_q = l.qty_q;
            return out;
        }
        if l.price_q < price_q {
            // Passed the price; within range but not present.
            return out;
        }
    }
    out
}

/// Mirror of [`bid_level`] for the ask side (non-decreasing prices).
pub fn ask_level(rec: &SnapshotRecord, price_q: PriceQ) -> LevelLookup {
    let mut out = LevelLookup::default();
    let best = rec.asks[0].price_q;
    if !is_valid_ask_price(best) {
        return out;
    }

    let mut worst = best;
    let mut last_valid: usize = 0;
    for (i, l) in rec.asks.iter().enumerate().take(DEPTH) {
        if !is_valid_ask_price(l.price_q) {
            break;
        }
        worst = l.price_q;
        last_valid = i;
    }
    out.best_q = best;
    out.worst_q = worst;

    if price_q < best || price_q > worst {
        return out;
    }
    out.within_range = true;

    for (i, l) in rec.asks.iter().enumerate().take(last_valid + 1) {
        if l.price_q == price_q {
            out.found = true;
            out.idx = Some(i as u8);
            out.qty_q = l.qty_q;
            return out;
        }
        if l.price_q > price_q {
            return out;
        }
    }
    out
}

#[inline]
pub fn level_for(rec: &SnapshotRecord, side: Side, price_q: PriceQ) -> LevelLookup {
    match side {
        Side::Buy => bid_level(rec, price_q),
        Side::Sell => ask_level(rec, price_q),
    }
}

/// Depletion attributed to trades, scaled by `alpha_ppm`.
///
/// The min-depletion rule: a positive depletion under a positive alpha
/// never floors to zero, otherwise integer truncation could stall a queue
/// indefinitely. The result is clamped to `depletion_q`, which also
/// serves as the saturating outcome for out-of-range products.
pub fn effective_depletion(depletion_q: QtyQ, alpha_ppm: u64) -> QtyQ {
    if depletion_q <= 0 || alpha_ppm == 0 {
        return 0;
    }
    let eff = (depletion_q as i128 * alpha_ppm as i128) / 1_000_000;
    if eff == 0 {
        return 1;
    }
    if eff > depletion_q as i128 {
        return depletion_q;
    }
    eff as QtyQ
}
