//! Deterministic synthetic snapshot generation for benchmarks.

use l2_snap::{SnapshotRecord, DEPTH, PRICE_SCALE};

/// Simple LCG step; fixed seed -> deterministic streams.
#[inline]
fn lcg(s: &mut u64) -> u64 {
    *s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
    *s
}

/// Build `n` records around a drifting mid price, one tick apart, with
/// full 20-level ladders and noisy displayed quantities.
pub fn synthetic_records(n: usize, seed: u64) -> Vec<SnapshotRecord> {
    let mut s = seed;
    let tick = PRICE_SCALE / 100; // 0.01 in fixed point
    let mut mid = 100 * PRICE_SCALE;

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        // Drift by -1, 0, or +1 ticks.
        let d = (lcg(&mut s) % 3) as i64 - 1;
        mid += d * tick;

        let mut rec = SnapshotRecord::empty(i as i64 + 1);
        for lvl in 0..DEPTH {
            let off = (lvl as i64 + 1) * tick;
            let bid_qty = ((lcg(&mut s) % 50) + 1) as i64 * PRICE_SCALE;
            let ask_qty = ((lcg(&mut s) % 50) + 1) as i64 * PRICE_SCALE;
            rec.set_bid(lvl, mid - off, bid_qty);
            rec.set_ask(lvl, mid + off, ask_qty);
        }
        out.push(rec);
    }
    out
}
