//! Fixed-point arithmetic with 128-bit intermediates.
//!
//! Every ledger-visible amount in the engine is derived from these
//! routines; floor division is the only rounding mode on the hot path.

use l2_snap::PRICE_SCALE;

use crate::types::CashQ;

/// `floor((a * b) / div)` with a 128-bit intermediate product.
///
/// Callers guarantee non-negative operands and a positive divisor; with
/// those preconditions the i128 quotient truncates toward zero, which is
/// the floor.
#[inline]
pub fn mul_div_floor(a: i64, b: i64, div: i64) -> i64 {
    debug_assert!(a >= 0);
    debug_assert!(b >= 0);
    debug_assert!(div > 0);
    ((a as i128 * b as i128) / div as i128) as i64
}

/// `mul_div_floor` that reports quotients outside the `i64` range instead
/// of wrapping. Used for lock sizing, where oversized requests must map
/// to a deterministic rejection.
#[inline]
pub fn checked_mul_div_floor(a: i64, b: i64, div: i64) -> Option<i64> {
    if a < 0 || b < 0 || div <= 0 {
        return None;
    }
    let q = (a as i128 * b as i128) / div as i128;
    if q > i64::MAX as i128 {
        return None;
    }
    Some(q as i64)
}

/// Notional in cash units: `floor(price_q * qty_q / PRICE_SCALE)`.
#[inline]
pub fn notional_cash(price_q: i64, qty_q: i64) -> CashQ {
    mul_div_floor(price_q, qty_q, PRICE_SCALE)
}

/// Checked variant of [`notional_cash`] for lock sizing.
#[inline]
pub fn checked_notional_cash(price_q: i64, qty_q: i64) -> Option<CashQ> {
    checked_mul_div_floor(price_q, qty_q, PRICE_SCALE)
}

/// Fee in cash units: `floor(notional_q * fee_ppm / 1_000_000)`.
#[inline]
pub fn fee_cash(notional_q: CashQ, fee_ppm: u64) -> CashQ {
    mul_div_floor(notional_q, fee_ppm as i64, 1_000_000)
}
