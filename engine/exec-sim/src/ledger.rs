//! Portfolio ledger: cash, position, and locked reserves in fixed point.

use serde::{Deserialize, Serialize};

use crate::types::{CashQ, QtyQ};

/// All values are fixed-point `i64` in the same quantisation as the
/// snapshot stream. Locked balances are reserved for pending/resting
/// orders; they remain counted in the totals and are subtracted when
/// computing what is available for new reservations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    /// Quote currency balance.
    pub cash_q: CashQ,
    /// Base currency position.
    pub position_qty_q: QtyQ,
    /// Cash reserved for open buy orders.
    pub locked_cash_q: CashQ,
    /// Base quantity reserved for open sell orders.
    pub locked_position_qty_q: QtyQ,
}

impl Ledger {
    pub fn new(cash_q: CashQ, position_qty_q: QtyQ) -> Self {
        Self { cash_q, position_qty_q, locked_cash_q: 0, locked_position_qty_q: 0 }
    }

    #[inline]
    pub fn available_cash_q(&self) -> CashQ {
        self.cash_q - self.locked_cash_q
    }

    #[inline]
    pub fn available_position_qty_q(&self) -> QtyQ {
        self.position_qty_q - self.locked_position_qty_q
    }

    #[inline]
    pub fn lock_cash(&mut self, amount: CashQ) {
        debug_assert!(amount >= 0);
        self.locked_cash_q += amount;
    }

    #[inline]
    pub fn lock_position(&mut self, qty: QtyQ) {
        debug_assert!(qty >= 0);
        self.locked_position_qty_q += qty;
    }

    /// Release a cash reservation. Clamped at zero: lock and release use
    /// the same arithmetic, so a clamp firing means an accounting bug,
    /// but the ledger must never go negative on the locked side.
    #[inline]
    pub fn release_cash(&mut self, amount: CashQ) {
        debug_assert!(amount >= 0);
        self.locked_cash_q -= amount;
        if self.locked_cash_q < 0 {
            self.locked_cash_q = 0;
        }
    }

    #[inline]
    pub fn release_position(&mut self, qty: QtyQ) {
        debug_assert!(qty >= 0);
        self.locked_position_qty_q -= qty;
        if self.locked_position_qty_q < 0 {
            self.locked_position_qty_q = 0;
        }
    }
}
