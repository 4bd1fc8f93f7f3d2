//! Per-side price buckets: a sorted index of active prices with a FIFO of
//! resting orders at each price.
//!
//! The FIFO is intrusive, threaded through the orders' `prev`/`next`
//! handles, so push-back and erase-by-handle are O(1). Insert/erase of a
//! price in the sorted index is linear in the number of active prices,
//! which stays small because it only holds the agent's own prices.
//!
//! During a step, physical erasure of emptied buckets is deferred so that
//! bucket indices stay stable across the matching passes; a compaction
//! pass reclaims them at the end of the step.

use crate::store::OrderStore;
use crate::types::{OrderHandle, PriceQ, QtyQ, Side, Visibility, H_NONE};

/// Per-price state: the resting FIFO plus the level observation used for
/// depletion inference. Bucket visibility agrees with the per-order
/// visibility of all members at the end of every step.
#[derive(Clone, Copy, Debug)]
pub struct Bucket {
    pub head: OrderHandle,
    pub tail: OrderHandle,
    pub size: u32,
    pub last_level_qty_q: QtyQ,
    pub last_level_idx: Option<u8>,
    pub visibility: Visibility,
}

impl Default for Bucket {
    fn default() -> Self {
        Self {
            head: H_NONE,
            tail: H_NONE,
            size: 0,
            last_level_qty_q: 0,
            last_level_idx: None,
            visibility: Visibility::Blind,
        }
    }
}

/// One side's bucket collection: prices ascending, buckets parallel.
pub struct BookSide {
    side: Side,
    prices: Vec<PriceQ>,
    buckets: Vec<Bucket>,
    defer_compact: bool,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self { side, prices: Vec::new(), buckets: Vec::new(), defer_compact: false }
    }

    pub fn clear(&mut self) {
        self.prices.clear();
        self.buckets.clear();
        self.defer_compact = false;
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    #[inline]
    pub fn price(&self, idx: usize) -> PriceQ {
        self.prices[idx]
    }

    #[inline]
    pub fn bucket(&self, idx: usize) -> &Bucket {
        &self.buckets[idx]
    }

    #[inline]
    pub fn bucket_mut(&mut self, idx: usize) -> &mut Bucket {
        &mut self.buckets[idx]
    }

    /// Logarithmic lookup of an active price.
    #[inline]
    pub fn find(&self, price_q: PriceQ) -> Option<usize> {
        self.prices.binary_search(&price_q).ok()
    }

    pub fn get_or_insert(&mut self, price_q: PriceQ) -> usize {
        match self.prices.binary_search(&price_q) {
            Ok(idx) => idx,
            Err(idx) => {
                self.prices.insert(idx, price_q);
                self.buckets.insert(idx, Bucket::default());
                idx
            }
        }
    }

    /// Best active price over non-empty buckets: highest for bids,
    /// lowest for asks. Skips buckets emptied under deferred compaction.
    pub fn best_price(&self) -> Option<PriceQ> {
        match self.side {
            Side::Buy => {
                for i in (0..self.buckets.len()).rev() {
                    if self.buckets[i].size > 0 {
                        return Some(self.prices[i]);
                    }
                }
                None
            }
            Side::Sell => {
                for i in 0..self.buckets.len() {
                    if self.buckets[i].size > 0 {
                        return Some(self.prices[i]);
                    }
                }
                None
            }
        }
    }

    /// Append to the tail of the bucket's FIFO. O(1).
    pub fn push_back(&mut self, store: &mut OrderStore, bidx: usize, h: OrderHandle) {
        let b = &mut self.buckets[bidx];
        let tail = b.tail;
        if tail == H_NONE {
            b.head = h;
            b.tail = h;
            let o = store.get_mut(h);
            o.prev = H_NONE;
            o.next = H_NONE;
        } else {
            store.get_mut(tail).next = h;
            let o = store.get_mut(h);
            o.prev = tail;
            o.next = H_NONE;
            b.tail = h;
        }
        b.size += 1;
    }

    /// Unlink an order from the bucket's FIFO. O(1). Physical erasure of
    /// a bucket that becomes empty is skipped while compaction is
    /// deferred.
    pub fn erase(&mut self, store: &mut OrderStore, bidx: usize, h: OrderHandle) {
        let (prev, next) = {
            let o = store.get(h);
            (o.prev, o.next)
        };

        let b = &mut self.buckets[bidx];
        if prev != H_NONE {
            store.get_mut(prev).next = next;
        } else {
            b.head = next;
        }
        if next != H_NONE {
            store.get_mut(next).prev = prev;
        } else {
            b.tail = prev;
        }
        debug_assert!(b.size > 0);
        b.size -= 1;

        let o = store.get_mut(h);
        o.prev = H_NONE;
        o.next = H_NONE;

        if self.buckets[bidx].size == 0 && !self.defer_compact {
            self.prices.remove(bidx);
            self.buckets.remove(bidx);
        }
    }

    /// While set, emptied buckets stay in place so indices and references
    /// remain stable across the step's matching passes.
    #[inline]
    pub fn set_defer_compact(&mut self, defer: bool) {
        self.defer_compact = defer;
    }

    /// Drop every empty bucket. Runs after the step's passes.
    pub fn compact(&mut self) {
        if self.buckets.iter().all(|b| b.size > 0) {
            return;
        }
        let mut keep_prices = Vec::with_capacity(self.prices.len());
        let mut keep_buckets = Vec::with_capacity(self.buckets.len());
        for i in 0..self.buckets.len() {
            if self.buckets[i].size > 0 {
                keep_prices.push(self.prices[i]);
                keep_buckets.push(self.buckets[i]);
            }
        }
        self.prices = keep_prices;
        self.buckets = keep_buckets;
    }
}
