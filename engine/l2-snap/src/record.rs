//! Snapshot record: fixed-point levels, sentinels, wire layout.

/// Format magic, "L2BO" in little-endian.
pub const MAGIC: u32 = 0x4C32_424F;
/// Format version.
pub const VERSION: u16 = 1;
/// Number of visible levels per side.
pub const DEPTH: usize = 20;
/// Endianness marker; appears as `04 03 02 01` in a little-endian file.
pub const ENDIAN_CHECK: u32 = 0x0102_0304;

/// Stored integer -> real value: `real = stored / scale`.
pub const PRICE_SCALE: i64 = 100_000_000;
pub const QTY_SCALE: i64 = 100_000_000;

/// Sentinel price for an inactive bid level. A bid of 0 is an obviously
/// invalid positive price.
pub const BID_NULL_PRICE_Q: i64 = 0;
/// Sentinel price for an inactive ask level; sorts "far away".
pub const ASK_NULL_PRICE_Q: i64 = i64::MAX;
/// Sentinel quantity for an inactive level.
pub const NULL_QTY_Q: i64 = 0;

/// Serialized record size: two timestamps plus 2 x 20 levels of 16 bytes.
pub const RECORD_SIZE: usize = 16 + 2 * DEPTH * 16;

/// One price level: `(price_q, qty_q)` in fixed point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Level {
    pub price_q: i64,
    pub qty_q: i64,
}

impl Level {
    pub const BID_NULL: Level = Level { price_q: BID_NULL_PRICE_Q, qty_q: NULL_QTY_Q };
    pub const ASK_NULL: Level = Level { price_q: ASK_NULL_PRICE_Q, qty_q: NULL_QTY_Q };
}

/// One top-N snapshot.
///
/// `bids[0]` is the best (highest) bid; prices are non-increasing across
/// active levels. `asks[0]` is the best (lowest) ask; prices are
/// non-decreasing. `ts_event_ms` is 0 when the feed did not provide an
/// exchange timestamp; `ts_recv_ns` is always valid and monotone within a
/// capture stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotRecord {
    pub ts_event_ms: i64,
    pub ts_recv_ns: i64,
    pub bids: [Level; DEPTH],
    pub asks: [Level; DEPTH],
}

impl SnapshotRecord {
    /// A record with every level at its null sentinel.
    pub fn empty(ts_recv_ns: i64) -> Self {
        Self {
            ts_event_ms: 0,
            ts_recv_ns,
            bids: [Level::BID_NULL; DEPTH],
            asks: [Level::ASK_NULL; DEPTH],
        }
    }

    pub fn set_bid(&mut self, idx: usize, price_q: i64, qty_q: i64) -> &mut Self {
        self.bids[idx] = Level { price_q, qty_q };
        self
    }

    pub fn set_ask(&mut self, idx: usize, price_q: i64, qty_q: i64) -> &mut Self {
        self.asks[idx] = Level { price_q, qty_q };
        self
    }

    #[inline]
    pub fn best_bid_price_q(&self) -> i64 {
        self.bids[0].price_q
    }

    #[inline]
    pub fn best_ask_price_q(&self) -> i64 {
        self.asks[0].price_q
    }

    /// A bid is active iff it has positive qty and a positive price.
    #[inline]
    pub fn is_bid_active(l: &Level) -> bool {
        l.qty_q > 0 && l.price_q > 0
    }

    /// An ask is active iff it has positive qty and is not the null sentinel.
    #[inline]
    pub fn is_ask_active(l: &Level) -> bool {
        l.qty_q > 0 && l.price_q != ASK_NULL_PRICE_Q
    }

    #[inline]
    pub fn has_top_of_book(&self) -> bool {
        Self::is_bid_active(&self.bids[0]) && Self::is_ask_active(&self.asks[0])
    }

    /// Serialize into the fixed little-endian wire layout.
    pub fn encode(&self, out: &mut [u8; RECORD_SIZE]) {
        let mut off = 0usize;
        put_i64(out, &mut off, self.ts_event_ms);
        put_i64(out, &mut off, self.ts_recv_ns);
        for l in &self.bids {
            put_i64(out, &mut off, l.price_q);
            put_i64(out, &mut off, l.qty_q);
        }
        for l in &self.asks {
            put_i64(out, &mut off, l.price_q);
            put_i64(out, &mut off, l.qty_q);
        }
        debug_assert_eq!(off, RECORD_SIZE);
    }

    /// Deserialize from the fixed little-endian wire layout.
    pub fn decode(buf: &[u8; RECORD_SIZE]) -> Self {
        let mut off = 0usize;
        let ts_event_ms = get_i64(buf, &mut off);
        let ts_recv_ns = get_i64(buf, &mut off);
        let mut bids = [Level::BID_NULL; DEPTH];
        for l in &mut bids {
            l.price_q = get_i64(buf, &mut off);
            l.qty_q = get_i64(buf, &mut off);
        }
        let mut asks = [Level::ASK_NULL; DEPTH];
        for l in &mut asks {
            l.price_q = get_i64(buf, &mut off);
            l.qty_q = get_i64(buf, &mut off);
        }
        debug_assert_eq!(off, RECORD_SIZE);
        Self { ts_event_ms, ts_recv_ns, bids, asks }
    }
}

#[inline]
fn put_i64(buf: &mut [u8], off: &mut usize, v: i64) {
    buf[*off..*off + 8].copy_from_slice(&v.to_le_bytes());
    *off += 8;
}

#[inline]
fn get_i64(buf: &[u8], off: &mut usize) -> i64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&buf[*off..*off + 8]);
    *off += 8;
    i64::from_le_bytes(b)
}
