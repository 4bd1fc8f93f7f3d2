//! Top-N L2 order-book snapshot model and its persisted binary format.
//!
//! A snapshot is a fixed-size record carrying the best 20 price levels of
//! each side of the book at a receive timestamp. All prices and quantities
//! are fixed-point `i64` at scale 10^8; there is no floating point anywhere
//! in this crate. Missing levels use sentinel values so that records are
//! self-describing without a side length.
//!
//! The on-disk `.snap` layout is `[FileHeader][Record][Record]...` with
//! fixed-size little-endian records, suitable for O(1) random access.
//! Producers write a provisional header with `record_count = 0` and
//! finalise it on close; readers accept `record_count == 0` as "unknown"
//! and infer the count from the payload size.

mod error;
mod file;
mod record;

pub use error::SnapFileError;
pub use file::{FileHeader, SnapReader, SnapWriter, FILE_HEADER_SIZE};
pub use record::{
    Level, SnapshotRecord, ASK_NULL_PRICE_Q, BID_NULL_PRICE_Q, DEPTH, ENDIAN_CHECK, MAGIC,
    NULL_QTY_Q, PRICE_SCALE, QTY_SCALE, RECORD_SIZE, VERSION,
};
