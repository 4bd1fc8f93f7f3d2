//! Error types for the snapshot file format.

use thiserror::Error;

/// Errors raised while reading or writing `.snap` files.
#[derive(Error, Debug)]
pub enum SnapFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad magic: expected {expected:#010x}, got {got:#010x}")]
    BadMagic { expected: u32, got: u32 },

    #[error("unsupported format version: expected {expected}, got {got}")]
    UnsupportedVersion { expected: u16, got: u16 },

    #[error("depth mismatch: expected {expected}, got {got}")]
    DepthMismatch { expected: u16, got: u16 },

    #[error("record size mismatch: expected {expected}, got {got}")]
    RecordSizeMismatch { expected: u32, got: u32 },

    #[error("endianness marker mismatch: got {got:#010x}; file written on an incompatible platform")]
    EndianMismatch { got: u32 },

    #[error("scale mismatch: price_scale={price_scale}, qty_scale={qty_scale}")]
    ScaleMismatch { price_scale: i64, qty_scale: i64 },

    #[error("truncated file: {detail}")]
    Truncated { detail: String },
}
