//! `.snap` file header, reader, and writer.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::SnapFileError;
use crate::record::{
    SnapshotRecord, DEPTH, ENDIAN_CHECK, MAGIC, PRICE_SCALE, QTY_SCALE, RECORD_SIZE, VERSION,
};

/// Serialized header size.
pub const FILE_HEADER_SIZE: usize = 40;

/// Self-describing file header, written once at the start of the file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileHeader {
    pub magic: u32,
    pub version: u16,
    pub depth: u16,
    pub record_size: u32,
    pub endian_check: u32,
    pub price_scale: i64,
    pub qty_scale: i64,
    /// 0 if unknown at write time; readers then infer from payload size.
    pub record_count: u64,
}

impl FileHeader {
    pub fn new(record_count: u64) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            depth: DEPTH as u16,
            record_size: RECORD_SIZE as u32,
            endian_check: ENDIAN_CHECK,
            price_scale: PRICE_SCALE,
            qty_scale: QTY_SCALE,
            record_count,
        }
    }

    pub fn encode(&self, out: &mut [u8; FILE_HEADER_SIZE]) {
        out[0..4].copy_from_slice(&self.magic.to_le_bytes());
        out[4..6].copy_from_slice(&self.version.to_le_bytes());
        out[6..8].copy_from_slice(&self.depth.to_le_bytes());
        out[8..12].copy_from_slice(&self.record_size.to_le_bytes());
        out[12..16].copy_from_slice(&self.endian_check.to_le_bytes());
        out[16..24].copy_from_slice(&self.price_scale.to_le_bytes());
        out[24..32].copy_from_slice(&self.qty_scale.to_le_bytes());
        out[32..40].copy_from_slice(&self.record_count.to_le_bytes());
    }

    pub fn decode(buf: &[u8; FILE_HEADER_SIZE]) -> Self {
        Self {
            magic: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            version: u16::from_le_bytes(buf[4..6].try_into().unwrap()),
            depth: u16::from_le_bytes(buf[6..8].try_into().unwrap()),
            record_size: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            endian_check: u32::from_le_bytes(buf[12..16].try_into().unwrap()),
            price_scale: i64::from_le_bytes(buf[16..24].try_into().unwrap()),
            qty_scale: i64::from_le_bytes(buf[24..32].try_into().unwrap()),
            record_count: u64::from_le_bytes(buf[32..40].try_into().unwrap()),
        }
    }

    /// Validate every fixed field against this build's format constants.
    pub fn validate(&self) -> Result<(), SnapFileError> {
        if self.magic != MAGIC {
            return Err(SnapFileError::BadMagic { expected: MAGIC, got: self.magic });
        }
        if self.version != VERSION {
            return Err(SnapFileError::UnsupportedVersion { expected: VERSION, got: self.version });
        }
        if self.depth != DEPTH as u16 {
            return Err(SnapFileError::DepthMismatch { expected: DEPTH as u16, got: self.depth });
        }
        if self.record_size != RECORD_SIZE as u32 {
            return Err(SnapFileError::RecordSizeMismatch {
                expected: RECORD_SIZE as u32,
                got: self.record_size,
            });
        }
        if self.endian_check != ENDIAN_CHECK {
            return Err(SnapFileError::EndianMismatch { got: self.endian_check });
        }
        if self.price_scale != PRICE_SCALE || self.qty_scale != QTY_SCALE {
            return Err(SnapFileError::ScaleMismatch {
                price_scale: self.price_scale,
                qty_scale: self.qty_scale,
            });
        }
        Ok(())
    }
}

/// Sequential writer. The header is written provisionally with
/// `record_count = 0` and finalised by `finish()`.
pub struct SnapWriter {
    out: BufWriter<File>,
    written: u64,
}

impl SnapWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, SnapFileError> {
        let file = OpenOptions::new().write(true).create(true).truncate(true).open(path)?;
        let mut out = BufWriter::new(file);
        let mut buf = [0u8; FILE_HEADER_SIZE];
        FileHeader::new(0).encode(&mut buf);
        out.write_all(&buf)?;
        Ok(Self { out, written: 0 })
    }

    pub fn write_record(&mut self, rec: &SnapshotRecord) -> Result<(), SnapFileError> {
        let mut buf = [0u8; RECORD_SIZE];
        rec.encode(&mut buf);
        self.out.write_all(&buf)?;
        self.written += 1;
        Ok(())
    }

    #[inline]
    pub fn records_written(&self) -> u64 {
        self.written
    }

    /// Seek back and finalise the record count, then flush.
    pub fn finish(mut self) -> Result<u64, SnapFileError> {
        self.out.flush()?;
        let file = self.out.get_mut();
        file.seek(SeekFrom::Start(0))?;
        let mut buf = [0u8; FILE_HEADER_SIZE];
        FileHeader::new(self.written).encode(&mut buf);
        file.write_all(&buf)?;
        file.sync_all()?;
        Ok(self.written)
    }
}

/// Sequential reader over a validated `.snap` file.
#[derive(Debug)]
pub struct SnapReader {
    input: BufReader<File>,
    header: FileHeader,
    record_count: u64,
    pos: u64,
}

impl SnapReader {
    /// Open and validate: header fields, and that the payload is a whole
    /// number of records consistent with the header's count (when known).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SnapFileError> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut input = BufReader::new(file);

        if file_len < FILE_HEADER_SIZE as u64 {
            return Err(SnapFileError::Truncated {
                detail: format!("file is {file_len} bytes, smaller than the header"),
            });
        }
        let mut buf = [0u8; FILE_HEADER_SIZE];
        input.read_exact(&mut buf)?;
        let header = FileHeader::decode(&buf);
        header.validate()?;

        let payload = file_len - FILE_HEADER_SIZE as u64;
        if payload % RECORD_SIZE as u64 != 0 {
            return Err(SnapFileError::Truncated {
                detail: format!("payload of {payload} bytes is not a whole number of records"),
            });
        }
        let inferred = payload / RECORD_SIZE as u64;
        let record_count = if header.record_count == 0 {
            inferred
        } else if header.record_count != inferred {
            return Err(SnapFileError::Truncated {
                detail: format!(
                    "header claims {} records but payload holds {inferred}",
                    header.record_count
                ),
            });
        } else {
            header.record_count
        };

        Ok(Self { input, header, record_count, pos: 0 })
    }

    #[inline]
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Total number of records in the file (inferred when the header
    /// count was unknown).
    #[inline]
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Replay cursor position in `[0, record_count]`.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Read the next record, or `None` at end of stream.
    pub fn next_record(&mut self) -> Result<Option<SnapshotRecord>, SnapFileError> {
        if self.pos >= self.record_count {
            return Ok(None);
        }
        let mut buf = [0u8; RECORD_SIZE];
        self.input.read_exact(&mut buf)?;
        self.pos += 1;
        Ok(Some(SnapshotRecord::decode(&buf)))
    }
}

impl Iterator for SnapReader {
    type Item = Result<SnapshotRecord, SnapFileError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
