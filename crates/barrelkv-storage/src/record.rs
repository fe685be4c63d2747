//! On-disk log record format and its self-describing, CRC-validated framing.
//!
//! ```text
//! +----------+------+-----------+-------------+-----+-------+
//! | crc (4B) | type | key-size  | value-size  | key | value |
//! | LE u32   | 1B   | varint(≤5)| varint(≤5)  | ... | ...   |
//! +----------+------+-----------+-------------+-----+-------+
//! ```
//!
//! CRC is IEEE CRC-32 over every byte after the CRC field itself. Sizes are
//! signed zig-zag varints and may legally be zero. A record is immutable
//! once written; its identity is the `(file_id, offset)` [`Position`] the
//! segment returned when it was appended.

use barrelkv_types::{Position, RecordType};
use integer_encoding::VarInt;

use crate::StorageError;

/// Upper bound on header size: crc(4) + type(1) + key-size varint(5) + value-size varint(5).
pub const MAX_LOG_RECORD_HEADER_SIZE: usize = 4 + 1 + 5 + 5;

/// A single record in the write-ahead log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub rec_type: RecordType,
}

impl LogRecord {
    /// Builds a live `Normal` record.
    #[must_use]
    pub fn normal(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self {
            key,
            value,
            rec_type: RecordType::Normal,
        }
    }

    /// Builds a tombstone for `key`. The value is unused.
    #[must_use]
    pub fn deleted(key: Vec<u8>) -> Self {
        Self {
            key,
            value: Vec::new(),
            rec_type: RecordType::Deleted,
        }
    }

    /// Builds the marker that certifies every record sharing its sequence committed.
    #[must_use]
    pub fn txn_finished(key: Vec<u8>) -> Self {
        Self {
            key,
            value: Vec::new(),
            rec_type: RecordType::TxnFinished,
        }
    }

    /// Encodes the record to its on-disk byte representation.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let key_size = self.key.len() as i64;
        let value_size = self.value.len() as i64;

        let mut buf = Vec::with_capacity(
            MAX_LOG_RECORD_HEADER_SIZE + self.key.len() + self.value.len(),
        );
        buf.extend_from_slice(&[0u8; 4]); // crc placeholder, patched below
        buf.push(self.rec_type.as_u8());

        let mut varint_buf = [0u8; 10];
        let n = key_size.encode_var(&mut varint_buf);
        buf.extend_from_slice(&varint_buf[..n]);
        let n = value_size.encode_var(&mut varint_buf);
        buf.extend_from_slice(&varint_buf[..n]);

        buf.extend_from_slice(&self.key);
        buf.extend_from_slice(&self.value);

        let crc = barrelkv_crypto::crc32(&buf[4..]);
        buf[0..4].copy_from_slice(&crc.to_le_bytes());
        buf
    }

    /// Size in bytes of the encoded record, without actually encoding it.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let key_size = self.key.len() as i64;
        let value_size = self.value.len() as i64;
        4 + 1 + key_size.required_space() + value_size.required_space()
            + self.key.len()
            + self.value.len()
    }
}

/// Decoded header of a log record, before its key and value have been read.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LogRecordHeader {
    pub crc: u32,
    pub rec_type: RecordType,
    pub key_size: usize,
    pub value_size: usize,
    /// Number of bytes the header itself occupied (crc + type + both varints).
    pub header_size: usize,
}

/// Decodes a record header from up to [`MAX_LOG_RECORD_HEADER_SIZE`] bytes.
///
/// Returns `None` as the end-of-file signal: the buffer is too short to hold
/// a header, a varint runs off the end of the buffer, or the header decodes
/// to the all-zero tail left in a pre-allocated or truncated segment.
pub(crate) fn decode_header(buf: &[u8]) -> Option<LogRecordHeader> {
    if buf.len() <= 4 {
        return None;
    }
    let crc = u32::from_le_bytes(buf[0..4].try_into().unwrap());
    let rec_type = RecordType::from_u8(buf[4])?;
    let (key_size, n1) = i64::decode_var(&buf[5..])?;
    let (value_size, n2) = i64::decode_var(buf.get(5 + n1..)?)?;
    if crc == 0 && key_size == 0 && value_size == 0 {
        return None;
    }
    Some(LogRecordHeader {
        crc,
        rec_type,
        key_size: key_size as usize,
        value_size: value_size as usize,
        header_size: 5 + n1 + n2,
    })
}

impl LogRecord {
    /// Decodes a complete record given its header and a buffer containing at
    /// least `header.header_size + header.key_size + header.value_size` bytes
    /// starting at the record's first byte (the CRC field).
    pub(crate) fn decode_body(header: &LogRecordHeader, buf: &[u8]) -> Result<Self, StorageError> {
        let key_start = header.header_size;
        let value_start = key_start + header.key_size;
        let end = value_start + header.value_size;
        if buf.len() < end {
            return Err(StorageError::DataDirectoryCorrupted {
                reason: "record body shorter than declared key/value size".into(),
            });
        }

        let computed = barrelkv_crypto::crc32(&buf[4..end]);
        if computed != header.crc {
            return Err(StorageError::InvalidCrc);
        }

        Ok(LogRecord {
            key: buf[key_start..value_start].to_vec(),
            value: buf[value_start..end].to_vec(),
            rec_type: header.rec_type,
        })
    }
}

/// Encodes a `(file_id, offset)` position as two signed varints.
#[must_use]
pub fn encode_position(pos: Position) -> Vec<u8> {
    let mut buf = [0u8; 20];
    let n1 = i64::from(pos.file_id).encode_var(&mut buf);
    let n2 = pos.offset.encode_var(&mut buf[n1..]);
    buf[..n1 + n2].to_vec()
}

/// Decodes a position previously written by [`encode_position`].
pub fn decode_position(buf: &[u8]) -> Result<Position, StorageError> {
    let corrupt = || StorageError::DataDirectoryCorrupted {
        reason: "truncated position varint".into(),
    };
    let (file_id, n1) = i64::decode_var(buf).ok_or_else(corrupt)?;
    let (offset, _) = i64::decode_var(buf.get(n1..).ok_or_else(corrupt)?).ok_or_else(corrupt)?;
    Ok(Position::new(file_id as u32, offset))
}
