//! Log record type tag.

/// Distinguishes the three kinds of records that can appear in a segment.
///
/// Stored as a single byte in the record header (see the `barrelkv-storage`
/// codec). `Normal` and `Deleted` are the two user-visible mutation kinds;
/// `TxnFinished` is the batch-commit marker and carries no user key/value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordType {
    /// A live put: `key` maps to `value`.
    Normal = 0,
    /// A tombstone: `key` was deleted, `value` is unused.
    Deleted = 1,
    /// Marks that every record sharing its transaction sequence committed.
    TxnFinished = 2,
}

impl RecordType {
    /// Decodes a type tag byte, failing on anything but the three known values.
    #[must_use]
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Normal),
            1 => Some(Self::Deleted),
            2 => Some(Self::TxnFinished),
            _ => None,
        }
    }

    /// Encodes the type tag as its on-disk byte.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
