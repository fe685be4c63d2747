//! Stable, user-visible error taxonomy for the storage engine.

/// Errors surfaced by the storage engine.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A caller passed an empty key to an operation that requires one.
    #[error("key is empty")]
    KeyIsEmpty,

    /// The in-memory index rejected an update (e.g. a concurrent-writer race
    /// the engine's locking is supposed to prevent was observed anyway).
    #[error("failed to update index")]
    IndexUpdateFailed,

    /// The key has no live entry in the index.
    #[error("key not found")]
    KeyNotFound,

    /// A position referenced a segment file id that isn't open.
    #[error("data file not found: {file_id}")]
    DataFileNotFound { file_id: u32 },

    /// The data directory contains a record or file this engine cannot parse.
    #[error("data directory corrupted: {reason}")]
    DataDirectoryCorrupted { reason: String },

    /// A pending batch grew past `Options::max_batch_num`.
    #[error("exceeded max batch size")]
    ExceedMaxBatchNum,

    /// A merge was already running when another was requested.
    #[error("merge already in progress")]
    MergeIsProgress,

    /// A record's stored CRC did not match the bytes actually read.
    #[error("invalid crc, log record may be corrupted")]
    InvalidCrc,

    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] barrelkv_io::IoError),
}

/// Convenience alias used throughout the storage engine.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
