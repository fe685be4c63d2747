//! Crate-level error type.
//!
//! The storage engine's own [`barrelkv_storage::StorageError`] already spans
//! the full user-visible taxonomy; this wraps it so callers who only import
//! `barrelkv` never need to name the storage crate directly.

/// Errors returned by the `barrelkv` facade.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Any failure surfaced by the underlying storage engine.
    #[error(transparent)]
    Storage(#[from] barrelkv_storage::StorageError),
}

/// Convenience alias used throughout this crate's public API.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use barrelkv_storage::StorageError;

    use super::*;

    #[test_case(StorageError::KeyIsEmpty, "key is empty" ; "key is empty")]
    #[test_case(StorageError::KeyNotFound, "key not found" ; "key not found")]
    #[test_case(StorageError::IndexUpdateFailed, "failed to update index" ; "index update failed")]
    #[test_case(StorageError::ExceedMaxBatchNum, "exceeded max batch size" ; "exceeded max batch size")]
    #[test_case(StorageError::MergeIsProgress, "merge already in progress" ; "merge already in progress")]
    #[test_case(StorageError::InvalidCrc, "invalid crc" ; "invalid crc")]
    #[test_case(StorageError::DataFileNotFound { file_id: 7 }, "data file not found: 7" ; "data file not found")]
    #[test_case(StorageError::DataDirectoryCorrupted { reason: "bad".into() }, "data directory corrupted: bad" ; "data directory corrupted")]
    fn storage_errors_pass_through_transparently(storage_err: StorageError, expected_substr: &str) {
        let err: Error = storage_err.into();
        assert!(err.to_string().contains(expected_substr), "{err}");
    }
}
