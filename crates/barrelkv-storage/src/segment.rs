//! Segment file: one append-only `.data` file owning a single [`IoBackend`]
//! handle, plus the hint-file and merge-finished-marker helpers that share
//! its naming and framing.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

use barrelkv_io::{FileHandle, IoBackend, OpenFlags};
use barrelkv_types::{DATA_FILE_SUFFIX, HINT_FILE_NAME, MERGE_FINISHED_FILE_NAME, Position};

use crate::StorageError;
use crate::record::{LogRecord, MAX_LOG_RECORD_HEADER_SIZE, decode_header, encode_position};

/// Formats the zero-padded 9-digit file name for segment `file_id`.
#[must_use]
pub fn segment_path(dir: &Path, file_id: u32) -> PathBuf {
    dir.join(format!("{file_id:09}{DATA_FILE_SUFFIX}"))
}

/// Path of the hint file merge writes in `dir`.
#[must_use]
pub fn hint_path(dir: &Path) -> PathBuf {
    dir.join(HINT_FILE_NAME)
}

/// Path of the merge-finished marker file in `dir`.
#[must_use]
pub fn merge_finished_path(dir: &Path) -> PathBuf {
    dir.join(MERGE_FINISHED_FILE_NAME)
}

/// One append-only data file and the write cursor tracking its length.
///
/// Reads take the handle's read side and may run in parallel; a write takes
/// the write side. The engine's own lock is what actually serializes writers
/// across segments and the index — this lock only ever sees uncontended
/// acquisitions in that regime, it exists so the type is sound on its own.
pub struct SegmentFile {
    pub file_id: u32,
    io: Arc<dyn IoBackend>,
    handle: RwLock<FileHandle>,
    write_off: AtomicI64,
}

impl SegmentFile {
    /// Opens (creating if absent) the segment file `file_id` under `dir`.
    pub fn open(io: Arc<dyn IoBackend>, dir: &Path, file_id: u32) -> Result<Self, StorageError> {
        Self::open_at(io, &segment_path(dir, file_id), file_id)
    }

    /// Opens a segment file at an explicit path (used for hint/marker files
    /// that don't follow the `<id>.data` naming).
    pub fn open_at(io: Arc<dyn IoBackend>, path: &Path, file_id: u32) -> Result<Self, StorageError> {
        let handle = io.open(path, OpenFlags::append_create())?;
        let size = io.file_size(&handle)? as i64;
        Ok(Self {
            file_id,
            io,
            handle: RwLock::new(handle),
            write_off: AtomicI64::new(size),
        })
    }

    /// Current write offset, equal to the file's byte length.
    #[must_use]
    pub fn write_off(&self) -> i64 {
        self.write_off.load(Ordering::Acquire)
    }

    /// Appends `bytes`, returning the offset the write started at.
    ///
    /// On a short write (disk full, interrupted syscall), `write_off` still
    /// advances by the bytes actually accepted — trailing garbage a future
    /// recovery scan will clip as an incomplete record.
    pub fn write(&self, bytes: &[u8]) -> Result<i64, StorageError> {
        let pre = self.write_off.load(Ordering::Acquire);
        let mut handle = self.handle.write().unwrap();
        let n = self.io.write(&mut handle, bytes)?;
        self.write_off.store(pre + n as i64, Ordering::Release);
        Ok(pre)
    }

    /// Appends a hint record mapping `key` to `pos`. Hint records carry no
    /// type distinguishing them from normal ones; hint files are identified
    /// by their file name, not by record content.
    pub fn write_hint_record(&self, key: &[u8], pos: Position) -> Result<i64, StorageError> {
        let rec = LogRecord::normal(key.to_vec(), encode_position(pos));
        self.write(&rec.encode())
    }

    /// Reads and decodes the record at `offset`.
    ///
    /// Returns `Ok(None)` as the end-of-file signal (short or all-zero
    /// header). Returns `Err(InvalidCrc)` on a checksum mismatch.
    pub fn read_log_record(&self, offset: i64) -> Result<Option<(LogRecord, usize)>, StorageError> {
        let handle = self.handle.read().unwrap();

        let mut header_buf = vec![0u8; MAX_LOG_RECORD_HEADER_SIZE];
        let n = self.io.read_at(&handle, offset as u64, &mut header_buf)?;
        header_buf.truncate(n);
        let Some(header) = decode_header(&header_buf) else {
            return Ok(None);
        };

        let total = header.header_size + header.key_size + header.value_size;
        let mut full_buf = vec![0u8; total];
        let n2 = self.io.read_at(&handle, offset as u64, &mut full_buf)?;
        if n2 < total {
            return Err(StorageError::DataDirectoryCorrupted {
                reason: format!(
                    "record at offset {offset} in segment {} declares {total} bytes but only {n2} are available",
                    self.file_id
                ),
            });
        }

        let record = LogRecord::decode_body(&header, &full_buf)?;
        Ok(Some((record, total)))
    }

    /// Overrides the logical write offset and discards any on-disk bytes
    /// past it. Used only during recovery, to clip a torn write off the
    /// tail of the active segment before further appends land after it.
    pub(crate) fn truncate_to(&self, new_len: i64) -> Result<(), StorageError> {
        let handle = self.handle.write().unwrap();
        self.io.truncate(&handle, new_len as u64)?;
        self.write_off.store(new_len, Ordering::Release);
        Ok(())
    }

    /// Flushes this segment's contents to stable storage.
    pub fn sync(&self) -> Result<(), StorageError> {
        let handle = self.handle.read().unwrap();
        self.io.fsync(&handle)?;
        Ok(())
    }

    /// Closes the underlying file handle.
    pub fn close(self) -> Result<(), StorageError> {
        let handle = self.handle.into_inner().unwrap();
        self.io.close(handle)?;
        Ok(())
    }
}
