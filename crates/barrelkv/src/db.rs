//! The caller-facing `Engine`: a thin, typed wrapper over
//! [`barrelkv_storage::Engine`] that speaks `Bytes` and this crate's [`Error`]
//! instead of the storage crate's own raw `Vec<u8>`/`StorageError` surface.

use bytes::Bytes;

use barrelkv_storage::{EngineStat, IteratorOptions, Options};

use crate::batch::Batch;
use crate::error::Result;
use crate::iterator::DbIterator;

/// An open Bitcask-style key-value database.
///
/// Single writer, many concurrent readers. Cloning is not supported — share
/// an `Engine` behind an `Arc` if multiple threads need a handle.
pub struct Engine {
    inner: barrelkv_storage::Engine,
}

impl Engine {
    /// Opens (creating if absent) the database at `options.dir_path`,
    /// recovering its index from segments and any hint file present.
    pub fn open(options: Options) -> Result<Self> {
        let dir_path = options.dir_path.clone();
        let inner = barrelkv_storage::Engine::open(options).inspect_err(|e| {
            tracing::error!(dir = %dir_path.display(), error = %e, "failed to open database");
        })?;
        tracing::info!(dir = %dir_path.display(), keys = inner.len(), "database opened");
        Ok(Self { inner })
    }

    /// Writes `value` for `key`.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.inner.put(key, value)?;
        Ok(())
    }

    /// Reads the current value for `key`.
    pub fn get(&self, key: &[u8]) -> Result<Bytes> {
        Ok(Bytes::from(self.inner.get(key)?))
    }

    /// Deletes `key`. A no-op, not an error, if the key has no live entry.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.inner.delete(key)?;
        Ok(())
    }

    /// Every live key, in ascending lexicographic order.
    #[must_use]
    pub fn list_keys(&self) -> Vec<Bytes> {
        self.inner.list_keys().into_iter().map(Bytes::from).collect()
    }

    /// Visits every live `(key, value)` pair in ascending order, stopping
    /// early the first time `f` returns `false`.
    pub fn fold(&self, mut f: impl FnMut(&[u8], &[u8]) -> bool) -> Result<()> {
        self.inner.fold(|k, v| Ok(f(k, v)))?;
        Ok(())
    }

    /// Opens a new atomic batch writer against this database.
    #[must_use]
    pub fn new_batch(&self) -> Batch<'_> {
        Batch::new(self.inner.new_batch())
    }

    /// Runs the merge (compaction) pipeline, reclaiming space held by
    /// superseded records. Fails with [`Error::Storage`] carrying
    /// `StorageError::MergeIsProgress` if another merge is already running.
    pub fn merge(&self) -> Result<()> {
        self.inner.merge()?;
        Ok(())
    }

    /// Opens a snapshot iterator over the database's live entries.
    #[must_use]
    pub fn iter(&self, options: IteratorOptions) -> DbIterator<'_> {
        DbIterator::new(self.inner.iter(options))
    }

    /// A summary snapshot for operator tooling (the CLI's `info` command, tests).
    #[must_use]
    pub fn stat(&self) -> EngineStat {
        self.inner.stat()
    }

    /// Syncs every open segment to stable storage.
    pub fn sync(&self) -> Result<()> {
        self.inner.sync()?;
        Ok(())
    }

    /// Flushes and closes every segment. Consumes the engine.
    pub fn close(self) -> Result<()> {
        tracing::info!("closing database");
        self.inner.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn basic_round_trip() {
        let dir = tempdir().unwrap();
        let db = Engine::open(Options::new(dir.path())).unwrap();
        db.put(b"name", b"bitcask").unwrap();
        assert_eq!(db.get(b"name").unwrap(), Bytes::from_static(b"bitcask"));
        db.delete(b"name").unwrap();
        assert!(db.get(b"name").is_err());
    }

    #[test]
    fn fold_stops_early() {
        let dir = tempdir().unwrap();
        let db = Engine::open(Options::new(dir.path())).unwrap();
        db.put(b"a", b"1").unwrap();
        db.put(b"b", b"2").unwrap();
        db.put(b"c", b"3").unwrap();

        let mut seen = Vec::new();
        db.fold(|k, _| {
            seen.push(k.to_vec());
            seen.len() < 2
        })
        .unwrap();
        assert_eq!(seen, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn merge_then_reopen_preserves_values() {
        let dir = tempdir().unwrap();
        let options = Options::new(dir.path()).with_data_file_size(4096);
        let db = Engine::open(options.clone()).unwrap();
        for i in 0..50 {
            db.put(format!("k{i}").as_bytes(), b"v").unwrap();
        }
        db.merge().unwrap();
        db.close().unwrap();

        let db = Engine::open(options).unwrap();
        for i in 0..50 {
            assert_eq!(db.get(format!("k{i}").as_bytes()).unwrap(), Bytes::from_static(b"v"));
        }
    }
}
