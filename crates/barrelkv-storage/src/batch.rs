//! Atomic multi-key batch writer.
//!
//! Mutations are buffered client-side and only touch the log and the index
//! on [`Batch::commit`], which appends every buffered record under one lock
//! acquisition with a shared transaction sequence, followed by a single
//! `TxnFinished` marker. Recovery only ever applies a sequence's records once
//! it has seen that sequence's marker, so a reader restarting mid-commit (or
//! crashing before `commit` returns) never observes a partial batch.

use std::collections::HashMap;
use std::sync::Mutex;

use barrelkv_types::Position;

use crate::StorageError;
use crate::StorageResult;
use crate::engine::Engine;
use crate::record::LogRecord;
use crate::seqkey;

enum PendingOp {
    Put(Vec<u8>),
    Delete,
}

/// A buffered, all-or-nothing group of mutations against one [`Engine`].
///
/// Dropping a batch without calling [`commit`](Self::commit) discards it;
/// nothing buffered here is ever visible to readers.
pub struct Batch<'e> {
    engine: &'e Engine,
    pending: Mutex<HashMap<Vec<u8>, PendingOp>>,
}

impl<'e> Batch<'e> {
    pub(crate) fn new(engine: &'e Engine) -> Self {
        Self {
            engine,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Buffers a put. Does not touch the log or index until `commit`.
    pub fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::KeyIsEmpty);
        }
        let mut pending = self.pending.lock().unwrap();
        self.check_capacity(&pending, key)?;
        pending.insert(key.to_vec(), PendingOp::Put(value.to_vec()));
        Ok(())
    }

    /// Buffers a delete. A silent no-op if the key has no live entry and is
    /// not itself already pending in this batch.
    pub fn delete(&self, key: &[u8]) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::KeyIsEmpty);
        }
        let mut pending = self.pending.lock().unwrap();
        if !pending.contains_key(key) && self.engine.index().get(key).is_none() {
            return Ok(());
        }
        self.check_capacity(&pending, key)?;
        pending.insert(key.to_vec(), PendingOp::Delete);
        Ok(())
    }

    fn check_capacity(
        &self,
        pending: &HashMap<Vec<u8>, PendingOp>,
        key: &[u8],
    ) -> StorageResult<()> {
        if !pending.contains_key(key) && pending.len() >= self.engine.options().max_batch_num {
            return Err(StorageError::ExceedMaxBatchNum);
        }
        Ok(())
    }

    /// Commits every buffered mutation as one transaction. An empty batch
    /// commits trivially without writing anything to the log.
    pub fn commit(self) -> StorageResult<()> {
        let pending = self.pending.into_inner().unwrap();
        if pending.is_empty() {
            return Ok(());
        }

        let _serialize = self.engine.batch_lock.lock().unwrap();
        let seq = self.engine.next_seq();

        let mut state = self.engine.state.write().unwrap();
        let mut applied: Vec<(Vec<u8>, Option<Position>)> = Vec::with_capacity(pending.len());
        for (key, op) in &pending {
            let seq_key = seqkey::encode(seq, key);
            let (rec, outcome) = match op {
                PendingOp::Put(value) => (LogRecord::normal(seq_key, value.clone()), true),
                PendingOp::Delete => (LogRecord::deleted(seq_key), false),
            };
            let pos = self.engine.append_record_locked(&mut state, &rec)?;
            applied.push((key.clone(), outcome.then_some(pos)));
        }

        let marker = LogRecord::txn_finished(seqkey::encode(seq, b""));
        self.engine.append_record_locked(&mut state, &marker)?;

        if self.engine.options().sync_writes {
            state.active.sync()?;
        }
        drop(state);

        for (key, pos) in applied {
            match pos {
                Some(pos) => {
                    self.engine.index().put(key, pos);
                }
                None => {
                    self.engine.index().delete(&key);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use barrelkv_types::Options;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn commit_makes_every_key_visible_atomically() {
        let dir = tempdir().unwrap();
        let engine = Engine::open(Options::new(dir.path())).unwrap();

        let batch = engine.new_batch();
        batch.put(b"a", b"1").unwrap();
        batch.put(b"b", b"2").unwrap();
        batch.commit().unwrap();

        assert_eq!(engine.get(b"a").unwrap(), b"1");
        assert_eq!(engine.get(b"b").unwrap(), b"2");
    }

    #[test]
    fn dropped_batch_is_never_visible() {
        let dir = tempdir().unwrap();
        let engine = Engine::open(Options::new(dir.path())).unwrap();

        {
            let batch = engine.new_batch();
            batch.put(b"a", b"1").unwrap();
        }

        assert!(matches!(engine.get(b"a"), Err(StorageError::KeyNotFound)));
    }

    #[test]
    fn uncommitted_batch_does_not_survive_reopen() {
        let dir = tempdir().unwrap();
        let options = Options::new(dir.path());
        {
            let engine = Engine::open(options.clone()).unwrap();
            let batch = engine.new_batch();
            batch.put(b"a", b"1").unwrap();
            // No commit, no close: the marker is never written.
        }
        let engine = Engine::open(options).unwrap();
        assert!(engine.is_empty());
    }

    #[test]
    fn exceeding_max_batch_num_errors() {
        let dir = tempdir().unwrap();
        let options = Options::new(dir.path()).with_max_batch_num(2);
        let engine = Engine::open(options).unwrap();

        let batch = engine.new_batch();
        batch.put(b"a", b"1").unwrap();
        batch.put(b"b", b"2").unwrap();
        assert!(matches!(
            batch.put(b"c", b"3"),
            Err(StorageError::ExceedMaxBatchNum)
        ));
    }

    #[test]
    fn batch_delete_of_absent_key_is_silent_noop() {
        let dir = tempdir().unwrap();
        let engine = Engine::open(Options::new(dir.path())).unwrap();
        let batch = engine.new_batch();
        batch.delete(b"never-existed").unwrap();
        batch.commit().unwrap();
    }
}
