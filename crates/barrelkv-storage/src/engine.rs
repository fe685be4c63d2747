//! Engine core: active + older segments, the primary index, and the
//! append/lookup/delete/recovery paths built on top of [`SegmentFile`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use barrelkv_io::{IoBackend, SyncBackend};
use barrelkv_types::{DATA_FILE_SUFFIX, NON_TRANSACTION_SEQ, Options, Position, RecordType};

use crate::index::{self, Index};
use crate::merge;
use crate::record::LogRecord;
use crate::segment::{SegmentFile, hint_path};
use crate::seqkey;
use crate::{StorageError, StorageResult};

/// The active and older segments, guarded by one lock alongside the write
/// offset of the active segment (the offset lives on `SegmentFile` itself,
/// but every mutation to it happens while this lock is held).
pub(crate) struct EngineState {
    pub(crate) active: Arc<SegmentFile>,
    pub(crate) older: HashMap<u32, Arc<SegmentFile>>,
}

/// Summary statistics for operator tooling (CLI `info`, tests).
#[derive(Debug, Clone, Copy)]
pub struct EngineStat {
    pub key_count: usize,
    pub segment_count: usize,
    pub active_file_id: u32,
    pub active_write_off: i64,
}

/// A single-writer, persistent, Bitcask-style key-value engine.
pub struct Engine {
    pub(crate) options: Options,
    pub(crate) io: Arc<dyn IoBackend>,
    pub(crate) state: RwLock<EngineState>,
    pub(crate) index: Box<dyn Index>,
    pub(crate) seq_no: AtomicU64,
    pub(crate) is_merging: AtomicBool,
    pub(crate) batch_lock: Mutex<()>,
}

impl Engine {
    /// Opens (or creates) the database at `options.dir_path` using the
    /// default [`SyncBackend`].
    pub fn open(options: Options) -> StorageResult<Self> {
        let io: Arc<dyn IoBackend> = Arc::new(SyncBackend::new());
        Self::open_with_io(options, io)
    }

    /// Opens the database using an explicit [`IoBackend`] (e.g. an
    /// alternate backend under test; production code should use [`open`](Self::open)).
    pub fn open_with_io(options: Options, io: Arc<dyn IoBackend>) -> StorageResult<Self> {
        fs::create_dir_all(&options.dir_path).map_err(barrelkv_io::IoError::from)?;

        merge::adopt_pending_merge(&options.dir_path)?;

        let mut ids = list_segment_ids(&options.dir_path)?;
        ids.sort_unstable();

        let active_id = ids.last().copied().unwrap_or(0);
        let older_ids: Vec<u32> = ids
            .iter()
            .copied()
            .filter(|id| *id != active_id)
            .collect();

        let mut older = HashMap::new();
        for id in &older_ids {
            older.insert(*id, Arc::new(SegmentFile::open(io.clone(), &options.dir_path, *id)?));
        }
        let active = Arc::new(SegmentFile::open(io.clone(), &options.dir_path, active_id)?);

        let index = index::build(options.index_type);
        let max_seq = rebuild_index(&options.dir_path, io.clone(), index.as_ref(), active_id, &active, &older)?;

        Ok(Self {
            options,
            io,
            state: RwLock::new(EngineState { active, older }),
            index,
            seq_no: AtomicU64::new(max_seq),
            is_merging: AtomicBool::new(false),
            batch_lock: Mutex::new(()),
        })
    }

    /// Allocates the next transaction sequence number (pre-incremented:
    /// the reserved `0` is never handed out).
    pub(crate) fn next_seq(&self) -> u64 {
        self.seq_no.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Appends an already-framed record under the write lock, rotating the
    /// active segment first if it would overflow `data_file_size`. Does not
    /// sync; callers decide whether and when to fsync.
    pub(crate) fn append_record_locked(
        &self,
        state: &mut EngineState,
        rec: &LogRecord,
    ) -> StorageResult<Position> {
        let encoded = rec.encode();
        if state.active.write_off() + encoded.len() as i64 > self.options.data_file_size {
            state.active.sync()?;
            let old_id = state.active.file_id;
            let new_id = old_id + 1;
            tracing::debug!(old_id, new_id, "rotating active segment");
            let new_active = Arc::new(SegmentFile::open(self.io.clone(), &self.options.dir_path, new_id)?);
            let old_active = std::mem::replace(&mut state.active, new_active);
            state.older.insert(old_id, old_active);
        }
        let off = state.active.write(&encoded)?;
        Ok(Position::new(state.active.file_id, off))
    }

    /// Appends a single non-transactional record (seq = 0) and syncs if configured.
    fn append(&self, rec: LogRecord) -> StorageResult<Position> {
        let mut state = self.state.write().unwrap();
        let pos = self.append_record_locked(&mut state, &rec)?;
        if self.options.sync_writes {
            state.active.sync()?;
        }
        Ok(pos)
    }

    /// Appends an already-framed record without touching this engine's own
    /// index. Used by the merge pipeline to write into a shadow engine whose
    /// index is never consulted — only its segments end up adopted.
    pub(crate) fn append_raw(&self, rec: &LogRecord) -> StorageResult<Position> {
        let mut state = self.state.write().unwrap();
        let pos = self.append_record_locked(&mut state, rec)?;
        if self.options.sync_writes {
            state.active.sync()?;
        }
        Ok(pos)
    }

    /// Writes `value` for `key`, appended as a `Normal` record.
    pub fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::KeyIsEmpty);
        }
        let seq_key = seqkey::encode(NON_TRANSACTION_SEQ, key);
        let pos = self.append(LogRecord::normal(seq_key, value.to_vec()))?;
        self.index.put(key.to_vec(), pos);
        Ok(())
    }

    /// Reads the current value for `key`.
    pub fn get(&self, key: &[u8]) -> StorageResult<Vec<u8>> {
        if key.is_empty() {
            return Err(StorageError::KeyIsEmpty);
        }
        let pos = self.index.get(key).ok_or(StorageError::KeyNotFound)?;
        self.get_value_at(pos)
    }

    /// Resolves a position to its record's value, erroring if it turns out
    /// to be a tombstone (shouldn't happen for a position the live index
    /// still holds, but merge/hint bugs should fail loudly, not silently).
    pub(crate) fn get_value_at(&self, pos: Position) -> StorageResult<Vec<u8>> {
        let state = self.state.read().unwrap();
        let seg = self.segment_for(&state, pos.file_id)?;
        let (rec, _) = seg
            .read_log_record(pos.offset)?
            .ok_or(StorageError::DataFileNotFound { file_id: pos.file_id })?;
        if rec.rec_type == RecordType::Deleted {
            return Err(StorageError::KeyNotFound);
        }
        Ok(rec.value)
    }

    fn segment_for(&self, state: &EngineState, file_id: u32) -> StorageResult<Arc<SegmentFile>> {
        if file_id == state.active.file_id {
            Ok(state.active.clone())
        } else {
            state
                .older
                .get(&file_id)
                .cloned()
                .ok_or(StorageError::DataFileNotFound { file_id })
        }
    }

    /// Deletes `key`. A no-op (not an error) if the key has no live entry.
    pub fn delete(&self, key: &[u8]) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::KeyIsEmpty);
        }
        if self.index.get(key).is_none() {
            return Ok(());
        }
        let seq_key = seqkey::encode(NON_TRANSACTION_SEQ, key);
        self.append(LogRecord::deleted(seq_key))?;
        self.index.delete(key);
        Ok(())
    }

    /// Snapshot of every live key, in ascending lexicographic order.
    #[must_use]
    pub fn list_keys(&self) -> Vec<Vec<u8>> {
        self.index
            .entries_ascending()
            .into_iter()
            .map(|(k, _)| k)
            .collect()
    }

    /// Visits every live `(key, value)` pair in ascending order, stopping
    /// early the first time `f` returns `false`.
    pub fn fold(&self, mut f: impl FnMut(&[u8], &[u8]) -> StorageResult<bool>) -> StorageResult<()> {
        for (key, pos) in self.index.entries_ascending() {
            let value = self.get_value_at(pos)?;
            if !f(&key, &value)? {
                break;
            }
        }
        Ok(())
    }

    /// Number of live keys in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs the merge (compaction) pipeline. See [`crate::merge`].
    pub fn merge(&self) -> StorageResult<()> {
        merge::run(self)
    }

    /// Opens a new atomic batch writer against this engine. See [`crate::batch::Batch`].
    #[must_use]
    pub fn new_batch(&self) -> crate::batch::Batch<'_> {
        crate::batch::Batch::new(self)
    }

    /// Opens a snapshot iterator over this engine's live entries. See [`crate::iterator::DbIterator`].
    #[must_use]
    pub fn iter(&self, options: barrelkv_types::IteratorOptions) -> crate::iterator::DbIterator<'_> {
        crate::iterator::DbIterator::new(self, options)
    }

    /// A summary snapshot for operator tooling.
    #[must_use]
    pub fn stat(&self) -> EngineStat {
        let state = self.state.read().unwrap();
        EngineStat {
            key_count: self.index.size(),
            segment_count: state.older.len() + 1,
            active_file_id: state.active.file_id,
            active_write_off: state.active.write_off(),
        }
    }

    /// Syncs the active segment (and, defensively, every older one).
    pub fn sync(&self) -> StorageResult<()> {
        let state = self.state.read().unwrap();
        state.active.sync()?;
        for seg in state.older.values() {
            seg.sync()?;
        }
        Ok(())
    }

    /// Flushes and closes every segment. Consumes the engine.
    pub fn close(self) -> StorageResult<()> {
        let state = self.state.into_inner().unwrap();
        state.active.sync()?;
        if let Ok(seg) = Arc::try_unwrap(state.active) {
            seg.close()?;
        }
        for (_, seg) in state.older {
            seg.sync()?;
            if let Ok(seg) = Arc::try_unwrap(seg) {
                seg.close()?;
            }
        }
        Ok(())
    }

    pub(crate) fn options(&self) -> &Options {
        &self.options
    }

    pub(crate) fn io(&self) -> Arc<dyn IoBackend> {
        self.io.clone()
    }

    pub(crate) fn index(&self) -> &dyn Index {
        self.index.as_ref()
    }
}

fn list_segment_ids(dir: &Path) -> StorageResult<Vec<u32>> {
    let mut ids = Vec::new();
    for entry in fs::read_dir(dir).map_err(barrelkv_io::IoError::from)? {
        let entry = entry.map_err(barrelkv_io::IoError::from)?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(stem) = name.strip_suffix(DATA_FILE_SUFFIX) {
            if let Ok(id) = stem.parse::<u32>() {
                ids.push(id);
            }
        }
    }
    Ok(ids)
}

fn apply_index_entry(index: &dyn Index, key: &[u8], pos: Position, rec_type: RecordType) {
    match rec_type {
        RecordType::Normal => {
            index.put(key.to_vec(), pos);
        }
        RecordType::Deleted => {
            index.delete(key);
        }
        RecordType::TxnFinished => {}
    }
}

/// Folds the hint file (if present) into `index`, then scans every segment
/// from offset 0, reconstructing the index and grouping records by
/// transaction sequence so that only fully-committed batches apply. Returns
/// the maximum sequence observed, to seed the engine's counter.
fn rebuild_index(
    dir: &Path,
    io: Arc<dyn IoBackend>,
    index: &dyn Index,
    active_id: u32,
    active: &SegmentFile,
    older: &HashMap<u32, Arc<SegmentFile>>,
) -> StorageResult<u64> {
    load_hint_file(dir, io, index)?;

    let mut ids: Vec<u32> = older.keys().copied().collect();
    ids.sort_unstable();
    ids.push(active_id);

    let mut pending: HashMap<u64, Vec<(Vec<u8>, Position, RecordType)>> = HashMap::new();
    let mut max_seq = 0u64;

    for file_id in ids {
        let seg: &SegmentFile = if file_id == active_id {
            active
        } else {
            &older[&file_id]
        };
        let mut offset = 0i64;
        loop {
            match seg.read_log_record(offset) {
                Ok(None) => break,
                Ok(Some((rec, consumed))) => {
                    let Some((seq, real_key)) = seqkey::decode(&rec.key) else {
                        offset += consumed as i64;
                        continue;
                    };
                    max_seq = max_seq.max(seq);
                    let pos = Position::new(file_id, offset);
                    if rec.rec_type == RecordType::TxnFinished {
                        if let Some(entries) = pending.remove(&seq) {
                            for (k, p, t) in entries {
                                apply_index_entry(index, &k, p, t);
                            }
                        }
                    } else if seq == NON_TRANSACTION_SEQ {
                        apply_index_entry(index, real_key, pos, rec.rec_type);
                    } else {
                        pending
                            .entry(seq)
                            .or_default()
                            .push((real_key.to_vec(), pos, rec.rec_type));
                    }
                    offset += consumed as i64;
                }
                Err(StorageError::InvalidCrc) if file_id == active_id => {
                    tracing::warn!(file_id, offset, "active segment tail fails CRC, truncating on recovery");
                    break;
                }
                Err(StorageError::InvalidCrc) => {
                    tracing::error!(file_id, offset, "immutable segment has a corrupted record");
                    return Err(StorageError::DataDirectoryCorrupted {
                        reason: format!("segment {file_id} has a corrupted record at offset {offset}"),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        if file_id == active_id && offset < active.write_off() {
            active.truncate_to(offset)?;
        }
    }

    Ok(max_seq)
}

fn load_hint_file(dir: &Path, io: Arc<dyn IoBackend>, index: &dyn Index) -> StorageResult<()> {
    let path = hint_path(dir);
    if !path.exists() {
        tracing::debug!("no hint file present, rebuilding index from a full segment scan");
        return Ok(());
    }
    let seg = SegmentFile::open_at(io, &path, 0)?;
    let mut offset = 0i64;
    let mut loaded = 0usize;
    loop {
        match seg.read_log_record(offset)? {
            None => break,
            Some((rec, consumed)) => {
                let pos = crate::record::decode_position(&rec.value)?;
                index.put(rec.key, pos);
                loaded += 1;
                offset += consumed as i64;
            }
        }
    }
    tracing::info!(loaded, "loaded hint file");
    Ok(())
}
