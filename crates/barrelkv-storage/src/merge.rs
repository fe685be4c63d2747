//! Merge (compaction) pipeline.
//!
//! Rewrites live records from frozen segments into a side `-merge`
//! directory via a fully independent shadow [`Engine`], emits a hint index
//! alongside it, and drops a completion marker certifying the directory is
//! safe to adopt. The live engine's own segments and index are untouched by
//! this pass — the payoff is realized by [`adopt_pending_merge`], which runs
//! at the start of the *next* `Engine::open`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use barrelkv_io::{IoBackend, SyncBackend};
use barrelkv_types::{
    DATA_FILE_SUFFIX, IndexType, MERGE_DIR_SUFFIX, MERGE_FINISHED_KEY, NON_TRANSACTION_SEQ, Options,
    Position, RecordType,
};

use crate::engine::Engine;
use crate::record::LogRecord;
use crate::segment::{SegmentFile, hint_path, merge_finished_path, segment_path};
use crate::seqkey;
use crate::{StorageError, StorageResult};

/// The transient merge directory: a sibling of `dir_path` suffixed `-merge`.
pub(crate) fn merge_dir_path(dir_path: &Path) -> PathBuf {
    let parent = dir_path.parent().unwrap_or_else(|| Path::new("."));
    let base = dir_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    parent.join(format!("{base}{MERGE_DIR_SUFFIX}"))
}

/// Runs a full merge pass against `engine`. Fails with [`StorageError::MergeIsProgress`]
/// if another merge is already running.
pub(crate) fn run(engine: &Engine) -> StorageResult<()> {
    engine
        .is_merging
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .map_err(|_| StorageError::MergeIsProgress)?;
    let result = run_inner(engine);
    engine.is_merging.store(false, Ordering::SeqCst);
    result
}

fn run_inner(engine: &Engine) -> StorageResult<()> {
    let stat = engine.stat();
    if stat.key_count == 0 && stat.active_write_off == 0 && stat.segment_count == 1 {
        return Ok(());
    }

    let (non_merge_file_id, eligible) = rotate_and_snapshot(engine)?;
    if eligible.is_empty() {
        return Ok(());
    }
    tracing::info!(
        non_merge_file_id,
        segments = eligible.len(),
        "merge starting"
    );

    let merge_dir = merge_dir_path(&engine.options().dir_path);
    if merge_dir.exists() {
        fs::remove_dir_all(&merge_dir).map_err(barrelkv_io::IoError::from)?;
    }
    fs::create_dir_all(&merge_dir).map_err(barrelkv_io::IoError::from)?;

    let io = engine.io();
    let shadow_options = Options::new(merge_dir.as_path())
        .with_sync_writes(false)
        .with_index_type(IndexType::BTree);
    let shadow = Engine::open_with_io(shadow_options, io.clone())?;

    let hint_seg = SegmentFile::open_at(io.clone(), &hint_path(&merge_dir), 0)?;

    for seg in &eligible {
        let mut offset = 0i64;
        loop {
            match seg.read_log_record(offset)? {
                None => break,
                Some((rec, consumed)) => {
                    if rec.rec_type == RecordType::Normal {
                        if let Some((_, real_key)) = seqkey::decode(&rec.key) {
                            let pos = Position::new(seg.file_id, offset);
                            if engine.index().get(real_key) == Some(pos) {
                                let rewritten = LogRecord::normal(
                                    seqkey::encode(NON_TRANSACTION_SEQ, real_key),
                                    rec.value.clone(),
                                );
                                let new_pos = shadow.append_raw(&rewritten)?;
                                hint_seg.write_hint_record(real_key, new_pos)?;
                            }
                        }
                    }
                    offset += consumed as i64;
                }
            }
        }
    }

    hint_seg.sync()?;
    shadow.sync()?;

    let marker_rec = LogRecord::normal(
        MERGE_FINISHED_KEY.to_vec(),
        non_merge_file_id.to_string().into_bytes(),
    );
    let marker_seg = SegmentFile::open_at(io, &merge_finished_path(&merge_dir), 0)?;
    marker_seg.write(&marker_rec.encode())?;
    marker_seg.sync()?;

    tracing::info!(non_merge_file_id, "merge finished");
    Ok(())
}

/// Syncs the active segment, rotates it into the older map, opens a fresh
/// active segment, and snapshots every older segment with id strictly less
/// than the new active's id (the set eligible for this merge pass).
fn rotate_and_snapshot(engine: &Engine) -> StorageResult<(u32, Vec<Arc<SegmentFile>>)> {
    let mut state = engine.state.write().unwrap();
    state.active.sync()?;

    let old_id = state.active.file_id;
    let new_id = old_id + 1;
    let new_active = Arc::new(SegmentFile::open(
        engine.io(),
        &engine.options().dir_path,
        new_id,
    )?);
    let old_active = std::mem::replace(&mut state.active, new_active);
    state.older.insert(old_id, old_active);

    let non_merge_file_id = state.active.file_id;
    let mut eligible_ids: Vec<u32> = state
        .older
        .keys()
        .copied()
        .filter(|id| *id < non_merge_file_id)
        .collect();
    eligible_ids.sort_unstable();
    let eligible = eligible_ids
        .into_iter()
        .map(|id| state.older[&id].clone())
        .collect();

    Ok((non_merge_file_id, eligible))
}

/// Adopts a completed pending merge, if one exists: segments below the
/// recorded `non_merge_file_id` are replaced by their merge-directory
/// counterparts and the merge directory is removed. If the merge directory
/// exists but carries no completion marker, the merge never finished and
/// the directory is discarded unused — never adopted on a missing marker.
pub(crate) fn adopt_pending_merge(dir_path: &Path) -> StorageResult<()> {
    let merge_dir = merge_dir_path(dir_path);
    if !merge_dir.exists() {
        return Ok(());
    }

    let marker_path = merge_finished_path(&merge_dir);
    let Some(non_merge_file_id) = read_marker(&marker_path)? else {
        tracing::warn!("merge directory found without a completion marker, discarding it");
        fs::remove_dir_all(&merge_dir).map_err(barrelkv_io::IoError::from)?;
        return Ok(());
    };
    tracing::info!(non_merge_file_id, "adopting completed merge from prior run");

    for entry in fs::read_dir(&merge_dir).map_err(barrelkv_io::IoError::from)? {
        let entry = entry.map_err(barrelkv_io::IoError::from)?;
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        if let Some(stem) = name_str.strip_suffix(DATA_FILE_SUFFIX) {
            if let Ok(id) = stem.parse::<u32>() {
                if id < non_merge_file_id {
                    fs::rename(entry.path(), segment_path(dir_path, id))
                        .map_err(barrelkv_io::IoError::from)?;
                }
            }
        }
    }

    let merge_hint = hint_path(&merge_dir);
    if merge_hint.exists() {
        fs::rename(&merge_hint, hint_path(dir_path)).map_err(barrelkv_io::IoError::from)?;
    }

    fs::remove_dir_all(&merge_dir).map_err(barrelkv_io::IoError::from)?;
    Ok(())
}

fn read_marker(path: &Path) -> StorageResult<Option<u32>> {
    if !path.exists() {
        return Ok(None);
    }
    let io: Arc<dyn IoBackend> = Arc::new(SyncBackend::new());
    let seg = SegmentFile::open_at(io, path, 0)?;
    match seg.read_log_record(0)? {
        None => Ok(None),
        Some((rec, _)) => {
            let text = std::str::from_utf8(&rec.value).ok();
            Ok(text.and_then(|s| s.parse::<u32>().ok()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barrelkv_types::Options;
    use tempfile::tempdir;

    #[test]
    fn merge_reclaims_space_and_preserves_latest_values() {
        let dir = tempdir().unwrap();
        let mut options = Options::new(dir.path());
        options.data_file_size = 4096;
        let engine = Engine::open(options.clone()).unwrap();

        for i in 0..200 {
            engine
                .put(format!("k{i}").as_bytes(), b"short")
                .unwrap();
        }
        for i in 0..200 {
            engine
                .put(format!("k{i}").as_bytes(), b"a much longer overwrite value")
                .unwrap();
        }

        engine.merge().unwrap();
        engine.close().unwrap();

        let engine = Engine::open(options).unwrap();
        assert_eq!(engine.len(), 200);
        for i in 0..200 {
            assert_eq!(
                engine.get(format!("k{i}").as_bytes()).unwrap(),
                b"a much longer overwrite value"
            );
        }
    }

    #[test]
    fn second_concurrent_merge_is_rejected() {
        let dir = tempdir().unwrap();
        let options = Options::new(dir.path());
        let engine = Engine::open(options).unwrap();
        engine.put(b"a", b"1").unwrap();
        engine
            .is_merging
            .store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(matches!(engine.merge(), Err(StorageError::MergeIsProgress)));
    }

    #[test]
    fn merge_on_empty_engine_is_a_noop() {
        let dir = tempdir().unwrap();
        let engine = Engine::open(Options::new(dir.path())).unwrap();
        engine.merge().unwrap();
        assert!(!merge_dir_path(dir.path()).exists());
    }
}
