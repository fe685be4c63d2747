//! Bitcask-style append-only storage engine.
//!
//! A database is a directory of numbered, append-only segment files plus an
//! in-memory index mapping every live key to the position of its latest
//! record. Writes are always appended to the active segment and never
//! modify bytes already on disk; updates and deletes are new records, and
//! space is reclaimed only by the merge pipeline ([`merge`]) rewriting live
//! records into a fresh set of segments.
//!
//! [`Engine`] is the entry point: [`Engine::open`] recovers an existing
//! directory (or creates one), then [`Engine::put`]/[`Engine::get`]/
//! [`Engine::delete`] operate on it directly. [`Engine::new_batch`] groups
//! multiple mutations into one atomic commit, and [`Engine::iter`] walks the
//! live key space in order.

mod batch;
mod engine;
mod error;
mod index;
mod iterator;
mod merge;
mod record;
mod segment;
mod seqkey;

pub use batch::Batch;
pub use engine::{Engine, EngineStat};
pub use error::{StorageError, StorageResult};
pub use index::{ArtIndex, BTreeIndex, Index, IndexIterator};
pub use iterator::DbIterator;
pub use record::{LogRecord, MAX_LOG_RECORD_HEADER_SIZE, decode_position, encode_position};
pub use segment::{SegmentFile, hint_path, merge_finished_path, segment_path};

pub use barrelkv_types::{IndexType, IteratorOptions, Options, Position, RecordType};
