//! # barrelkv
//!
//! An embedded, single-writer, persistent key-value store following the
//! Bitcask log-structured design: every mutation is appended to an on-disk
//! segment file, and an in-memory index maps each live key to the byte
//! position of its most recent record. Reads consult the index, then fetch
//! the value from the referenced segment; updates and deletes are new
//! append-only records, reconciled by a `merge` pass that rewrites only live
//! records into fresh segments and discards the rest.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                        barrelkv                         │
//! │   ┌─────────┐   ┌───────────┐   ┌──────────────────┐   │
//! │   │  Engine │ → │  Index    │   │  Segment files    │   │
//! │   │ (facade)│   │(BTree/ART)│ → │  (.data, append)   │   │
//! │   └─────────┘   └───────────┘   └──────────────────┘   │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use barrelkv::{Engine, Options};
//!
//! let db = Engine::open(Options::new("./data"))?;
//! db.put(b"name", b"bitcask")?;
//! assert_eq!(db.get(b"name")?, "bitcask");
//! db.delete(b"name")?;
//! # Ok::<(), barrelkv::Error>(())
//! ```
//!
//! # Modules
//!
//! - **Facade**: [`Engine`], [`Batch`], [`DbIterator`] — the public API.
//! - **Configuration**: [`Options`], [`IteratorOptions`], [`IndexType`].

mod batch;
mod db;
mod error;
mod iterator;

pub use batch::Batch;
pub use db::Engine;
pub use error::{Error, Result};
pub use iterator::DbIterator;

// Re-export configuration and wire types so callers never need to depend on
// `barrelkv-storage` directly for ordinary use.
pub use barrelkv_storage::{
    EngineStat, IndexType, IteratorOptions, Options, Position, RecordType, StorageError,
};
