//! Database and iterator configuration.

use std::path::PathBuf;

/// Which in-memory index implementation an [`Options`] selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexType {
    /// A balanced ordered tree, predictable ordered traversal.
    #[default]
    BTree = 1,
    /// An adaptive radix tree, memory-efficient for prefix-heavy workloads.
    Art = 2,
}

/// Options controlling how a database directory is opened.
#[derive(Debug, Clone)]
pub struct Options {
    /// Directory holding the segment files.
    pub dir_path: PathBuf,
    /// Rotation threshold in bytes; a write that would exceed this triggers
    /// rotation of the active segment before the write is appended.
    pub data_file_size: i64,
    /// If true, every append is followed by an `fsync`.
    pub sync_writes: bool,
    /// Which index implementation to build on open.
    pub index_type: IndexType,
    /// Ceiling on the number of pending mutations a [`Batch`] will accept
    /// before `commit` is even attempted.
    ///
    /// [`Batch`]: https://docs.rs/barrelkv-storage (see `barrelkv_storage::Batch`)
    pub max_batch_num: usize,
}

/// Default data file rotation threshold: 256 MiB.
pub const DEFAULT_DATA_FILE_SIZE: i64 = 256 * 1024 * 1024;

/// Default ceiling on pending batch mutations.
pub const DEFAULT_MAX_BATCH_NUM: usize = 10_000;

impl Default for Options {
    fn default() -> Self {
        Self {
            dir_path: std::env::temp_dir(),
            data_file_size: DEFAULT_DATA_FILE_SIZE,
            sync_writes: false,
            index_type: IndexType::BTree,
            max_batch_num: DEFAULT_MAX_BATCH_NUM,
        }
    }
}

impl Options {
    /// Starts from the defaults with a specific data directory.
    #[must_use]
    pub fn new(dir_path: impl Into<PathBuf>) -> Self {
        Self {
            dir_path: dir_path.into(),
            ..Self::default()
        }
    }

    /// Overrides the rotation threshold.
    #[must_use]
    pub fn with_data_file_size(mut self, bytes: i64) -> Self {
        self.data_file_size = bytes;
        self
    }

    /// Overrides whether every append is synced.
    #[must_use]
    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    /// Overrides the index implementation.
    #[must_use]
    pub fn with_index_type(mut self, index_type: IndexType) -> Self {
        self.index_type = index_type;
        self
    }

    /// Overrides the batch mutation ceiling.
    #[must_use]
    pub fn with_max_batch_num(mut self, max: usize) -> Self {
        self.max_batch_num = max;
        self
    }
}

/// Options controlling an index traversal.
#[derive(Debug, Clone, Default)]
pub struct IteratorOptions {
    /// Restricts traversal to keys beginning with this byte string.
    pub prefix: Vec<u8>,
    /// Traverses in reverse lexicographic order when true.
    pub reverse: bool,
}

impl IteratorOptions {
    /// Overrides the prefix filter.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Overrides traversal direction.
    #[must_use]
    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let opts = Options::default();
        assert_eq!(opts.data_file_size, 256 * 1024 * 1024);
        assert!(!opts.sync_writes);
        assert_eq!(opts.index_type, IndexType::BTree);
        assert_eq!(opts.max_batch_num, 10_000);
    }

    #[test]
    fn iterator_defaults_are_unrestricted_forward() {
        let opts = IteratorOptions::default();
        assert!(opts.prefix.is_empty());
        assert!(!opts.reverse);
    }

    #[test_case(0 ; "zero threshold")]
    #[test_case(64 ; "small threshold")]
    #[test_case(256 * 1024 * 1024 ; "default-sized threshold")]
    #[test_case(i64::MAX ; "max threshold")]
    fn data_file_size_override_is_honored(bytes: i64) {
        let opts = Options::new("/tmp/db").with_data_file_size(bytes);
        assert_eq!(opts.data_file_size, bytes);
    }

    #[test_case(true ; "sync writes enabled")]
    #[test_case(false ; "sync writes disabled")]
    fn sync_writes_override_is_honored(sync: bool) {
        let opts = Options::new("/tmp/db").with_sync_writes(sync);
        assert_eq!(opts.sync_writes, sync);
    }

    #[test_case(IndexType::BTree ; "btree index")]
    #[test_case(IndexType::Art ; "art index")]
    fn index_type_override_is_honored(index_type: IndexType) {
        let opts = Options::new("/tmp/db").with_index_type(index_type);
        assert_eq!(opts.index_type, index_type);
    }

    #[test_case(0 ; "zero batch ceiling")]
    #[test_case(5 ; "small batch ceiling")]
    #[test_case(usize::MAX ; "unbounded batch ceiling")]
    fn max_batch_num_override_is_honored(max: usize) {
        let opts = Options::new("/tmp/db").with_max_batch_num(max);
        assert_eq!(opts.max_batch_num, max);
    }

    #[test]
    fn builder_methods_compose_independently() {
        let opts = Options::new("/tmp/db")
            .with_data_file_size(64)
            .with_sync_writes(true)
            .with_index_type(IndexType::Art)
            .with_max_batch_num(5);
        assert_eq!(opts.data_file_size, 64);
        assert!(opts.sync_writes);
        assert_eq!(opts.index_type, IndexType::Art);
        assert_eq!(opts.max_batch_num, 5);
    }
}
