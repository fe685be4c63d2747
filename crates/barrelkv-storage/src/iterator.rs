//! Snapshot cursor over an engine's live entries, with an optional prefix filter.

use barrelkv_types::IteratorOptions;

use crate::StorageResult;
use crate::engine::Engine;
use crate::index::IndexIterator;

/// An ordered snapshot cursor over one [`Engine`]'s live key-value pairs.
///
/// The snapshot is taken when the iterator is constructed; writes made to
/// the engine afterward are not observed. `value()` re-reads the record from
/// disk at iteration time rather than copying every value up front.
pub struct DbIterator<'e> {
    engine: &'e Engine,
    inner: IndexIterator,
    prefix: Vec<u8>,
}

impl<'e> DbIterator<'e> {
    pub(crate) fn new(engine: &'e Engine, options: IteratorOptions) -> Self {
        let inner = IndexIterator::new(engine.index(), options.reverse);
        let mut it = Self {
            engine,
            inner,
            prefix: options.prefix,
        };
        it.skip_until_matching();
        it
    }

    /// Resets the cursor to the first entry.
    pub fn rewind(&mut self) {
        self.inner.rewind();
        self.skip_until_matching();
    }

    /// Positions the cursor at the first entry `>= key` (or `<= key` in
    /// reverse) that also matches the prefix filter, if one is set.
    pub fn seek(&mut self, key: &[u8]) {
        self.inner.seek(key);
        self.skip_until_matching();
    }

    /// Advances the cursor to the next matching entry.
    pub fn next(&mut self) {
        self.inner.next();
        self.skip_until_matching();
    }

    /// Whether the cursor currently addresses a live entry.
    #[must_use]
    pub fn valid(&self) -> bool {
        self.inner.valid()
    }

    /// The key at the cursor. Panics if `!valid()`.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        self.inner.key()
    }

    /// Resolves the value at the cursor by re-reading its segment record.
    /// Panics if `!valid()`.
    pub fn value(&self) -> StorageResult<Vec<u8>> {
        self.engine.get_value_at(self.inner.value())
    }

    /// Drops the snapshot. Present for parity with the capability set;
    /// dropping the iterator does the same thing.
    pub fn close(self) {}

    fn skip_until_matching(&mut self) {
        if self.prefix.is_empty() {
            return;
        }
        while self.inner.valid() && !self.inner.key().starts_with(self.prefix.as_slice()) {
            self.inner.next();
        }
    }
}

#[cfg(test)]
mod tests {
    use barrelkv_types::Options;
    use tempfile::tempdir;

    use super::*;

    fn engine_with(entries: &[(&str, &str)]) -> Engine {
        let dir = tempdir().unwrap();
        let engine = Engine::open(Options::new(dir.path())).unwrap();
        for (k, v) in entries {
            engine.put(k.as_bytes(), v.as_bytes()).unwrap();
        }
        engine
    }

    #[test]
    fn iterates_in_ascending_order() {
        let engine = engine_with(&[("b", "2"), ("a", "1"), ("c", "3")]);
        let mut it = engine.iter(IteratorOptions::default());
        let mut seen = Vec::new();
        while it.valid() {
            seen.push((it.key().to_vec(), it.value().unwrap()));
            it.next();
        }
        assert_eq!(
            seen,
            vec![
                (b"a".to_vec(), b"1".to_vec()),
                (b"b".to_vec(), b"2".to_vec()),
                (b"c".to_vec(), b"3".to_vec()),
            ]
        );
    }

    #[test]
    fn reverse_option_flips_order() {
        let engine = engine_with(&[("a", "1"), ("b", "2")]);
        let mut it = engine.iter(IteratorOptions::default().with_reverse(true));
        assert_eq!(it.key(), b"b");
        it.next();
        assert_eq!(it.key(), b"a");
        it.next();
        assert!(!it.valid());
    }

    #[test]
    fn prefix_filter_skips_non_matching_keys() {
        let engine = engine_with(&[("app-1", "x"), ("zzz", "y"), ("app-2", "z")]);
        let mut it = engine.iter(IteratorOptions::default().with_prefix(b"app-".to_vec()));
        let mut seen = Vec::new();
        while it.valid() {
            seen.push(it.key().to_vec());
            it.next();
        }
        assert_eq!(seen, vec![b"app-1".to_vec(), b"app-2".to_vec()]);
    }
}
