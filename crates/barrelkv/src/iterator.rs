//! Facade over [`barrelkv_storage::DbIterator`], yielding `Bytes`.

use bytes::Bytes;

use crate::error::Result;

/// An ordered snapshot cursor over a database's live key-value pairs.
pub struct DbIterator<'e> {
    inner: barrelkv_storage::DbIterator<'e>,
}

impl<'e> DbIterator<'e> {
    pub(crate) fn new(inner: barrelkv_storage::DbIterator<'e>) -> Self {
        Self { inner }
    }

    /// Resets the cursor to the first entry.
    pub fn rewind(&mut self) {
        self.inner.rewind();
    }

    /// Positions the cursor at the first matching entry `>= key` (or `<= key`
    /// in reverse).
    pub fn seek(&mut self, key: &[u8]) {
        self.inner.seek(key);
    }

    /// Advances the cursor to the next matching entry.
    pub fn next(&mut self) {
        self.inner.next();
    }

    /// Whether the cursor currently addresses a live entry.
    #[must_use]
    pub fn valid(&self) -> bool {
        self.inner.valid()
    }

    /// The key at the cursor. Panics if `!valid()`.
    #[must_use]
    pub fn key(&self) -> Bytes {
        Bytes::copy_from_slice(self.inner.key())
    }

    /// Resolves the value at the cursor. Panics if `!valid()`.
    pub fn value(&self) -> Result<Bytes> {
        Ok(Bytes::from(self.inner.value()?))
    }

    /// Drops the snapshot.
    pub fn close(self) {}
}

#[cfg(test)]
mod tests {
    use barrelkv_storage::{IteratorOptions, Options};
    use tempfile::tempdir;

    use crate::Engine;

    #[test]
    fn iterates_every_live_key_in_order() {
        let dir = tempdir().unwrap();
        let db = Engine::open(Options::new(dir.path())).unwrap();
        db.put(b"b", b"2").unwrap();
        db.put(b"a", b"1").unwrap();
        db.put(b"c", b"3").unwrap();

        let mut it = db.iter(IteratorOptions::default());
        let mut seen = Vec::new();
        while it.valid() {
            seen.push(it.key().to_vec());
            it.next();
        }
        assert_eq!(seen, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }
}
