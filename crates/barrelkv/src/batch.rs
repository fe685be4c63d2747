//! Facade over [`barrelkv_storage::Batch`], translating its errors into
//! this crate's [`Error`].

use crate::error::Result;

/// A buffered, all-or-nothing group of mutations against an [`crate::Engine`].
pub struct Batch<'e> {
    inner: barrelkv_storage::Batch<'e>,
}

impl<'e> Batch<'e> {
    pub(crate) fn new(inner: barrelkv_storage::Batch<'e>) -> Self {
        Self { inner }
    }

    /// Buffers a put. Not visible to readers until [`commit`](Self::commit).
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.inner.put(key, value)?;
        Ok(())
    }

    /// Buffers a delete. A silent no-op if the key is neither live nor
    /// already pending in this batch.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.inner.delete(key)?;
        Ok(())
    }

    /// Commits every buffered mutation as one atomic transaction.
    pub fn commit(self) -> Result<()> {
        self.inner.commit()?;
        Ok(())
    }
}
