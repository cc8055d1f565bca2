//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use certchain_core::{decode_block, Block, Certificate};

use crate::error::{Result, StoreError};
use crate::traits::{PutResult, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Canonical block bytes indexed by block index.
    blocks: BTreeMap<u64, Vec<u8>>,

    /// Pending certificates in insertion order.
    pending: Vec<Certificate>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    fn put(&mut self, index: u64, canonical: &[u8]) -> Result<PutResult> {
        let result = match self.blocks.get(&index) {
            None => PutResult::Inserted,
            Some(existing) if existing.as_slice() == canonical => return Ok(PutResult::Unchanged),
            Some(existing) => PutResult::Replaced {
                previous: decode_block(existing)?.hash,
            },
        };

        self.blocks.insert(index, canonical.to_vec());
        Ok(result)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put_block(&self, block: &Block, canonical: &[u8]) -> Result<PutResult> {
        self.write()?.put(block.index, canonical)
    }

    async fn get_block(&self, index: u64) -> Result<Option<Block>> {
        let inner = self.read()?;
        inner
            .blocks
            .get(&index)
            .map(|bytes| decode_block(bytes).map_err(StoreError::from))
            .transpose()
    }

    async fn get_canonical_bytes(&self, index: u64) -> Result<Option<Vec<u8>>> {
        let inner = self.read()?;
        Ok(inner.blocks.get(&index).cloned())
    }

    async fn load_chain(&self) -> Result<Vec<Block>> {
        let inner = self.read()?;
        inner
            .blocks
            .values()
            .map(|bytes| decode_block(bytes).map_err(StoreError::from))
            .collect()
    }

    async fn block_count(&self) -> Result<u64> {
        let inner = self.read()?;
        Ok(inner.blocks.len() as u64)
    }

    async fn replace_pending(&self, pending: &[Certificate]) -> Result<()> {
        let mut inner = self.write()?;
        inner.pending = pending.to_vec();
        Ok(())
    }

    async fn load_pending(&self) -> Result<Vec<Certificate>> {
        let inner = self.read()?;
        Ok(inner.pending.clone())
    }

    async fn commit_seal(
        &self,
        block: &Block,
        canonical: &[u8],
        pending: &[Certificate],
    ) -> Result<PutResult> {
        let mut inner = self.write()?;
        let result = inner.put(block.index, canonical)?;
        inner.pending = pending.to_vec();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::StoreExt;
    use certchain_core::{canonical_block_bytes, CertificateBuilder, Link};

    fn make_test_block(index: u64, prev: Link) -> Block {
        let cert = CertificateBuilder::new(format!("holder {}", index), "Biology", "Uni")
            .issued_at(1_234_567_890_000_000 + index as i64)
            .build();
        Block::seal(index, 1_234_567_890_000_000, vec![cert], 123, prev)
    }

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();
        let block = make_test_block(1, Link::Genesis);
        let canonical = canonical_block_bytes(&block);

        let result = store.put_block(&block, &canonical).await.unwrap();
        assert_eq!(result, PutResult::Inserted);

        let retrieved = store.get_block(1).await.unwrap().unwrap();
        assert_eq!(retrieved, block);
        assert_eq!(store.get_canonical_bytes(1).await.unwrap(), Some(canonical));
        assert!(store.get_block(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_idempotent() {
        let store = MemoryStore::new();
        let block = make_test_block(1, Link::Genesis);

        let r1 = store.put_sealed(&block).await.unwrap();
        assert_eq!(r1, PutResult::Inserted);

        let r2 = store.put_sealed(&block).await.unwrap();
        assert_eq!(r2, PutResult::Unchanged);
        assert_eq!(store.block_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_replace_revoked_block() {
        let store = MemoryStore::new();
        let mut block = make_test_block(1, Link::Genesis);
        let old_hash = block.hash;
        store.put_sealed(&block).await.unwrap();

        let id = block.certificates[0].cert_id;
        block.revoke(&id).unwrap();

        let result = store.put_sealed(&block).await.unwrap();
        assert_eq!(result, PutResult::Replaced { previous: old_hash });

        let stored = store.get_block(1).await.unwrap().unwrap();
        assert!(stored.certificates[0].is_revoked());
        assert_eq!(stored.hash, block.hash);
    }

    #[tokio::test]
    async fn test_memory_store_chain_order_and_pending() {
        let store = MemoryStore::new();
        let b1 = make_test_block(1, Link::Genesis);
        let b2 = make_test_block(2, Link::from(b1.hash));

        // Out of order writes still load in index order.
        store.put_sealed(&b2).await.unwrap();
        store.put_sealed(&b1).await.unwrap();

        let chain = store.load_chain().await.unwrap();
        assert_eq!(chain, vec![b1.clone(), b2]);

        let pending = b1.certificates.clone();
        store.replace_pending(&pending).await.unwrap();
        assert_eq!(store.load_pending().await.unwrap(), pending);

        store.replace_pending(&[]).await.unwrap();
        assert!(store.load_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_seal_writes_block_and_pending() {
        let store = MemoryStore::new();
        let b1 = make_test_block(1, Link::Genesis);
        store.put_sealed(&b1).await.unwrap();
        store.replace_pending(&b1.certificates).await.unwrap();

        let b2 = make_test_block(2, Link::from(b1.hash));
        let result = store.commit_sealed(&b2, &[]).await.unwrap();

        assert_eq!(result, PutResult::Inserted);
        assert_eq!(store.load_chain().await.unwrap(), vec![b1, b2]);
        assert!(store.load_pending().await.unwrap().is_empty());
    }
}
