//! Registry behaviour when the store refuses a write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use certchain::core::{Block, Certificate};
use certchain::store::{MemoryStore, PutResult, Store, StoreError};
use certchain::{AutoSeal, CertificateStatus, LedgerConfig, Registry};

/// A memory store whose pending or block writes can be switched off.
///
/// The inner store is shared so a second registry can reopen the same data.
struct FlakyStore {
    inner: Arc<MemoryStore>,
    refuse_pending: AtomicBool,
    refuse_blocks: AtomicBool,
}

impl FlakyStore {
    fn over(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            refuse_pending: AtomicBool::new(false),
            refuse_blocks: AtomicBool::new(false),
        }
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::InvalidData(format!("{} write refused", what)));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn put_block(&self, block: &Block, canonical: &[u8]) -> Result<PutResult, StoreError> {
        Self::check(&self.refuse_blocks, "block")?;
        self.inner.put_block(block, canonical).await
    }

    async fn get_block(&self, index: u64) -> Result<Option<Block>, StoreError> {
        self.inner.get_block(index).await
    }

    async fn get_canonical_bytes(&self, index: u64) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get_canonical_bytes(index).await
    }

    async fn load_chain(&self) -> Result<Vec<Block>, StoreError> {
        self.inner.load_chain().await
    }

    async fn block_count(&self) -> Result<u64, StoreError> {
        self.inner.block_count().await
    }

    async fn replace_pending(&self, pending: &[Certificate]) -> Result<(), StoreError> {
        Self::check(&self.refuse_pending, "pending")?;
        self.inner.replace_pending(pending).await
    }

    async fn load_pending(&self) -> Result<Vec<Certificate>, StoreError> {
        self.inner.load_pending().await
    }

    async fn commit_seal(
        &self,
        block: &Block,
        canonical: &[u8],
        pending: &[Certificate],
    ) -> Result<PutResult, StoreError> {
        Self::check(&self.refuse_blocks, "block")?;
        Self::check(&self.refuse_pending, "pending")?;
        self.inner.commit_seal(block, canonical, pending).await
    }
}

fn sealed_copies(blocks: &[Block], holder: &str) -> usize {
    blocks
        .iter()
        .flat_map(|b| b.certificates.iter())
        .filter(|c| c.holder == holder)
        .count()
}

#[tokio::test]
async fn failed_seal_changes_neither_ledger_nor_store() {
    let shared = Arc::new(MemoryStore::new());
    let registry = Registry::open(FlakyStore::over(Arc::clone(&shared)), LedgerConfig::default())
        .await
        .unwrap();

    registry.submit("Alice", "Math", "MIT", "").await.unwrap();
    registry.store().refuse_pending.store(true, Ordering::SeqCst);

    assert!(registry.seal(1).await.is_err());
    assert_eq!(registry.block_count().await, 1);
    assert_eq!(registry.pending_count().await, 1);
    assert_eq!(shared.block_count().await.unwrap(), 1);
    assert_eq!(shared.load_pending().await.unwrap().len(), 1);

    // A fresh registry over the same data sees one unsealed Alice.
    let reopened = Registry::open(FlakyStore::over(Arc::clone(&shared)), LedgerConfig::default())
        .await
        .unwrap();
    assert_eq!(reopened.find_by_holder("alice").await.len(), 1);
    assert_eq!(reopened.block_count().await, 1);

    reopened.seal(2).await.unwrap();
    assert_eq!(sealed_copies(&reopened.blocks().await, "Alice"), 1);
    assert_eq!(sealed_copies(&shared.load_chain().await.unwrap(), "Alice"), 1);
    assert!(shared.load_pending().await.unwrap().is_empty());
    assert!(reopened.verify().await);
}

#[tokio::test]
async fn failed_auto_seal_issue_is_rolled_back() {
    let shared = Arc::new(MemoryStore::new());
    let config = LedgerConfig {
        auto_seal: Some(AutoSeal::immediate(123)),
        ..LedgerConfig::default()
    };
    let registry = Registry::open(FlakyStore::over(Arc::clone(&shared)), config)
        .await
        .unwrap();

    registry.store().refuse_pending.store(true, Ordering::SeqCst);
    assert!(registry.issue("Bob", "Art", "RISD", "").await.is_err());

    assert_eq!(registry.block_count().await, 1);
    assert_eq!(registry.pending_count().await, 0);
    assert_eq!(shared.block_count().await.unwrap(), 1);
    assert!(shared.load_pending().await.unwrap().is_empty());

    registry.store().refuse_pending.store(false, Ordering::SeqCst);
    let issued = registry.issue("Bob", "Art", "RISD", "").await.unwrap();
    let block = issued.block.unwrap();
    assert_eq!(shared.get_block(2).await.unwrap(), Some(block));
}

#[tokio::test]
async fn failed_submit_keeps_pending_in_step() {
    let shared = Arc::new(MemoryStore::new());
    let registry = Registry::open(FlakyStore::over(Arc::clone(&shared)), LedgerConfig::default())
        .await
        .unwrap();

    registry.submit("Alice", "Math", "MIT", "").await.unwrap();
    registry.store().refuse_pending.store(true, Ordering::SeqCst);

    assert!(registry.submit("Bob", "Math", "MIT", "").await.is_err());
    assert_eq!(registry.pending_count().await, 1);
    assert_eq!(shared.load_pending().await.unwrap().len(), 1);
    assert!(registry.find_by_holder("bob").await.is_empty());
}

#[tokio::test]
async fn failed_revocation_keeps_certificate_valid() {
    let shared = Arc::new(MemoryStore::new());
    let registry = Registry::open(FlakyStore::over(Arc::clone(&shared)), LedgerConfig::default())
        .await
        .unwrap();

    let id = registry.submit("Carol", "Law", "Yale", "").await.unwrap().to_hex();
    let block = registry.seal(5).await.unwrap();
    registry.store().refuse_blocks.store(true, Ordering::SeqCst);

    assert!(registry.revoke(&id).await.is_err());
    assert_eq!(registry.status(&id).await, CertificateStatus::Valid);
    assert_eq!(shared.get_block(2).await.unwrap(), Some(block));

    registry.store().refuse_blocks.store(false, Ordering::SeqCst);
    assert!(registry.revoke(&id).await.unwrap());
    assert_eq!(registry.status(&id).await, CertificateStatus::Revoked);
    assert_eq!(shared.get_block(2).await.unwrap().unwrap(), registry.blocks().await[1]);
}
