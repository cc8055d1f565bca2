//! The Registry: a shared, persisted ledger.
//!
//! One `tokio::sync::Mutex` guards the ledger, so operations never
//! interleave. Each mutation is staged against the guarded ledger, written
//! through to the store, and applied only once the write succeeded. A failed
//! write leaves the ledger and the store as they were.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use certchain_core::{Block, Certificate, CertificateId, ChainHealth, Revocation};
use certchain_store::{Store, StoreExt};

use crate::error::Result;
use crate::ledger::{Issued, Ledger, LedgerConfig};
use crate::query::CertificateStatus;

/// A ledger shared across tasks and backed by a [`Store`].
pub struct Registry<S: Store> {
    /// The ledger, behind the single mutual-exclusion boundary.
    ledger: Mutex<Ledger>,
    /// The storage backend.
    store: Arc<S>,
}

impl<S: Store> Registry<S> {
    /// Open a registry over `store`.
    ///
    /// An empty store gets a fresh ledger whose genesis block is persisted
    /// immediately. Otherwise the chain and pending buffer are restored.
    pub async fn open(store: S, config: LedgerConfig) -> Result<Self> {
        let blocks = store.load_chain().await?;

        let ledger = if blocks.is_empty() {
            let ledger = Ledger::new(config);
            store.save_snapshot(ledger.blocks(), ledger.pending()).await?;
            tracing::info!("initialized new ledger in store");
            ledger
        } else {
            let pending = store.load_pending().await?;
            Ledger::restore(config, blocks, pending)?
        };

        Ok(Self {
            ledger: Mutex::new(ledger),
            store: Arc::new(store),
        })
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    async fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Submit a certificate into the pending buffer.
    pub async fn submit(
        &self,
        holder: &str,
        program: &str,
        issuer: &str,
        metadata: &str,
    ) -> Result<CertificateId> {
        let mut guard = self.lock().await;
        let cert = guard.prepare_certificate(holder, program, issuer, metadata)?;

        let mut pending = guard.pending().to_vec();
        pending.push(cert.clone());
        self.store.replace_pending(&pending).await?;

        Ok(guard.push_pending(cert))
    }

    /// Submit a certificate and apply the auto-seal policy.
    pub async fn issue(
        &self,
        holder: &str,
        program: &str,
        issuer: &str,
        metadata: &str,
    ) -> Result<Issued> {
        let mut guard = self.lock().await;
        let cert = guard.prepare_certificate(holder, program, issuer, metadata)?;
        let cert_id = cert.cert_id;

        let mut pending = guard.pending().to_vec();
        pending.push(cert.clone());

        match guard.auto_seal_proof(pending.len()) {
            Some(proof) => {
                let block = guard.next_block(pending, proof);
                self.store.commit_sealed(&block, &[]).await?;
                guard.append_block(block.clone());
                Ok(Issued {
                    cert_id,
                    block: Some(block),
                })
            }
            None => {
                self.store.replace_pending(&pending).await?;
                guard.push_pending(cert);
                Ok(Issued {
                    cert_id,
                    block: None,
                })
            }
        }
    }

    /// Seal the pending buffer into a new block.
    ///
    /// The block and the emptied pending buffer reach the store in one
    /// atomic write.
    pub async fn seal(&self, proof: u64) -> Result<Block> {
        let mut guard = self.lock().await;

        let block = guard.next_block(guard.pending().to_vec(), proof);
        self.store.commit_sealed(&block, &[]).await?;

        guard.append_block(block.clone());
        Ok(block)
    }

    /// Revoke a sealed certificate by hex id. See [`Ledger::revoke`].
    pub async fn revoke(&self, cert_id: &str) -> Result<bool> {
        match cert_id.trim().parse::<CertificateId>() {
            Ok(id) => Ok(self.revoke_certificate(&id).await?.is_some()),
            Err(_) => Ok(false),
        }
    }

    /// Revoke a sealed certificate and replace its block in the store.
    pub async fn revoke_certificate(&self, id: &CertificateId) -> Result<Option<Revocation>> {
        let mut guard = self.lock().await;

        let Some(mut block) = guard.block_containing(id).cloned() else {
            return Ok(None);
        };
        let Some(staged) = block.revoke(id) else {
            return Ok(None);
        };

        if staged.hash_changed() {
            let result = self.store.put_sealed(&block).await?;
            tracing::debug!(block = staged.block_index, ?result, "persisted revoked block");
        }

        Ok(guard.revoke_certificate(id))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// See [`Ledger::verify`].
    pub async fn verify(&self) -> bool {
        self.lock().await.verify()
    }

    /// See [`Ledger::verify_report`].
    pub async fn verify_report(&self) -> ChainHealth {
        self.lock().await.verify_report()
    }

    /// See [`Ledger::find_certificate`].
    pub async fn find_certificate(&self, cert_id: &str) -> Option<Certificate> {
        self.lock().await.find_certificate(cert_id)
    }

    /// See [`Ledger::find_by_holder`].
    pub async fn find_by_holder(&self, name: &str) -> Vec<Certificate> {
        self.lock().await.find_by_holder(name)
    }

    /// See [`Ledger::status`].
    pub async fn status(&self, cert_id: &str) -> CertificateStatus {
        self.lock().await.status(cert_id)
    }

    /// Number of sealed blocks.
    pub async fn block_count(&self) -> usize {
        self.lock().await.block_count()
    }

    /// Number of pending certificates.
    pub async fn pending_count(&self) -> usize {
        self.lock().await.pending_count()
    }

    /// Copy of every sealed block in chain order.
    pub async fn blocks(&self) -> Vec<Block> {
        self.lock().await.blocks().to_vec()
    }

    /// Copy of the whole ledger.
    pub async fn snapshot(&self) -> Ledger {
        self.lock().await.clone()
    }

    /// Run a read-only closure against the ledger under the lock.
    pub async fn with_ledger<R>(&self, f: impl FnOnce(&Ledger) -> R) -> R {
        let guard = self.lock().await;
        f(&guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certchain_store::MemoryStore;

    #[tokio::test]
    async fn test_open_persists_genesis() {
        let registry = Registry::open(MemoryStore::new(), LedgerConfig::default())
            .await
            .unwrap();

        assert_eq!(registry.block_count().await, 1);
        assert_eq!(registry.store().block_count().await.unwrap(), 1);

        let stored = registry.store().get_block(1).await.unwrap().unwrap();
        assert_eq!(stored, registry.blocks().await[0]);
    }

    #[tokio::test]
    async fn test_mutations_write_through() {
        let registry = Registry::open(MemoryStore::new(), LedgerConfig::default())
            .await
            .unwrap();

        let id = registry.submit("Alice", "Math", "MIT", "").await.unwrap();
        assert_eq!(registry.store().load_pending().await.unwrap().len(), 1);

        let block = registry.seal(1).await.unwrap();
        assert!(registry.store().load_pending().await.unwrap().is_empty());
        assert_eq!(registry.store().get_block(2).await.unwrap(), Some(block.clone()));

        assert!(registry.revoke(&id.to_hex()).await.unwrap());
        let stored = registry.store().get_block(2).await.unwrap().unwrap();
        assert_ne!(stored.hash, block.hash);
        assert!(stored.find(&id).unwrap().is_revoked());
    }

    #[tokio::test]
    async fn test_rejected_submit_leaves_state_alone() {
        let registry = Registry::open(MemoryStore::new(), LedgerConfig::default())
            .await
            .unwrap();

        assert!(registry.submit("", "Math", "MIT", "").await.is_err());
        assert_eq!(registry.pending_count().await, 0);
        assert!(registry.store().load_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_revoke_unknown_is_false() {
        let registry = Registry::open(MemoryStore::new(), LedgerConfig::default())
            .await
            .unwrap();
        assert!(!registry.revoke("garbage").await.unwrap());
        assert!(!registry.revoke(&"ab".repeat(32)).await.unwrap());
    }
}
