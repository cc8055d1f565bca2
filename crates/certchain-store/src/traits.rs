//! Store trait: the abstract interface for ledger persistence.
//!
//! This trait keeps the ledger storage-agnostic. Implementations include
//! SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use certchain_core::{canonical_block_bytes, Block, Certificate, Digest};

use crate::error::Result;

/// Result of writing a block at its index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutResult {
    /// No block existed at this index.
    Inserted,
    /// The identical block is already stored (idempotent - not an error).
    Unchanged,
    /// A different block was stored at this index and has been overwritten.
    Replaced {
        /// Hash of the block that was overwritten.
        previous: Digest,
    },
}

/// The Store trait: async interface for ledger persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, `spawn_blocking` is used internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Canonical bytes are authoritative**: `canonical` must be
///   `canonical_block_bytes(block)`; readers decode from those bytes.
/// - **Replacement is allowed**: revocation re-seals a block in place, so a
///   block at an existing index may be overwritten. Stores never check links.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Block Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Write a block at its index.
    ///
    /// # Arguments
    /// - `block`: The block to store.
    /// - `canonical`: Its canonical bytes (cached to avoid recomputation).
    ///
    /// # Returns
    /// - `Inserted` if no block existed at this index.
    /// - `Unchanged` if identical bytes are already stored.
    /// - `Replaced` if a different block was overwritten.
    async fn put_block(&self, block: &Block, canonical: &[u8]) -> Result<PutResult>;

    /// Get a block by index.
    async fn get_block(&self, index: u64) -> Result<Option<Block>>;

    /// Get the stored canonical bytes for a block.
    async fn get_canonical_bytes(&self, index: u64) -> Result<Option<Vec<u8>>>;

    /// Load every block, ordered by index.
    async fn load_chain(&self) -> Result<Vec<Block>>;

    /// Number of stored blocks.
    async fn block_count(&self) -> Result<u64>;

    // ─────────────────────────────────────────────────────────────────────────
    // Pending Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the stored pending buffer.
    async fn replace_pending(&self, pending: &[Certificate]) -> Result<()>;

    /// Load the pending buffer in insertion order.
    async fn load_pending(&self) -> Result<Vec<Certificate>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Sealing
    // ─────────────────────────────────────────────────────────────────────────

    /// Write a newly sealed block together with the pending buffer left
    /// after sealing it.
    ///
    /// Both writes land or neither does: a failure leaves the stored chain
    /// and pending buffer exactly as they were.
    async fn commit_seal(
        &self,
        block: &Block,
        canonical: &[u8],
        pending: &[Certificate],
    ) -> Result<PutResult>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Encode a block canonically and write it.
    fn put_sealed(&self, block: &Block) -> impl std::future::Future<Output = Result<PutResult>> + Send;

    /// Encode a block canonically and commit it with the remaining pending buffer.
    fn commit_sealed(
        &self,
        block: &Block,
        pending: &[Certificate],
    ) -> impl std::future::Future<Output = Result<PutResult>> + Send;

    /// Write a whole ledger snapshot: every block, then the pending buffer.
    fn save_snapshot(
        &self,
        blocks: &[Block],
        pending: &[Certificate],
    ) -> impl std::future::Future<Output = Result<Vec<PutResult>>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn put_sealed(&self, block: &Block) -> Result<PutResult> {
        let canonical = canonical_block_bytes(block);
        self.put_block(block, &canonical).await
    }

    async fn commit_sealed(&self, block: &Block, pending: &[Certificate]) -> Result<PutResult> {
        let canonical = canonical_block_bytes(block);
        self.commit_seal(block, &canonical, pending).await
    }

    async fn save_snapshot(
        &self,
        blocks: &[Block],
        pending: &[Certificate],
    ) -> Result<Vec<PutResult>> {
        let mut results = Vec::with_capacity(blocks.len());
        for block in blocks {
            results.push(self.put_sealed(block).await?);
        }
        self.replace_pending(pending).await?;
        Ok(results)
    }
}
