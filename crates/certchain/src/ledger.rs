//! The Ledger: an in-memory, hash-linked chain of certificate blocks.
//!
//! Certificates are submitted into a pending buffer and later sealed into a
//! block that commits to its predecessor's hash. The ledger owns both the
//! chain and the buffer; every read hands out copies or shared borrows.

use std::time::{SystemTime, UNIX_EPOCH};

use certchain_core::{
    validate_chain_structure, verify_chain, Block, Certificate, CertificateBuilder,
    CertificateId, ChainHealth, Link, Revocation, ValidationError,
};

use crate::error::{LedgerError, Result};

/// Proof recorded in every ledger's genesis block.
pub const GENESIS_PROOF: u64 = 100;

/// Sealing policy applied by [`Ledger::issue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoSeal {
    /// Proof value recorded in automatically sealed blocks.
    pub proof: u64,
    /// Seal once this many certificates are pending.
    pub threshold: usize,
}

impl AutoSeal {
    /// Seal after every issued certificate.
    pub const fn immediate(proof: u64) -> Self {
        Self {
            proof,
            threshold: 1,
        }
    }
}

/// Configuration for the Ledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Reject holder, program or issuer that are blank after trimming.
    pub require_fields: bool,
    /// Automatic sealing after [`Ledger::issue`]; `None` leaves sealing to the caller.
    pub auto_seal: Option<AutoSeal>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            require_fields: true,
            auto_seal: None,
        }
    }
}

/// Result of [`Ledger::issue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issued {
    /// Id of the new certificate.
    pub cert_id: CertificateId,
    /// The block sealed by the auto-seal policy, if it fired.
    pub block: Option<Block>,
}

/// The certificate ledger.
///
/// Always holds at least the genesis block. Mutations take `&mut self`; wrap
/// the ledger in a [`Registry`](crate::Registry) to share it across tasks.
#[derive(Debug, Clone)]
pub struct Ledger {
    /// Configuration.
    config: LedgerConfig,
    /// Sealed blocks, genesis first.
    chain: Vec<Block>,
    /// Submitted but not yet sealed certificates.
    pending: Vec<Certificate>,
}

impl Ledger {
    /// Create a ledger holding only a freshly sealed genesis block.
    pub fn new(config: LedgerConfig) -> Self {
        let mut ledger = Self {
            config,
            chain: Vec::new(),
            pending: Vec::new(),
        };
        ledger.seal(GENESIS_PROOF);
        ledger
    }

    /// Rebuild a ledger from persisted blocks and pending certificates.
    ///
    /// Only the shape of the chain is checked. A chain whose links were
    /// broken by revocation restores fine and simply fails [`verify`](Self::verify).
    pub fn restore(
        config: LedgerConfig,
        blocks: Vec<Block>,
        pending: Vec<Certificate>,
    ) -> Result<Self> {
        validate_chain_structure(&blocks)?;

        if let Some(cert) = pending.iter().find(|c| !c.has_valid_id()) {
            return Err(LedgerError::CorruptChain(ValidationError::PendingIdMismatch {
                cert_id: cert.cert_id.to_hex(),
            }));
        }

        let ledger = Self {
            config,
            chain: blocks,
            pending,
        };

        let health = ledger.verify_report();
        if !health.is_healthy() {
            tracing::warn!(?health, "restored chain does not verify");
        }
        tracing::info!(
            blocks = ledger.block_count(),
            pending = ledger.pending_count(),
            "ledger restored"
        );

        Ok(ledger)
    }

    /// Get the configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Issuing
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a certificate to the pending buffer and return its id.
    ///
    /// Fields are hashed verbatim. With `require_fields` set, a blank holder,
    /// program or issuer is rejected and the ledger is left untouched.
    pub fn submit(
        &mut self,
        holder: &str,
        program: &str,
        issuer: &str,
        metadata: &str,
    ) -> Result<CertificateId> {
        let cert = self.prepare_certificate(holder, program, issuer, metadata)?;
        Ok(self.push_pending(cert))
    }

    /// Check the fields and build a certificate without touching the ledger.
    pub fn prepare_certificate(
        &self,
        holder: &str,
        program: &str,
        issuer: &str,
        metadata: &str,
    ) -> Result<Certificate> {
        if self.config.require_fields {
            for (field, value) in [("holder", holder), ("program", program), ("issuer", issuer)] {
                if value.trim().is_empty() {
                    return Err(LedgerError::InvalidInput { field });
                }
            }
        }

        Ok(CertificateBuilder::new(holder, program, issuer)
            .metadata(metadata)
            .issued_at(now_micros())
            .build())
    }

    pub(crate) fn push_pending(&mut self, cert: Certificate) -> CertificateId {
        let cert_id = cert.cert_id;
        self.pending.push(cert);
        tracing::debug!(%cert_id, pending = self.pending.len(), "certificate submitted");
        cert_id
    }

    /// Proof to seal with once `pending` certificates are waiting, if the
    /// auto-seal policy fires at that count.
    pub(crate) fn auto_seal_proof(&self, pending: usize) -> Option<u64> {
        self.config
            .auto_seal
            .filter(|policy| pending >= policy.threshold)
            .map(|policy| policy.proof)
    }

    /// Submit a certificate, then seal if the auto-seal threshold is reached.
    pub fn issue(
        &mut self,
        holder: &str,
        program: &str,
        issuer: &str,
        metadata: &str,
    ) -> Result<Issued> {
        let cert_id = self.submit(holder, program, issuer, metadata)?;

        let block = self
            .auto_seal_proof(self.pending.len())
            .map(|proof| self.seal(proof));

        Ok(Issued { cert_id, block })
    }

    /// Seal every pending certificate into a new block and return a copy of it.
    ///
    /// An empty buffer seals an empty block.
    pub fn seal(&mut self, proof: u64) -> Block {
        let certificates = std::mem::take(&mut self.pending);
        let block = self.next_block(certificates, proof);
        self.append_block(block.clone());
        block
    }

    /// Seal `certificates` into the block that would follow the current tip.
    pub(crate) fn next_block(&self, certificates: Vec<Certificate>, proof: u64) -> Block {
        let previous_hash = match self.chain.last() {
            Some(last) => Link::Block(last.hash),
            None => Link::Genesis,
        };
        let index = self.chain.len() as u64 + 1;

        Block::seal(index, now_micros(), certificates, proof, previous_hash)
    }

    /// Append a block from [`next_block`](Self::next_block) that sealed the
    /// whole pending buffer.
    pub(crate) fn append_block(&mut self, block: Block) {
        tracing::info!(
            index = block.index,
            certificates = block.len(),
            hash = %block.hash,
            "block sealed"
        );

        self.pending.clear();
        self.chain.push(block);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Integrity
    // ─────────────────────────────────────────────────────────────────────────

    /// Check every link and every recomputed hash after the genesis block.
    pub fn verify(&self) -> bool {
        self.verify_report().is_healthy()
    }

    /// Like [`verify`](Self::verify), but reports the first violation.
    pub fn verify_report(&self) -> ChainHealth {
        verify_chain(&self.chain)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Revocation
    // ─────────────────────────────────────────────────────────────────────────

    /// Revoke a sealed certificate by its hex id.
    ///
    /// Returns `false` if no sealed certificate matches; pending certificates
    /// cannot be revoked. Revoking an already revoked certificate returns
    /// `true` and changes nothing.
    ///
    /// # Known limitation
    ///
    /// The containing block is re-hashed in place but later blocks keep the
    /// old hash in `previous_hash`. Revoking inside any block that has a
    /// successor therefore makes [`verify`](Self::verify) return `false`.
    pub fn revoke(&mut self, cert_id: &str) -> bool {
        match cert_id.trim().parse::<CertificateId>() {
            Ok(id) => self.revoke_certificate(&id).is_some(),
            Err(_) => false,
        }
    }

    /// The sealed block holding `id`.
    pub(crate) fn block_containing(&self, id: &CertificateId) -> Option<&Block> {
        self.chain.iter().find(|b| b.find(id).is_some())
    }

    /// Revoke a sealed certificate and describe what changed.
    pub fn revoke_certificate(&mut self, id: &CertificateId) -> Option<Revocation> {
        let last_index = self.chain.len() as u64;
        let block = self
            .chain
            .iter_mut()
            .find(|b| b.find(id).is_some())?;
        let revocation = block.revoke(id)?;

        if revocation.already_revoked {
            tracing::debug!(cert_id = %id, "certificate already revoked");
            return Some(revocation);
        }

        tracing::info!(
            cert_id = %id,
            block = revocation.block_index,
            new_hash = %revocation.new_hash,
            "certificate revoked"
        );
        if revocation.block_index < last_index {
            tracing::warn!(
                block = revocation.block_index,
                successor = revocation.block_index + 1,
                "revocation re-hashed a block with a successor; chain no longer verifies"
            );
        }

        Some(revocation)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Number of sealed blocks, genesis included.
    pub fn block_count(&self) -> usize {
        self.chain.len()
    }

    /// Number of pending certificates.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Sealed blocks in chain order.
    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    /// Pending certificates in submission order.
    pub fn pending(&self) -> &[Certificate] {
        &self.pending
    }

    /// The most recently sealed block.
    pub fn last_block(&self) -> Option<&Block> {
        self.chain.last()
    }

    /// Sealed blocks from newest to oldest.
    pub fn blocks_newest_first(&self) -> impl Iterator<Item = &Block> + '_ {
        self.chain.iter().rev()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

/// Get current time in microseconds.
pub(crate) fn now_micros() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or_default()
}
