//! Block: a sealed, hash-linked batch of certificates.
//!
//! A block's hash is the canonical digest of every other field (index,
//! timestamp, certificates, proof, previous_hash). The hash field itself is
//! never part of what is hashed.

use serde::{Deserialize, Serialize};

use crate::canonical::{block_content_value, digest_value};
use crate::certificate::Certificate;
use crate::crypto::Digest;
use crate::types::{CertificateId, Link};

/// A sealed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain (1-indexed, contiguous).
    pub index: u64,

    /// When the block was sealed (Unix microseconds).
    pub timestamp: i64,

    /// Certificates in insertion order. May be empty.
    pub certificates: Vec<Certificate>,

    /// Opaque placeholder; no proof-of-work is computed or checked.
    pub proof: u64,

    /// Hash of the previous block, or the genesis sentinel.
    pub previous_hash: Link,

    /// Digest of all other fields.
    pub hash: Digest,
}

/// What happened when a certificate inside a block was revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revocation {
    /// The revoked certificate.
    pub cert_id: CertificateId,
    /// Index of the block holding it.
    pub block_index: u64,
    /// Block hash before the revocation.
    pub old_hash: Digest,
    /// Block hash after re-sealing.
    pub new_hash: Digest,
    /// Whether the certificate was already revoked (the call was a no-op).
    pub already_revoked: bool,
}

impl Revocation {
    /// Check if the block's hash changed.
    pub fn hash_changed(&self) -> bool {
        self.old_hash != self.new_hash
    }
}

impl Block {
    /// Build a block and compute its hash.
    pub fn seal(
        index: u64,
        timestamp: i64,
        certificates: Vec<Certificate>,
        proof: u64,
        previous_hash: Link,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp,
            certificates,
            proof,
            previous_hash,
            hash: Digest::ZERO,
        };
        block.hash = block.compute_hash();
        block
    }

    /// Compute the digest of this block's content, ignoring the stored hash.
    pub fn compute_hash(&self) -> Digest {
        digest_value(&block_content_value(self))
    }

    /// Check the stored hash against the content.
    pub fn has_valid_hash(&self) -> bool {
        self.compute_hash() == self.hash
    }

    /// Check whether this block correctly links to `prev`.
    pub fn links_to(&self, prev: &Block) -> bool {
        self.previous_hash == Link::Block(prev.hash)
    }

    /// Check if this block links to the genesis sentinel.
    pub fn is_genesis(&self) -> bool {
        self.previous_hash.is_genesis()
    }

    /// Number of certificates.
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    /// Check if the block holds no certificates.
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// Find a certificate by id.
    pub fn find(&self, id: &CertificateId) -> Option<&Certificate> {
        self.certificates.iter().find(|c| &c.cert_id == id)
    }

    /// Revoke a certificate in place and re-seal this block's hash.
    ///
    /// Only this block's `hash` is rewritten. `previous_hash` and `index` are
    /// untouched, and so is every later block in a chain: a successor still
    /// carries the old hash in its `previous_hash`, so revoking anywhere but
    /// the last block breaks the chain link from that point on.
    ///
    /// Returns `None` if the certificate is not in this block.
    pub fn revoke(&mut self, id: &CertificateId) -> Option<Revocation> {
        let cert = self.certificates.iter_mut().find(|c| &c.cert_id == id)?;
        let already_revoked = !cert.revoke();

        let old_hash = self.hash;
        self.hash = self.compute_hash();

        Some(Revocation {
            cert_id: *id,
            block_index: self.index,
            old_hash,
            new_hash: self.hash,
            already_revoked,
        })
    }
}
