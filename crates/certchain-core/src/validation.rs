//! Chain validation: tamper detection and structural checks.

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::crypto::Digest;
use crate::error::ValidationError;
use crate::types::Link;

/// The integrity status of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainHealth {
    /// Every link and every recomputed hash matches.
    Healthy,

    /// A block's `previous_hash` does not equal its predecessor's hash.
    BrokenLink {
        /// Index of the block carrying the stale link.
        index: u64,
        /// The predecessor's stored hash.
        expected: Link,
        /// What the block points at.
        found: Link,
    },

    /// A block's stored hash does not match its recomputed content digest.
    HashMismatch {
        /// Index of the offending block.
        index: u64,
        /// The stored hash.
        stored: Digest,
        /// The recomputed hash.
        computed: Digest,
    },
}

impl ChainHealth {
    /// Check if the chain is healthy.
    pub fn is_healthy(&self) -> bool {
        matches!(self, ChainHealth::Healthy)
    }

    /// Index of the first invalid block, if any.
    pub fn invalid_at(&self) -> Option<u64> {
        match self {
            ChainHealth::Healthy => None,
            ChainHealth::BrokenLink { index, .. } | ChainHealth::HashMismatch { index, .. } => {
                Some(*index)
            }
        }
    }
}

/// Walk a chain and report the first integrity violation.
///
/// Starting from the second block, each block must link to its predecessor's
/// stored hash and its own stored hash must match its recomputed digest. The
/// link is checked first. The first block is only ever a predecessor; its own
/// hash is not recomputed. A chain with zero or one block is trivially healthy.
pub fn verify_chain(blocks: &[Block]) -> ChainHealth {
    for pair in blocks.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);

        if !curr.links_to(prev) {
            return ChainHealth::BrokenLink {
                index: curr.index,
                expected: Link::Block(prev.hash),
                found: curr.previous_hash,
            };
        }

        let computed = curr.compute_hash();
        if computed != curr.hash {
            return ChainHealth::HashMismatch {
                index: curr.index,
                stored: curr.hash,
                computed,
            };
        }
    }

    ChainHealth::Healthy
}

/// Check the shape of a chain without judging its integrity.
///
/// This performs:
/// - Non-empty check
/// - Contiguous 1-based indices
/// - Genesis sentinel on the first block only
/// - Every certificate id matches its founding fields
///
/// Hash links are deliberately not checked here: a chain that has seen a
/// revocation is legitimately unverifiable yet still well-formed.
pub fn validate_chain_structure(blocks: &[Block]) -> Result<(), ValidationError> {
    if blocks.is_empty() {
        return Err(ValidationError::EmptyChain);
    }

    for (pos, block) in blocks.iter().enumerate() {
        let expected = pos as u64 + 1;
        if block.index != expected {
            return Err(ValidationError::InvalidIndex {
                expected,
                got: block.index,
            });
        }

        match (pos, block.is_genesis()) {
            (0, false) => return Err(ValidationError::MissingGenesisLink),
            (p, true) if p > 0 => {
                return Err(ValidationError::MisplacedGenesisLink { index: block.index })
            }
            _ => {}
        }

        if let Some(cert) = block.certificates.iter().find(|c| !c.has_valid_id()) {
            return Err(ValidationError::CertificateIdMismatch {
                index: block.index,
                cert_id: cert.cert_id.to_hex(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::CertificateBuilder;

    fn chain(len: u64) -> Vec<Block> {
        let mut blocks: Vec<Block> = Vec::new();
        for i in 1..=len {
            let certs = (0..i)
                .map(|n| {
                    CertificateBuilder::new(format!("holder-{i}-{n}"), "CS", "Uni")
                        .issued_at(i as i64 * 1000 + n as i64)
                        .build()
                })
                .collect();
            let prev = blocks.last().map(|b| Link::Block(b.hash)).unwrap_or(Link::Genesis);
            blocks.push(Block::seal(i, i as i64 * 1000, certs, 100, prev));
        }
        blocks
    }

    #[test]
    fn test_empty_and_single_block_are_healthy() {
        assert!(verify_chain(&[]).is_healthy());
        assert!(verify_chain(&chain(1)).is_healthy());
    }

    #[test]
    fn test_appended_chain_is_healthy() {
        let blocks = chain(5);
        assert_eq!(verify_chain(&blocks), ChainHealth::Healthy);
        assert!(validate_chain_structure(&blocks).is_ok());
    }

    #[test]
    fn test_tampered_content_detected() {
        let mut blocks = chain(3);
        blocks[2].certificates[0].holder = "mallory".into();

        let health = verify_chain(&blocks);
        assert!(matches!(health, ChainHealth::HashMismatch { index: 3, .. }));
        assert_eq!(health.invalid_at(), Some(3));
    }

    #[test]
    fn test_rehashed_tamper_breaks_next_link() {
        let mut blocks = chain(4);
        blocks[1].proof = 999;
        blocks[1].hash = blocks[1].compute_hash();

        match verify_chain(&blocks) {
            ChainHealth::BrokenLink { index, expected, found } => {
                assert_eq!(index, 3);
                assert_eq!(expected, Link::Block(blocks[1].hash));
                assert_eq!(found, blocks[2].previous_hash);
            }
            other => panic!("expected broken link, got {other:?}"),
        }
    }

    #[test]
    fn test_genesis_hash_not_recomputed() {
        // Verification only recomputes from the second block onward.
        let mut blocks = chain(1);
        blocks[0].proof = 7;
        assert!(verify_chain(&blocks).is_healthy());
    }

    #[test]
    fn test_structure_rejects_bad_shapes() {
        assert!(matches!(
            validate_chain_structure(&[]),
            Err(ValidationError::EmptyChain)
        ));

        let mut gap = chain(3);
        gap.remove(1);
        assert!(matches!(
            validate_chain_structure(&gap),
            Err(ValidationError::InvalidIndex { expected: 2, got: 3 })
        ));

        let mut no_genesis = chain(2);
        no_genesis[0].previous_hash = Link::Block(Digest::hash(b"elsewhere"));
        assert!(matches!(
            validate_chain_structure(&no_genesis),
            Err(ValidationError::MissingGenesisLink)
        ));

        let mut late_genesis = chain(2);
        late_genesis[1].previous_hash = Link::Genesis;
        assert!(matches!(
            validate_chain_structure(&late_genesis),
            Err(ValidationError::MisplacedGenesisLink { index: 2 })
        ));

        let mut forged = chain(2);
        forged[1].certificates[0].issuer = "Diploma Mill".into();
        assert!(matches!(
            validate_chain_structure(&forged),
            Err(ValidationError::CertificateIdMismatch { index: 2, .. })
        ));
    }

    #[test]
    fn test_structure_ignores_broken_links() {
        let mut blocks = chain(3);
        let id = blocks[1].certificates[0].cert_id;
        blocks[1].revoke(&id);

        assert!(!verify_chain(&blocks).is_healthy());
        assert!(validate_chain_structure(&blocks).is_ok());
    }
}
