//! # Certchain Core
//!
//! Pure primitives for Certchain: certificates, blocks, and canonicalization.
//!
//! This crate contains no I/O, no storage, no clocks. It is pure computation
//! over hash-linked data structures.
//!
//! ## Key Types
//!
//! - [`Certificate`] - A content-addressed certificate record
//! - [`CertificateId`] - Blake3 digest of a certificate's founding fields
//! - [`Block`] - A sealed, hash-linked batch of certificates
//! - [`Link`] - A block's pointer to its predecessor (or the genesis sentinel)
//! - [`ChainHealth`] - Outcome of walking a chain for integrity violations
//!
//! ## Canonicalization
//!
//! Everything that gets hashed is encoded as deterministic CBOR first, with
//! map keys sorted at every level. See the [`canonical`] module.

pub mod block;
pub mod canonical;
pub mod certificate;
pub mod crypto;
pub mod error;
pub mod types;
pub mod validation;

pub use block::{Block, Revocation};
pub use canonical::{
    canonical_block_bytes, canonical_certificate_bytes, canonical_value_bytes,
    certificate_identity_bytes, decode_block, decode_certificate, digest_serialize, digest_value,
};
pub use certificate::{normalize_holder, Certificate, CertificateBuilder};
pub use crypto::Digest;
pub use error::{CoreError, ValidationError};
pub use types::{CertificateId, Link, GENESIS_SENTINEL};
pub use validation::{validate_chain_structure, verify_chain, ChainHealth};
