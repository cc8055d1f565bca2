//! # Certchain Testkit
//!
//! Testing utilities for Certchain.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known certificates and blocks with their expected
//!   canonical bytes and digests
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helpers for setting up ledgers and sample chains
//!
//! ## Golden Vectors
//!
//! ```rust
//! use certchain_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, computed) in verify_all_vectors() {
//!     assert!(matches, "{} drifted: {}", name, computed);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use certchain_testkit::generators::{certificate_from_params, CertificateParams};
//!
//! proptest! {
//!     #[test]
//!     fn id_is_deterministic(params: CertificateParams) {
//!         let c1 = certificate_from_params(&params);
//!         let c2 = certificate_from_params(&params);
//!         prop_assert_eq!(c1.cert_id, c2.cert_id);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use certchain_testkit::fixtures::TestFixture;
//!
//! let mut fixture = TestFixture::new();
//! let (ids, block) = fixture.issue_batch(&["Alice", "Bob"], 123);
//! assert_eq!(block.len(), ids.len());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{memory_registry, sample_chain, TestFixture};
pub use generators::{apply_ops, certificate_from_params, CertificateParams, LedgerOp};
pub use vectors::{certificate_vectors, reference_chain, verify_all_vectors, CertificateVector};
