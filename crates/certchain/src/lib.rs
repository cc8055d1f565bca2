//! # Certchain
//!
//! An append-only, hash-linked ledger of certificates.
//!
//! ## Overview
//!
//! Certificates are submitted into a pending buffer and sealed into blocks.
//! Each block commits to the hash of its predecessor, so any edit to a sealed
//! block is caught by [`Ledger::verify`].
//!
//! - **Certificate**: content-addressed by its founding fields. Only the
//!   revoked flag ever changes.
//! - **Block**: a batch of certificates plus a link to the previous block.
//! - **Ledger**: the chain (genesis first) and the pending buffer.
//! - **Registry**: a ledger behind an async mutex, written through to a store.
//!
//! ## Usage
//!
//! ```rust
//! use certchain::{Ledger, LedgerConfig};
//!
//! let mut ledger = Ledger::new(LedgerConfig::default());
//! let id = ledger.submit("Alice", "Physics", "ETH Zurich", "grade: 6.0").unwrap();
//! ledger.seal(123);
//!
//! assert!(ledger.verify());
//! assert_eq!(ledger.find_by_holder("  alice ").len(), 1);
//! assert!(ledger.revoke(&id.to_hex()));
//! ```
//!
//! ## Revocation
//!
//! Revocation re-hashes the containing block in place and leaves later
//! blocks alone. Revoking anywhere but the last block therefore makes
//! `verify()` report a broken link at the following block.
//!
//! ## Re-exports
//!
//! - `certchain::core` - Core primitives (Certificate, Block, Digest, etc.)
//! - `certchain::store` - Storage abstraction and SQLite

pub mod error;
pub mod ledger;
pub mod query;
pub mod registry;
pub mod view;

// Re-export component crates
pub use certchain_core as core;
pub use certchain_store as store;

// Re-export main types for convenience
pub use error::{LedgerError, Result};
pub use ledger::{AutoSeal, Issued, Ledger, LedgerConfig, GENESIS_PROOF};
pub use query::CertificateStatus;
pub use registry::Registry;
pub use view::{pretty, ToPrettyJson};

// Re-export commonly used core types
pub use certchain_core::{
    Block, Certificate, CertificateBuilder, CertificateId, ChainHealth, Digest, Link, Revocation,
    GENESIS_SENTINEL,
};
