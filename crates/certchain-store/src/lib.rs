//! # Certchain Store
//!
//! Storage abstraction for Certchain ledgers. Provides a trait-based interface
//! for persisting sealed blocks and the pending buffer, with SQLite and
//! in-memory implementations.
//!
//! ## Overview
//!
//! The ledger itself is in-memory. A store only keeps a durable copy of its
//! state so a ledger can be restored later. Blocks are persisted in their
//! canonical form: the exact bytes that were hashed, plus the hash entry.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`PutResult`] - Result of writing a block
//!
//! ## Usage
//!
//! ```rust,no_run
//! use certchain_store::{SqliteStore, Store};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("ledger.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let blocks = store.load_chain().await.unwrap();
//!     println!("{} blocks on disk", blocks.len());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Positional writes**: Blocks are keyed by index. Writing identical bytes
//!   is `Unchanged`; writing different bytes at an existing index (a revoked
//!   block re-sealed in place) is `Replaced`.
//! - **Pending is rewritten whole**: the pending buffer is small and is
//!   replaced in one transaction on every change.
//! - **Sealing is one write**: [`Store::commit_seal`] stores a new block and
//!   the pending buffer left behind in a single transaction.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{PutResult, Store, StoreExt};
