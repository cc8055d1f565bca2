//! Error types for the ledger.

use certchain_core::{CoreError, ValidationError};
use certchain_store::StoreError;
use thiserror::Error;

/// Errors that can occur during ledger operations.
///
/// A lookup that finds nothing is never an error, and neither is a chain that
/// fails verification; both are ordinary return values.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A required certificate field was empty.
    #[error("invalid input: {field} must not be empty")]
    InvalidInput { field: &'static str },

    /// Persisted blocks do not form a well-shaped chain.
    #[error("corrupt chain: {0}")]
    CorruptChain(#[from] ValidationError),

    /// Encoding or decoding error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
