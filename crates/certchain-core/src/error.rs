//! Error types for Certchain Core.

use thiserror::Error;

/// Core errors that can occur while encoding, decoding or parsing.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("malformed block: {0}")]
    MalformedBlock(String),

    #[error("malformed certificate: {0}")]
    MalformedCertificate(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Structural errors in a sequence of blocks.
///
/// These are shape problems (wrong numbering, missing genesis), not integrity
/// violations. A chain whose hashes no longer line up is still structurally
/// sound; see [`crate::ChainHealth`] for that.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("chain has no blocks")]
    EmptyChain,

    #[error("invalid block index: expected {expected}, got {got}")]
    InvalidIndex { expected: u64, got: u64 },

    #[error("first block must link to the genesis sentinel")]
    MissingGenesisLink,

    #[error("block {index} links to the genesis sentinel but is not first")]
    MisplacedGenesisLink { index: u64 },

    #[error("certificate {cert_id} in block {index} does not match its founding fields")]
    CertificateIdMismatch { index: u64, cert_id: String },

    #[error("pending certificate {cert_id} does not match its founding fields")]
    PendingIdMismatch { cert_id: String },
}

impl From<hex::FromHexError> for CoreError {
    fn from(e: hex::FromHexError) -> Self {
        CoreError::InvalidDigest(e.to_string())
    }
}
