//! Strong type definitions for Certchain.
//!
//! Identifiers and links are newtypes so a certificate id can never be passed
//! where a block hash is expected.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::crypto::Digest;
use crate::error::CoreError;

/// Reserved `previous_hash` value of the first block.
///
/// It is not a valid hex digest, so it can never collide with a real hash.
pub const GENESIS_SENTINEL: &str = "1";

/// A certificate identifier: Blake3 of the certificate's founding fields.
///
/// Two certificates with the same holder, program, issuer, metadata and
/// issuance time have the same id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateId(pub Digest);

impl CertificateId {
    /// Create a new CertificateId from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(Digest::from_bytes(bytes))
    }

    /// Get the underlying digest.
    pub const fn digest(&self) -> &Digest {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        Digest::from_hex(s).map(Self)
    }
}

impl fmt::Debug for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CertificateId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for CertificateId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_hex(s)?)
    }
}

impl From<Digest> for CertificateId {
    fn from(digest: Digest) -> Self {
        Self(digest)
    }
}

/// A block's pointer to its predecessor.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Link {
    /// No predecessor; encoded as [`GENESIS_SENTINEL`].
    Genesis,
    /// Hash of the previous block.
    Block(Digest),
}

impl Link {
    /// Check if this is the genesis sentinel.
    pub fn is_genesis(&self) -> bool {
        matches!(self, Link::Genesis)
    }

    /// The linked digest, if any.
    pub fn digest(&self) -> Option<&Digest> {
        match self {
            Link::Genesis => None,
            Link::Block(d) => Some(d),
        }
    }

    /// The string form used in canonical encoding and display.
    pub fn to_hash_string(&self) -> String {
        match self {
            Link::Genesis => GENESIS_SENTINEL.to_string(),
            Link::Block(d) => d.to_hex(),
        }
    }

    /// Parse the string form.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if s == GENESIS_SENTINEL {
            return Ok(Link::Genesis);
        }
        Ok(Link::Block(Digest::from_hex(s)?))
    }
}

impl From<Digest> for Link {
    fn from(digest: Digest) -> Self {
        Link::Block(digest)
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Link::Genesis => write!(f, "Link::Genesis"),
            Link::Block(d) => write!(f, "Link({:?})", d),
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hash_string())
    }
}

impl Serialize for Link {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hash_string())
    }
}

impl<'de> Deserialize<'de> for Link {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Link::parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certificate_id_hex_roundtrip() {
        let id = CertificateId::from_bytes([0x42; 32]);
        let hex = id.to_hex();
        let recovered = CertificateId::from_hex(&hex).unwrap();
        assert_eq!(id, recovered);
    }

    #[test]
    fn test_certificate_id_debug() {
        let id = CertificateId::from_bytes([0xcd; 32]);
        let debug = format!("{:?}", id);
        assert_eq!(debug, "CertificateId(cdcdcdcdcdcdcdcd)");
    }

    #[test]
    fn test_link_string_forms() {
        assert_eq!(Link::Genesis.to_hash_string(), "1");
        assert_eq!(Link::parse("1").unwrap(), Link::Genesis);

        let digest = Digest::from_bytes([0x07; 32]);
        let link = Link::from(digest);
        assert_eq!(Link::parse(&link.to_hash_string()).unwrap(), link);
        assert_eq!(link.digest(), Some(&digest));
        assert!(Link::Genesis.digest().is_none());
    }

    #[test]
    fn test_link_rejects_garbage() {
        assert!(Link::parse("").is_err());
        assert!(Link::parse("0").is_err());
        assert!(Link::parse("not-a-hash").is_err());
    }
}
