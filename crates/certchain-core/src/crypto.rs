//! Blake3 digests with a strong type.
//!
//! Digests travel as 64-character lowercase hex strings everywhere outside
//! this module (serde, display, persisted form), so the serde impls below
//! are hand-written instead of derived.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A 32-byte Blake3 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// Length of the hex rendering.
    pub const HEX_LEN: usize = 64;

    /// Compute the Blake3 digest of the given data.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// The zero digest.
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blake3({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_hex(s)?)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake3_digest() {
        let data = b"test data";
        let h1 = Digest::hash(data);
        let h2 = Digest::hash(data);
        assert_eq!(h1, h2);

        let different = b"different data";
        let h3 = Digest::hash(different);
        assert_ne!(h1, h3);
    }

    #[test]
    fn test_digest_hex_roundtrip() {
        let digest = Digest::hash(b"certificate");
        let hex = digest.to_hex();
        assert_eq!(hex.len(), Digest::HEX_LEN);
        assert_eq!(Digest::from_hex(&hex).unwrap(), digest);
        assert_eq!(hex.parse::<Digest>().unwrap(), digest);
    }

    #[test]
    fn test_digest_rejects_wrong_length() {
        assert!(Digest::from_hex("abcd").is_err());
        assert!(Digest::from_hex("1").is_err());
        assert!("zz".repeat(32).parse::<Digest>().is_err());
    }

    #[test]
    fn test_digest_display_is_full_hex() {
        let digest = Digest::from_bytes([0xab; 32]);
        assert_eq!(format!("{}", digest), "ab".repeat(32));
        assert!(format!("{:?}", digest).starts_with("Blake3("));
    }

    #[test]
    fn test_digest_serde_as_hex_string() {
        let digest = Digest::from_bytes([0x01; 32]);
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));

        let back: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);
    }
}
