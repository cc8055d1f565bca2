//! Certificate: a content-addressed record of an issued credential.
//!
//! A certificate's id is derived from its founding fields at creation time.
//! Those fields never change afterwards; the only state transition is the
//! revoked flag going from false to true.

use serde::{Deserialize, Serialize};

use crate::canonical::{certificate_identity_value, digest_value};
use crate::types::CertificateId;

/// A single certificate entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Certificate {
    /// Digest of (holder, program, issuer, issued_at, metadata).
    pub cert_id: CertificateId,

    /// Name of the certificate holder, stored verbatim.
    pub holder: String,

    /// Program or course label.
    pub program: String,

    /// Issuing authority.
    pub issuer: String,

    /// Free-form metadata (grade, remarks, external links). May be empty.
    pub metadata: String,

    /// Issuance time (Unix microseconds).
    pub issued_at: i64,

    /// Whether the certificate has been revoked.
    pub revoked: bool,
}

impl Certificate {
    /// Derive a certificate id from founding fields.
    pub fn derive_id(
        holder: &str,
        program: &str,
        issuer: &str,
        issued_at: i64,
        metadata: &str,
    ) -> CertificateId {
        let value = certificate_identity_value(holder, program, issuer, issued_at, metadata);
        CertificateId(digest_value(&value))
    }

    /// Recompute the id from this certificate's current fields.
    pub fn compute_id(&self) -> CertificateId {
        Self::derive_id(
            &self.holder,
            &self.program,
            &self.issuer,
            self.issued_at,
            &self.metadata,
        )
    }

    /// Check the stored id against the founding fields.
    pub fn has_valid_id(&self) -> bool {
        self.compute_id() == self.cert_id
    }

    /// Check if this certificate has been revoked.
    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    /// Mark as revoked.
    ///
    /// Returns `true` if this call changed the flag, `false` if the
    /// certificate was already revoked.
    pub fn revoke(&mut self) -> bool {
        let changed = !self.revoked;
        self.revoked = true;
        changed
    }

    /// Trimmed, case-insensitive comparison against the holder name.
    pub fn holder_matches(&self, name: &str) -> bool {
        normalize_holder(&self.holder) == normalize_holder(name)
    }
}

/// Normalize a holder name for lookup: trimmed and lowercased.
pub fn normalize_holder(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Builder for creating certificates.
pub struct CertificateBuilder {
    holder: String,
    program: String,
    issuer: String,
    metadata: String,
    issued_at: i64,
}

impl CertificateBuilder {
    /// Start building a certificate.
    pub fn new(
        holder: impl Into<String>,
        program: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            holder: holder.into(),
            program: program.into(),
            issuer: issuer.into(),
            metadata: String::new(),
            issued_at: 0,
        }
    }

    /// Set the metadata.
    pub fn metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = metadata.into();
        self
    }

    /// Set the issuance time (Unix microseconds).
    pub fn issued_at(mut self, ts: i64) -> Self {
        self.issued_at = ts;
        self
    }

    /// Derive the id and build the certificate.
    pub fn build(self) -> Certificate {
        let cert_id = Certificate::derive_id(
            &self.holder,
            &self.program,
            &self.issuer,
            self.issued_at,
            &self.metadata,
        );

        Certificate {
            cert_id,
            holder: self.holder,
            program: self.program,
            issuer: self.issuer,
            metadata: self.metadata,
            issued_at: self.issued_at,
            revoked: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Certificate {
        CertificateBuilder::new("Grace Hopper", "Compilers", "Yale")
            .metadata("grade: A+")
            .issued_at(1_736_870_400_000_000)
            .build()
    }

    #[test]
    fn test_builder_derives_id() {
        let cert = sample();
        assert!(cert.has_valid_id());
        assert!(!cert.is_revoked());
        assert_eq!(cert.cert_id.to_hex().len(), 64);
    }

    #[test]
    fn test_id_deterministic() {
        assert_eq!(sample().cert_id, sample().cert_id);
    }

    #[test]
    fn test_id_depends_on_every_founding_field() {
        let base = sample();
        let variants = [
            CertificateBuilder::new("Grace  Hopper", "Compilers", "Yale")
                .metadata("grade: A+")
                .issued_at(1_736_870_400_000_000)
                .build(),
            CertificateBuilder::new("Grace Hopper", "Compiler", "Yale")
                .metadata("grade: A+")
                .issued_at(1_736_870_400_000_000)
                .build(),
            CertificateBuilder::new("Grace Hopper", "Compilers", "Harvard")
                .metadata("grade: A+")
                .issued_at(1_736_870_400_000_000)
                .build(),
            CertificateBuilder::new("Grace Hopper", "Compilers", "Yale")
                .metadata("grade: A")
                .issued_at(1_736_870_400_000_000)
                .build(),
            CertificateBuilder::new("Grace Hopper", "Compilers", "Yale")
                .metadata("grade: A+")
                .issued_at(1_736_870_400_000_001)
                .build(),
        ];

        for v in variants {
            assert_ne!(v.cert_id, base.cert_id);
        }
    }

    #[test]
    fn test_revoked_flag_not_part_of_id() {
        let mut cert = sample();
        let id = cert.cert_id;
        assert!(cert.revoke());
        assert_eq!(cert.compute_id(), id);
        assert!(cert.has_valid_id());
    }

    #[test]
    fn test_revoke_twice_is_noop() {
        let mut cert = sample();
        assert!(cert.revoke());
        assert!(!cert.revoke());
        assert!(cert.is_revoked());
    }

    #[test]
    fn test_holder_matching() {
        let cert = CertificateBuilder::new("  alice  ", "Math", "MIT").build();
        assert!(cert.holder_matches("Alice"));
        assert!(cert.holder_matches("ALICE "));
        assert!(!cert.holder_matches("Alicia"));
    }

    #[test]
    fn test_tampered_field_invalidates_id() {
        let mut cert = sample();
        cert.program = "Forgery".into();
        assert!(!cert.has_valid_id());
    }
}
