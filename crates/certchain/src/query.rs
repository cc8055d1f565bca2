//! Read-only lookups over a ledger.
//!
//! Sealed blocks are searched in chain order, then the pending buffer.
//! Results are always copies.

use serde::{Deserialize, Serialize};

use certchain_core::{normalize_holder, Certificate, CertificateId};

use crate::ledger::Ledger;

/// Outcome of checking a certificate id against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificateStatus {
    /// Present and not revoked.
    Valid,
    /// Present and revoked.
    Revoked,
    /// Unknown id, or not a well-formed id at all.
    NotFound,
}

impl Ledger {
    fn all_certificates(&self) -> impl Iterator<Item = &Certificate> + '_ {
        self.blocks()
            .iter()
            .flat_map(|b| b.certificates.iter())
            .chain(self.pending().iter())
    }

    /// Find a certificate by its hex id.
    ///
    /// Ids that do not parse as a digest are simply not found.
    pub fn find_certificate(&self, cert_id: &str) -> Option<Certificate> {
        let id = cert_id.trim().parse::<CertificateId>().ok()?;
        self.find_by_id(&id)
    }

    /// Find a certificate by its typed id.
    pub fn find_by_id(&self, id: &CertificateId) -> Option<Certificate> {
        let found = self.all_certificates().find(|c| &c.cert_id == id).cloned();
        tracing::debug!(cert_id = %id, found = found.is_some(), "certificate lookup");
        found
    }

    /// All certificates whose holder equals `name`, trimmed and case-insensitive.
    pub fn find_by_holder(&self, name: &str) -> Vec<Certificate> {
        let wanted = normalize_holder(name);
        let matches: Vec<Certificate> = self
            .all_certificates()
            .filter(|c| normalize_holder(&c.holder) == wanted)
            .cloned()
            .collect();
        tracing::debug!(holder = %wanted, matches = matches.len(), "holder lookup");
        matches
    }

    /// Check whether a certificate is valid, revoked, or unknown.
    pub fn status(&self, cert_id: &str) -> CertificateStatus {
        match self.find_certificate(cert_id) {
            Some(cert) if cert.is_revoked() => CertificateStatus::Revoked,
            Some(_) => CertificateStatus::Valid,
            None => CertificateStatus::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_sealed_and_pending() {
        let mut ledger = Ledger::default();
        let sealed = ledger.submit("Alice", "Math", "MIT", "").unwrap();
        ledger.seal(1);
        let pending = ledger.submit("Bob", "Art", "RISD", "").unwrap();

        let a = ledger.find_certificate(&sealed.to_hex()).unwrap();
        assert_eq!(a.holder, "Alice");
        let b = ledger.find_certificate(&pending.to_hex()).unwrap();
        assert_eq!(b.holder, "Bob");
    }

    #[test]
    fn test_find_tolerates_whitespace_and_rejects_garbage() {
        let mut ledger = Ledger::default();
        let id = ledger.submit("Alice", "Math", "MIT", "").unwrap();

        assert!(ledger.find_certificate(&format!("  {}\n", id)).is_some());
        assert!(ledger.find_certificate("xyz").is_none());
        assert!(ledger.find_certificate("").is_none());
        assert!(ledger.find_certificate(&"00".repeat(32)).is_none());
    }

    #[test]
    fn test_find_returns_copy() {
        let mut ledger = Ledger::default();
        let id = ledger.submit("Alice", "Math", "MIT", "").unwrap();
        ledger.seal(1);

        let mut copy = ledger.find_by_id(&id).unwrap();
        copy.revoked = true;
        assert!(!ledger.find_by_id(&id).unwrap().is_revoked());
    }

    #[test]
    fn test_find_by_holder_normalizes() {
        let mut ledger = Ledger::default();
        ledger.submit("  alice  ", "Math", "MIT", "").unwrap();
        ledger.seal(1);
        ledger.submit("ALICE", "Art", "RISD", "").unwrap();
        ledger.submit("Bob", "Art", "RISD", "").unwrap();

        let found = ledger.find_by_holder("Alice");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].program, "Math");
        assert_eq!(found[1].program, "Art");

        assert!(ledger.find_by_holder("Carol").is_empty());
    }

    #[test]
    fn test_status() {
        let mut ledger = Ledger::default();
        let id = ledger.submit("Alice", "Math", "MIT", "").unwrap();
        assert_eq!(ledger.status(&id.to_hex()), CertificateStatus::Valid);

        ledger.seal(1);
        ledger.revoke(&id.to_hex());
        assert_eq!(ledger.status(&id.to_hex()), CertificateStatus::Revoked);
        assert_eq!(ledger.status("nope"), CertificateStatus::NotFound);
    }
}
