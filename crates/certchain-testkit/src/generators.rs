//! Proptest generators for property-based testing.

use proptest::prelude::*;

use certchain::Ledger;
use certchain_core::{Certificate, CertificateBuilder, CertificateId, Digest};

/// Generate a random Digest.
pub fn digest() -> impl Strategy<Value = Digest> {
    any::<[u8; 32]>().prop_map(Digest::from_bytes)
}

/// Generate a random CertificateId.
pub fn certificate_id() -> impl Strategy<Value = CertificateId> {
    any::<[u8; 32]>().prop_map(CertificateId::from_bytes)
}

/// Generate a non-blank name, possibly padded with spaces.
pub fn name() -> impl Strategy<Value = String> {
    "[ ]{0,2}[A-Za-z][A-Za-z .'-]{0,23}[ ]{0,2}".prop_map(String::from)
}

/// Generate free-form metadata, including non-ASCII text.
pub fn metadata() -> impl Strategy<Value = String> {
    ".{0,48}".prop_map(String::from)
}

/// Generate a timestamp in Unix microseconds.
pub fn timestamp() -> impl Strategy<Value = i64> {
    prop_oneof![
        4 => 0i64..=4_102_444_800_000_000i64,
        1 => any::<i64>(),
    ]
}

/// Parameters for generating a certificate.
#[derive(Debug, Clone)]
pub struct CertificateParams {
    pub holder: String,
    pub program: String,
    pub issuer: String,
    pub metadata: String,
    pub issued_at: i64,
}

impl Arbitrary for CertificateParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (name(), name(), name(), metadata(), timestamp())
            .prop_map(|(holder, program, issuer, metadata, issued_at)| CertificateParams {
                holder,
                program,
                issuer,
                metadata,
                issued_at,
            })
            .boxed()
    }
}

/// Build a certificate from parameters.
pub fn certificate_from_params(params: &CertificateParams) -> Certificate {
    CertificateBuilder::new(&params.holder, &params.program, &params.issuer)
        .metadata(&params.metadata)
        .issued_at(params.issued_at)
        .build()
}

/// A single ledger operation.
#[derive(Debug, Clone)]
pub enum LedgerOp {
    Submit { holder: String, metadata: String },
    Seal { proof: u64 },
    /// Revoke the n-th certificate submitted so far (modulo the count).
    Revoke { nth: usize },
}

/// Generate a ledger operation.
pub fn ledger_op() -> impl Strategy<Value = LedgerOp> {
    prop_oneof![
        4 => (name(), metadata()).prop_map(|(holder, metadata)| LedgerOp::Submit { holder, metadata }),
        2 => any::<u64>().prop_map(|proof| LedgerOp::Seal { proof }),
        1 => any::<usize>().prop_map(|nth| LedgerOp::Revoke { nth }),
    ]
}

/// Generate a sequence of ledger operations.
pub fn ledger_ops(max_len: usize) -> impl Strategy<Value = Vec<LedgerOp>> {
    prop::collection::vec(ledger_op(), 0..=max_len)
}

/// Apply operations to a ledger; returns every submitted id in order.
pub fn apply_ops(ledger: &mut Ledger, ops: &[LedgerOp]) -> Vec<CertificateId> {
    let mut ids = Vec::new();

    for op in ops {
        match op {
            LedgerOp::Submit { holder, metadata } => {
                if let Ok(id) = ledger.submit(holder, "Program", "Issuer", metadata) {
                    ids.push(id);
                }
            }
            LedgerOp::Seal { proof } => {
                ledger.seal(*proof);
            }
            LedgerOp::Revoke { nth } => {
                if !ids.is_empty() {
                    ledger.revoke_certificate(&ids[nth % ids.len()]);
                }
            }
        }
    }

    ids
}
