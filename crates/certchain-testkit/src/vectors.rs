//! Golden test vectors for deterministic verification.
//!
//! These pin the canonical encoding and the Blake3 digests of certificates
//! and blocks, so any implementation (or any change to this one) that drifts
//! from the wire format is caught.

use serde::Serialize;

use certchain_core::{
    certificate_identity_bytes, Block, Certificate, CertificateBuilder, Digest, Link,
};

/// A golden certificate vector.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub holder: &'static str,
    pub program: &'static str,
    pub issuer: &'static str,
    pub metadata: &'static str,
    /// Issuance time (Unix microseconds).
    pub issued_at: i64,
    /// Canonical CBOR of the founding fields (hex).
    pub expected_identity_bytes: &'static str,
    /// Expected certificate id (hex).
    pub expected_cert_id: &'static str,
}

/// Get all certificate vectors.
pub fn certificate_vectors() -> Vec<CertificateVector> {
    vec![
        CertificateVector {
            name: "typical certificate",
            holder: "Alice",
            program: "Physics",
            issuer: "ETH Zurich",
            metadata: "grade: 6.0",
            issued_at: 1_736_870_400_000_000,
            expected_identity_bytes: "a566686f6c64657265416c696365666973737565726a455448205a75726963686770726f6772616d6750687973696373686d657461646174616a67726164653a20362e30696973737565645f61741b00062baca7368000",
            expected_cert_id: "616b61499d5021b0b0a8dfba71bc52f63ed21edc894b693ae5153293a210614b",
        },
        CertificateVector {
            name: "padded holder is hashed verbatim",
            holder: "  alice  ",
            program: "Physics",
            issuer: "ETH Zurich",
            metadata: "",
            issued_at: 1_736_870_400_000_001,
            expected_identity_bytes: "a566686f6c646572692020616c6963652020666973737565726a455448205a75726963686770726f6772616d6750687973696373686d6574616461746160696973737565645f61741b00062baca7368001",
            expected_cert_id: "49daffb7d90ed53e2e10d999ee72352059a3420b81670f40588d1fa003a738ff",
        },
        CertificateVector {
            name: "all fields empty",
            holder: "",
            program: "",
            issuer: "",
            metadata: "",
            issued_at: 0,
            expected_identity_bytes: "a566686f6c6465726066697373756572606770726f6772616d60686d6574616461746160696973737565645f617400",
            expected_cert_id: "6a56a30f7084c3e68c8327721a71a94a3b79ed517396d6980f8336c984eae7dc",
        },
        CertificateVector {
            name: "non-ascii text and negative time",
            holder: "Zoë",
            program: "Études",
            issuer: "Université",
            metadata: "",
            issued_at: -1,
            expected_identity_bytes: "a566686f6c646572645a6fc3ab666973737565726b556e69766572736974c3a96770726f6772616d67c3897475646573686d6574616461746160696973737565645f617420",
            expected_cert_id: "e871bdceaec317e898cce566ff0943914384c6fd449ef473da5b956f418d433f",
        },
    ]
}

/// Build the certificate described by a vector.
pub fn certificate_from_vector(vector: &CertificateVector) -> Certificate {
    CertificateBuilder::new(vector.holder, vector.program, vector.issuer)
        .metadata(vector.metadata)
        .issued_at(vector.issued_at)
        .build()
}

/// Expected hashes for the reference chain built by [`reference_chain`].
#[derive(Debug, Clone, Serialize)]
pub struct ChainVector {
    /// Hash of the empty genesis block.
    pub genesis_hash: &'static str,
    /// Id of the second certificate in block 2.
    pub bob_cert_id: &'static str,
    /// Hash of block 2.
    pub block_hash: &'static str,
    /// Hash of block 2 after revoking its first certificate.
    pub revoked_block_hash: &'static str,
}

/// The reference chain's expected hashes.
pub fn chain_vector() -> ChainVector {
    ChainVector {
        genesis_hash: "79936decfc8de52eefbabd69f65eefe54d7646f1d18c29bb8b6e4a2b7abc1324",
        bob_cert_id: "8e80376dc8a06da3700752ef0b81c17ceb366f5b688f6fafd7ade750f49aac0c",
        block_hash: "3080054bf631749f91a4a7fb177213e0c9845626226868d4c305be6ee12b3393",
        revoked_block_hash: "b8eead4ce46f14674a6d59ee4c70f98bf5cdec00339814df8b496d7a72d4b9b9",
    }
}

/// Build the two-block reference chain: an empty genesis block (proof 100),
/// then a block with the "typical certificate" vector and one for Bob.
pub fn reference_chain() -> Vec<Block> {
    let genesis = Block::seal(1, 1_736_870_400_000_000, vec![], 100, Link::Genesis);

    let alice = certificate_from_vector(&certificate_vectors()[0]);
    let bob = CertificateBuilder::new("Bob", "Chemistry", "MIT")
        .issued_at(1_736_870_400_000_002)
        .build();

    let block = Block::seal(
        2,
        1_736_870_460_000_000,
        vec![alice, bob],
        123,
        Link::Block(genesis.hash),
    );

    vec![genesis, block]
}

/// Check every vector; returns `(name, matches, computed)` per check.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let mut results: Vec<(String, bool, String)> = certificate_vectors()
        .iter()
        .flat_map(|v| {
            let bytes = hex::encode(certificate_identity_bytes(
                v.holder,
                v.program,
                v.issuer,
                v.issued_at,
                v.metadata,
            ));
            let id = certificate_from_vector(v).cert_id.to_hex();

            [
                (
                    format!("{} (identity bytes)", v.name),
                    bytes == v.expected_identity_bytes,
                    bytes,
                ),
                (format!("{} (cert id)", v.name), id == v.expected_cert_id, id),
            ]
        })
        .collect();

    let expected = chain_vector();
    let mut chain = reference_chain();
    let alice_id = chain[1].certificates[0].cert_id;

    let mut push = |name: &str, computed: &Digest, want: &str| {
        let hex = computed.to_hex();
        results.push((name.to_string(), hex == want, hex));
    };
    push("genesis block", &chain[0].hash, expected.genesis_hash);
    push("bob cert id", chain[1].certificates[1].cert_id.digest(), expected.bob_cert_id);
    push("block 2", &chain[1].hash, expected.block_hash);

    if let Some(revocation) = chain[1].revoke(&alice_id) {
        push("block 2 revoked", &revocation.new_hash, expected.revoked_block_hash);
    }

    results
}

/// All vectors as pretty JSON, for sharing with other implementations.
pub fn vectors_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({
        "certificates": certificate_vectors(),
        "chain": chain_vector(),
    }))
}
