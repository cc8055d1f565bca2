//! Canonical CBOR encoding for deterministic hashing.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison, at every nesting level
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - Floats always as 64-bit IEEE 754 (NaN normalized)
//!
//! The canonical encoding is load-bearing: a block's hash is recomputed during
//! verification and after revocation from a value tree assembled by a
//! different code path than the one that sealed it, and both must produce the
//! same bytes. Because keys are sorted here, field order at construction time
//! never matters.
//!
//! The persisted form of a block is its canonical encoding *including* the
//! `hash` entry; stripping that entry yields exactly the bytes that were hashed.

use ciborium::value::Value;
use serde::Serialize;

use crate::block::Block;
use crate::certificate::Certificate;
use crate::crypto::Digest;
use crate::error::CoreError;

/// Field keys. Identical to the serde field names of [`Certificate`] and
/// [`Block`], so the serde path and the direct path encode the same map.
pub(crate) mod keys {
    pub const CERT_ID: &str = "cert_id";
    pub const HOLDER: &str = "holder";
    pub const PROGRAM: &str = "program";
    pub const ISSUER: &str = "issuer";
    pub const METADATA: &str = "metadata";
    pub const ISSUED_AT: &str = "issued_at";
    pub const REVOKED: &str = "revoked";

    pub const INDEX: &str = "index";
    pub const TIMESTAMP: &str = "timestamp";
    pub const CERTIFICATES: &str = "certificates";
    pub const PROOF: &str = "proof";
    pub const PREVIOUS_HASH: &str = "previous_hash";
    pub const HASH: &str = "hash";
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

/// The founding fields of a certificate, from which its id is derived.
pub(crate) fn certificate_identity_value(
    holder: &str,
    program: &str,
    issuer: &str,
    issued_at: i64,
    metadata: &str,
) -> Value {
    Value::Map(vec![
        (text(keys::HOLDER), text(holder)),
        (text(keys::PROGRAM), text(program)),
        (text(keys::ISSUER), text(issuer)),
        (text(keys::ISSUED_AT), Value::Integer(issued_at.into())),
        (text(keys::METADATA), text(metadata)),
    ])
}

/// Convert a certificate to a CBOR Value (map with text keys).
pub(crate) fn certificate_to_value(cert: &Certificate) -> Value {
    Value::Map(vec![
        (text(keys::CERT_ID), text(&cert.cert_id.to_hex())),
        (text(keys::HOLDER), text(&cert.holder)),
        (text(keys::PROGRAM), text(&cert.program)),
        (text(keys::ISSUER), text(&cert.issuer)),
        (text(keys::METADATA), text(&cert.metadata)),
        (text(keys::ISSUED_AT), Value::Integer(cert.issued_at.into())),
        (text(keys::REVOKED), Value::Bool(cert.revoked)),
    ])
}

/// Convert a block to a CBOR Value, excluding its own hash.
pub(crate) fn block_content_value(block: &Block) -> Value {
    Value::Map(block_content_entries(block))
}

fn block_content_entries(block: &Block) -> Vec<(Value, Value)> {
    let certificates = block.certificates.iter().map(certificate_to_value).collect();

    vec![
        (text(keys::INDEX), Value::Integer(block.index.into())),
        (text(keys::TIMESTAMP), Value::Integer(block.timestamp.into())),
        (text(keys::CERTIFICATES), Value::Array(certificates)),
        (text(keys::PROOF), Value::Integer(block.proof.into())),
        (
            text(keys::PREVIOUS_HASH),
            text(&block.previous_hash.to_hash_string()),
        ),
    ]
}

/// Canonical bytes of a certificate's founding fields.
///
/// The certificate id is the digest of exactly these bytes.
pub fn certificate_identity_bytes(
    holder: &str,
    program: &str,
    issuer: &str,
    issued_at: i64,
    metadata: &str,
) -> Vec<u8> {
    canonical_value_bytes(&certificate_identity_value(
        holder, program, issuer, issued_at, metadata,
    ))
}

/// Encode a certificate to canonical bytes.
pub fn canonical_certificate_bytes(cert: &Certificate) -> Vec<u8> {
    canonical_value_bytes(&certificate_to_value(cert))
}

/// Encode an entire block, hash included, to canonical bytes.
///
/// This is the persisted form of a block.
pub fn canonical_block_bytes(block: &Block) -> Vec<u8> {
    let mut entries = block_content_entries(block);
    entries.push((text(keys::HASH), text(&block.hash.to_hex())));
    canonical_value_bytes(&Value::Map(entries))
}

/// Digest of an arbitrary CBOR value tree.
pub fn digest_value(value: &Value) -> Digest {
    Digest::hash(&canonical_value_bytes(value))
}

/// Digest of any serializable value.
///
/// The value is first converted to a CBOR value tree, then encoded
/// canonically, so struct field order and map insertion order do not matter.
pub fn digest_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Digest, CoreError> {
    let value = Value::serialized(value).map_err(|e| CoreError::EncodingError(e.to_string()))?;
    Ok(digest_value(&value))
}

/// Decode a block from its persisted canonical bytes.
///
/// Rejects input that decodes but is not in canonical form, since such bytes
/// could never have been produced by [`canonical_block_bytes`].
pub fn decode_block(bytes: &[u8]) -> Result<Block, CoreError> {
    let block: Block =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    if canonical_block_bytes(&block) != bytes {
        return Err(CoreError::MalformedBlock("non-canonical encoding".into()));
    }
    Ok(block)
}

/// Decode a certificate from its canonical bytes.
pub fn decode_certificate(bytes: &[u8]) -> Result<Certificate, CoreError> {
    let cert: Certificate =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    if canonical_certificate_bytes(&cert) != bytes {
        return Err(CoreError::MalformedCertificate("non-canonical encoding".into()));
    }
    Ok(cert)
}

/// Encode a CBOR Value to canonical bytes.
pub fn canonical_value_bytes(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => encode_array(buf, arr),
        Value::Map(entries) => encode_map_canonical(buf, entries),
        Value::Tag(tag, inner) => {
            encode_uint(buf, 6, *tag);
            encode_value_to(buf, inner);
        }
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Float(f) => encode_float(buf, *f),
        // `Value` is non-exhaustive; anything newer encodes as `undefined`.
        _ => buf.push(0xf7),
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a float as a 64-bit IEEE 754 double (major type 7).
fn encode_float(buf: &mut Vec<u8>, f: f64) {
    let f = if f.is_nan() { f64::NAN } else { f };
    buf.push(0xfb);
    buf.extend_from_slice(&f.to_bits().to_be_bytes());
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode an array (major type 4). Element order is preserved.
fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item);
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut key_value_pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, key_value_pairs.len() as u64);

    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}
