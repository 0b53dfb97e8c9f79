//! SHA-256 helpers for block identity, proof-of-work and the difficulty predicate.

use crate::constants::MAX_DIFFICULTY;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_ref());
    hex::encode(hasher.finalize())
}

/// Identity hash of a block: the fields in their string forms, concatenated in header order.
pub fn identity_hash(
    height: u32,
    timestamp: i64,
    parent_hash: &str,
    size: u32,
    value: &str,
) -> String {
    sha256_hex(format!("{height}{timestamp}{parent_hash}{size}{value}"))
}

/// Proof-of-work hash. Only the parent link, nonce and payload take part.
pub fn proof_hash(parent_hash: &str, nonce: u64, value: &str) -> String {
    sha256_hex(format!("{parent_hash}{nonce}{value}"))
}

/// True when `hash` begins with `difficulty` `'0'` characters.
///
/// A difficulty above [`MAX_DIFFICULTY`] can never be met.
pub fn check_hash(difficulty: usize, hash: &str) -> bool {
    if difficulty > MAX_DIFFICULTY {
        return false;
    }
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}
