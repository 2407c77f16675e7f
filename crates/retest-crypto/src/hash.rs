//! Keccak-256 hashing

use retest_primitives::H256;
use sha3::{Digest, Keccak256};

/// Compute Keccak-256 hash of the input data
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    H256::from_bytes(result.into())
}

/// Fingerprint of a source test definition.
///
/// `canonical` is the key-sorted compact serialization of the source document
/// as it was read from disk, before comments are stripped or anything is
/// injected.
pub fn source_hash(canonical: &str) -> H256 {
    keccak256(canonical.as_bytes())
}
