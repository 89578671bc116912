//! Keccak-256 hashing
//!
//! Ethereum uses the original Keccak padding (not FIPS-202 SHA3-256) for
//! address derivation and transaction hashes.

use sha3::{Digest, Keccak256};

/// Computes Keccak-256 of the input data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}
