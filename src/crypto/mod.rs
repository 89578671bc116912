//! Cryptographic utilities
//!
//! This module provides:
//! - Keccak-256 hashing
//! - ECDSA key management (secp256k1) with Ethereum address derivation

pub mod hash;
pub mod keys;

pub use hash::keccak256;
pub use keys::{public_key_to_address, recover_address, KeyError, KeyPair, RecoverableSig};
