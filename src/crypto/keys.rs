//! ECDSA key management for Ethereum accounts
//!
//! Provides key pair generation, recoverable signing, and address
//! derivation using the secp256k1 elliptic curve.

use rand::rngs::OsRng;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;
use zeroize::Zeroizing;

use super::hash::keccak256;
use crate::core::Address;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A recoverable ECDSA signature split into its Ethereum components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSig {
    /// Recovery id (0 or 1)
    pub recovery_id: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

/// A key pair consisting of a private key and its corresponding public key
pub struct KeyPair {
    secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from raw secret key bytes
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Ok(Self {
            secret_key,
            public_key,
        })
    }

    /// Create a key pair from a hex-encoded private key (with or without `0x`)
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let trimmed = hex_key.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes =
            Zeroizing::new(hex::decode(digits).map_err(|_| KeyError::InvalidPrivateKey)?);
        if bytes.len() != 32 {
            return Err(KeyError::InvalidPrivateKey);
        }
        Self::from_secret_bytes(&bytes)
    }

    /// Raw secret key bytes, wiped when the returned buffer is dropped
    pub fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.secret_key.secret_bytes())
    }

    /// Get the private key as a lowercase hex string (no `0x` prefix)
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.secret_bytes().as_slice()))
    }

    /// Ethereum address of this key pair
    pub fn address(&self) -> Address {
        public_key_to_address(&self.public_key)
    }

    /// Sign a 32-byte digest, returning the recoverable signature
    pub fn sign_recoverable(&self, digest: &[u8; 32]) -> Result<RecoverableSig, KeyError> {
        let secp = Secp256k1::new();
        let message = Message::from_digest_slice(digest)?;
        let signature = secp.sign_ecdsa_recoverable(&message, &self.secret_key);
        let (recovery_id, compact) = signature.serialize_compact();

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[..32]);
        s.copy_from_slice(&compact[32..]);

        Ok(RecoverableSig {
            recovery_id: recovery_id.to_i32() as u8,
            r,
            s,
        })
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.secret_key.non_secure_erase();
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Derive the Ethereum address of a public key:
/// the last 20 bytes of Keccak-256 over the uncompressed point (without the 0x04 tag)
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    Address::from_bytes(bytes)
}

/// Recover the signer address of a digest from a recoverable signature
pub fn recover_address(digest: &[u8; 32], sig: &RecoverableSig) -> Result<Address, KeyError> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest)?;
    let recovery_id =
        RecoveryId::from_i32(sig.recovery_id as i32).map_err(|_| KeyError::InvalidSignature)?;

    let mut compact = [0u8; 64];
    compact[..32].copy_from_slice(&sig.r);
    compact[32..].copy_from_slice(&sig.s);
    let signature = RecoverableSignature::from_compact(&compact, recovery_id)
        .map_err(|_| KeyError::InvalidSignature)?;

    let public_key = secp.recover_ecdsa(&message, &signature)?;
    Ok(public_key_to_address(&public_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert_eq!(kp.private_key_hex().len(), 64);
        assert_eq!(kp.address().to_string().len(), 42);
    }

    #[test]
    fn test_known_address() {
        // Private key 1 maps to a well-known address
        let kp = KeyPair::from_private_key_hex(
            "0000000000000000000000000000000000000000000000000000000000000001",
        )
        .unwrap();
        assert_eq!(
            kp.address().to_string(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_key_pair_from_hex() {
        let kp1 = KeyPair::generate();
        let private_hex = kp1.private_key_hex();

        let kp2 = KeyPair::from_private_key_hex(&format!("0x{}", private_hex.as_str())).unwrap();
        assert_eq!(kp1.address(), kp2.address());
    }

    #[test]
    fn test_invalid_private_key() {
        assert!(KeyPair::from_private_key_hex("zz").is_err());
        assert!(KeyPair::from_private_key_hex("abcd").is_err());
        assert!(KeyPair::from_private_key_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn test_sign_and_recover() {
        let kp = KeyPair::generate();
        let digest = keccak256(b"Hello, custody!");

        let sig = kp.sign_recoverable(&digest).unwrap();
        assert!(sig.recovery_id <= 1);
        assert_eq!(recover_address(&digest, &sig).unwrap(), kp.address());
    }
}
