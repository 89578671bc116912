//! Encrypted keyfile format
//!
//! A secp256k1 secret key is sealed with a passphrase:
//! 1. Argon2id derives a 32-byte encryption key from the passphrase + random salt
//! 2. AES-256-GCM encrypts the secret key with a random nonce
//! 3. The result is stored as JSON with every parameter needed to decrypt it

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::KeystoreError;
use crate::core::Address;
use crate::crypto::KeyPair;

/// Keyfile format version
pub const KEYFILE_VERSION: u32 = 1;

const CIPHER_NAME: &str = "aes-256-gcm";
const KDF_NAME: &str = "argon2id";
const KEY_LEN: usize = 32;
const SALT_LEN: usize = 32;
/// AES-GCM nonce length in bytes (96 bits)
const NONCE_LEN: usize = 12;

/// Argon2id cost preset used when sealing new keyfiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KdfStrength {
    /// 64 MiB, 3 passes
    #[default]
    Standard,
    /// 1 MiB, 1 pass; for tests and throwaway dev keys
    Light,
}

impl KdfStrength {
    fn params(&self) -> KdfParams {
        match self {
            KdfStrength::Standard => KdfParams {
                memory: 65536,
                iterations: 3,
                parallelism: 1,
            },
            KdfStrength::Light => KdfParams {
                memory: 1024,
                iterations: 1,
                parallelism: 1,
            },
        }
    }
}

/// The top-level keyfile structure, serializable to/from JSON
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyFile {
    pub version: u32,
    /// Lowercase hex address without `0x`
    pub address: String,
    pub crypto: KeyFileCrypto,
}

/// The crypto section, containing all encryption parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyFileCrypto {
    pub cipher: String,
    pub kdf: String,
    pub kdf_params: KdfParams,
    /// Hex-encoded salt
    pub salt: String,
    /// Hex-encoded nonce
    pub nonce: String,
    /// Hex-encoded ciphertext
    pub ciphertext: String,
}

/// Argon2id parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory in KiB
    pub memory: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl KeyFile {
    /// Seal `key` under `passphrase`
    pub fn encrypt(
        key: &KeyPair,
        passphrase: &str,
        strength: KdfStrength,
    ) -> Result<Self, KeystoreError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let kdf_params = strength.params();
        let derived = derive_key(passphrase, &salt, &kdf_params)?;

        let cipher = Aes256Gcm::new_from_slice(derived.as_slice())
            .map_err(|e| KeystoreError::Kdf(format!("AES key init failed: {}", e)))?;
        let secret = key.secret_bytes();
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), secret.as_slice())
            .map_err(|_| KeystoreError::Kdf("encryption failed".to_string()))?;

        Ok(Self {
            version: KEYFILE_VERSION,
            address: key.address().to_hex(),
            crypto: KeyFileCrypto {
                cipher: CIPHER_NAME.to_string(),
                kdf: KDF_NAME.to_string(),
                kdf_params,
                salt: hex::encode(salt),
                nonce: hex::encode(nonce_bytes),
                ciphertext: hex::encode(ciphertext),
            },
        })
    }

    /// Recover the secret key, checking it matches the recorded address
    pub fn decrypt(&self, passphrase: &str) -> Result<Zeroizing<[u8; 32]>, KeystoreError> {
        if self.version != KEYFILE_VERSION {
            return Err(KeystoreError::InvalidKeyfile(format!(
                "unsupported version: {}",
                self.version
            )));
        }
        if self.crypto.cipher != CIPHER_NAME || self.crypto.kdf != KDF_NAME {
            return Err(KeystoreError::InvalidKeyfile(format!(
                "unsupported cipher/kdf: {}/{}",
                self.crypto.cipher, self.crypto.kdf
            )));
        }

        let salt = decode_field("salt", &self.crypto.salt)?;
        let nonce_bytes = decode_field("nonce", &self.crypto.nonce)?;
        let ciphertext = decode_field("ciphertext", &self.crypto.ciphertext)?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(KeystoreError::InvalidKeyfile(format!(
                "invalid nonce length: expected {}, got {}",
                NONCE_LEN,
                nonce_bytes.len()
            )));
        }

        let derived = derive_key(passphrase, &salt, &self.crypto.kdf_params)?;
        let cipher = Aes256Gcm::new_from_slice(derived.as_slice())
            .map_err(|e| KeystoreError::Kdf(format!("AES key init failed: {}", e)))?;
        let plaintext = Zeroizing::new(
            cipher
                .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
                .map_err(|_| KeystoreError::Decryption)?,
        );
        if plaintext.len() != KEY_LEN {
            return Err(KeystoreError::InvalidKeyfile(format!(
                "decrypted key has wrong length: {}",
                plaintext.len()
            )));
        }

        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        key.copy_from_slice(&plaintext);

        let derived_address = KeyPair::from_secret_bytes(key.as_slice())
            .map_err(|_| KeystoreError::InvalidKey)?
            .address();
        if derived_address != self.address()? {
            return Err(KeystoreError::InvalidKeyfile(
                "address does not match key".to_string(),
            ));
        }
        Ok(key)
    }

    /// Address recorded in the keyfile
    pub fn address(&self) -> Result<Address, KeystoreError> {
        self.address
            .parse()
            .map_err(|e| KeystoreError::InvalidKeyfile(format!("bad address: {}", e)))
    }

    pub fn to_json(&self) -> Result<Vec<u8>, KeystoreError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, KeystoreError> {
        serde_json::from_slice(bytes).map_err(|e| KeystoreError::InvalidKeyfile(e.to_string()))
    }
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, KeystoreError> {
    hex::decode(value).map_err(|e| KeystoreError::InvalidKeyfile(format!("invalid {} hex: {}", name, e)))
}

/// Derive a 32-byte key from a passphrase and salt using Argon2id
fn derive_key(
    passphrase: &str,
    salt: &[u8],
    kdf: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, KeystoreError> {
    let params = Params::new(kdf.memory, kdf.iterations, kdf.parallelism, Some(KEY_LEN))
        .map_err(|e| KeystoreError::Kdf(format!("Argon2 params error: {}", e)))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, output.as_mut_slice())
        .map_err(|e| KeystoreError::Kdf(format!("Argon2 hashing failed: {}", e)))?;
    Ok(output)
}
