//! Keystore collaborator
//!
//! The keystore exclusively owns private keys. The custody layer only asks
//! it to create, import, export, sign with, or delete a key, and never keeps
//! raw key bytes past the call that needed them.

pub mod keyfile;
pub mod local;

pub use keyfile::{KdfParams, KdfStrength, KeyFile, KEYFILE_VERSION};
pub use local::LocalKeystore;

use crate::core::{Account, Address, SignedTransaction, Transaction, TransactionError};
use crate::crypto::KeyPair;
use std::path::PathBuf;
use thiserror::Error;
use zeroize::Zeroizing;

/// Keystore errors
#[derive(Error, Debug)]
pub enum KeystoreError {
    #[error("Account not found: {0}")]
    AccountNotFound(Address),
    #[error("Account already exists: {0}")]
    AccountExists(Address),
    #[error("Could not decrypt key: wrong passphrase or corrupted keyfile")]
    Decryption,
    #[error("Invalid keyfile: {0}")]
    InvalidKeyfile(String),
    #[error("Invalid private key")]
    InvalidKey,
    #[error("Key derivation error: {0}")]
    Kdf(String),
    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// A file in the keystore's on-disk listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeystoreEntry {
    pub file_name: String,
    pub path: PathBuf,
}

/// Operations the custody layer needs from a keystore
pub trait Keystore: Send + Sync {
    /// Generate and store a new key sealed with `passphrase`
    fn new_account(&self, passphrase: &str) -> Result<Account, KeystoreError>;

    /// Keyfile bytes for `account`, re-sealed with `new_passphrase`
    fn export(
        &self,
        account: &Account,
        passphrase: &str,
        new_passphrase: &str,
    ) -> Result<Vec<u8>, KeystoreError>;

    /// Open exported keyfile bytes
    fn decrypt(&self, keyfile: &[u8], passphrase: &str)
        -> Result<Zeroizing<[u8; 32]>, KeystoreError>;

    /// Store the key from `keyfile`, re-sealed with `new_passphrase`
    fn import(
        &self,
        keyfile: &[u8],
        passphrase: &str,
        new_passphrase: &str,
    ) -> Result<Account, KeystoreError>;

    /// Store a raw key sealed with `passphrase`
    fn import_raw(&self, key: &KeyPair, passphrase: &str) -> Result<Account, KeystoreError>;

    fn has_address(&self, address: &Address) -> bool;

    fn find(&self, address: &Address) -> Result<Account, KeystoreError>;

    /// Remove the key, proving ownership with `passphrase`
    fn delete(&self, account: &Account, passphrase: &str) -> Result<(), KeystoreError>;

    /// Sign `tx` for `chain_id` with the account's key
    fn sign_transaction(
        &self,
        account: &Account,
        passphrase: &str,
        tx: &Transaction,
        chain_id: u64,
    ) -> Result<SignedTransaction, KeystoreError>;

    /// On-disk entries, sorted by file name
    fn list(&self) -> Result<Vec<KeystoreEntry>, KeystoreError>;
}
