//! Directory-backed keystore
//!
//! One JSON keyfile per account. File names follow
//! `UTC--<timestamp>--<address>`, where the timestamp has a fixed width and
//! the address is lowercase hex without `0x`, so an account can be located by
//! matching the file name suffix.

use super::keyfile::{KdfStrength, KeyFile};
use super::{Keystore, KeystoreEntry, KeystoreError};
use crate::core::{Account, Address, SignedTransaction, Transaction};
use crate::crypto::KeyPair;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use zeroize::Zeroizing;

/// Keystore keeping encrypted keyfiles in a single directory
pub struct LocalKeystore {
    dir: PathBuf,
    strength: KdfStrength,
    /// Held across the existence check and the file write or removal
    writes: Mutex<()>,
}

impl LocalKeystore {
    /// Open (creating if needed) a keystore directory
    pub fn new(dir: &Path, strength: KdfStrength) -> Result<Self, KeystoreError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            strength,
            writes: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a key created now
    fn key_file_name(address: &Address) -> String {
        format!(
            "UTC--{}--{}",
            Utc::now().format("%Y-%m-%dT%H-%M-%S%.9fZ"),
            address.to_hex()
        )
    }

    fn locate(&self, address: &Address) -> Result<Option<PathBuf>, KeystoreError> {
        let suffix = format!("--{}", address.to_hex());
        Ok(self
            .list()?
            .into_iter()
            .find(|entry| entry.file_name.to_ascii_lowercase().ends_with(&suffix))
            .map(|entry| entry.path))
    }

    fn load(&self, account: &Account) -> Result<KeyFile, KeystoreError> {
        let path = match self.locate(&account.address)? {
            Some(path) => path,
            None => return Err(KeystoreError::AccountNotFound(account.address)),
        };
        KeyFile::from_json(&fs::read(path)?)
    }

    fn unlock(&self, account: &Account, passphrase: &str) -> Result<KeyPair, KeystoreError> {
        let secret = self.load(account)?.decrypt(passphrase)?;
        KeyPair::from_secret_bytes(secret.as_slice()).map_err(|_| KeystoreError::InvalidKey)
    }

    fn store(&self, key: &KeyPair, passphrase: &str) -> Result<Account, KeystoreError> {
        let address = key.address();
        let file = KeyFile::encrypt(key, passphrase, self.strength)?;

        let _guard = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        if self.has_address(&address) {
            return Err(KeystoreError::AccountExists(address));
        }
        let path = self.dir.join(Self::key_file_name(&address));
        fs::write(&path, file.to_json()?)?;
        restrict_permissions(&path)?;

        log::info!("Stored key for {} at {:?}", address, path);
        Ok(Account::new(address, path))
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), KeystoreError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), KeystoreError> {
    Ok(())
}

impl Keystore for LocalKeystore {
    fn new_account(&self, passphrase: &str) -> Result<Account, KeystoreError> {
        self.store(&KeyPair::generate(), passphrase)
    }

    fn export(
        &self,
        account: &Account,
        passphrase: &str,
        new_passphrase: &str,
    ) -> Result<Vec<u8>, KeystoreError> {
        let key = self.unlock(account, passphrase)?;
        KeyFile::encrypt(&key, new_passphrase, self.strength)?.to_json()
    }

    fn decrypt(&self, keyfile: &[u8], passphrase: &str) -> Result<Zeroizing<[u8; 32]>, KeystoreError> {
        KeyFile::from_json(keyfile)?.decrypt(passphrase)
    }

    fn import(
        &self,
        keyfile: &[u8],
        passphrase: &str,
        new_passphrase: &str,
    ) -> Result<Account, KeystoreError> {
        let secret = self.decrypt(keyfile, passphrase)?;
        let key = KeyPair::from_secret_bytes(secret.as_slice()).map_err(|_| KeystoreError::InvalidKey)?;
        self.store(&key, new_passphrase)
    }

    fn import_raw(&self, key: &KeyPair, passphrase: &str) -> Result<Account, KeystoreError> {
        self.store(key, passphrase)
    }

    fn has_address(&self, address: &Address) -> bool {
        matches!(self.locate(address), Ok(Some(_)))
    }

    fn find(&self, address: &Address) -> Result<Account, KeystoreError> {
        self.locate(address)?
            .map(|path| Account::new(*address, path))
            .ok_or(KeystoreError::AccountNotFound(*address))
    }

    fn delete(&self, account: &Account, passphrase: &str) -> Result<(), KeystoreError> {
        // Only the passphrase holder may delete
        self.unlock(account, passphrase)?;
        let _guard = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        let path = self
            .locate(&account.address)?
            .ok_or(KeystoreError::AccountNotFound(account.address))?;
        fs::remove_file(&path)?;
        log::info!("Deleted key for {}", account.address);
        Ok(())
    }

    fn sign_transaction(
        &self,
        account: &Account,
        passphrase: &str,
        tx: &Transaction,
        chain_id: u64,
    ) -> Result<SignedTransaction, KeystoreError> {
        let key = self.unlock(account, passphrase)?;
        Ok(tx.sign(&key, chain_id)?)
    }

    fn list(&self) -> Result<Vec<KeystoreEntry>, KeystoreError> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if file_name.starts_with('.') {
                continue;
            }
            entries.push(KeystoreEntry { file_name, path });
        }
        entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keystore() -> (tempfile::TempDir, LocalKeystore) {
        let dir = tempfile::tempdir().unwrap();
        let ks = LocalKeystore::new(dir.path(), KdfStrength::Light).unwrap();
        (dir, ks)
    }

    #[test]
    fn test_new_account_file_name() {
        let (_dir, ks) = keystore();
        let account = ks.new_account("pw").unwrap();

        let entries = ks.list().unwrap();
        assert_eq!(entries.len(), 1);
        let name = &entries[0].file_name;
        // UTC-- + 30-char timestamp + -- + 40 hex chars
        assert_eq!(name.len(), 5 + 30 + 2 + 40);
        assert!(name.starts_with("UTC--"));
        assert!(name.ends_with(&account.address.to_hex()));
        assert_eq!(entries[0].path, account.path);
    }

    #[test]
    fn test_find_and_has_address() {
        let (_dir, ks) = keystore();
        let account = ks.new_account("pw").unwrap();

        assert!(ks.has_address(&account.address));
        assert_eq!(ks.find(&account.address).unwrap(), account);

        let missing = Address::from_bytes([9; 20]);
        assert!(!ks.has_address(&missing));
        assert!(matches!(
            ks.find(&missing),
            Err(KeystoreError::AccountNotFound(_))
        ));
    }

    #[test]
    fn test_export_and_decrypt() {
        let (_dir, ks) = keystore();
        let account = ks.new_account("pw").unwrap();

        let exported = ks.export(&account, "pw", "pw").unwrap();
        let secret = ks.decrypt(&exported, "pw").unwrap();
        let key = KeyPair::from_secret_bytes(secret.as_slice()).unwrap();
        assert_eq!(key.address(), account.address);

        assert!(matches!(
            ks.export(&account, "wrong", "pw"),
            Err(KeystoreError::Decryption)
        ));
    }

    #[test]
    fn test_import_keyfile_into_other_keystore() {
        let (_dir1, source) = keystore();
        let (_dir2, target) = keystore();
        let account = source.new_account("old").unwrap();
        let keyfile = source.export(&account, "old", "old").unwrap();

        let imported = target.import(&keyfile, "old", "new").unwrap();
        assert_eq!(imported.address, account.address);
        assert!(target.export(&imported, "new", "new").is_ok());

        assert!(matches!(
            target.import(&keyfile, "old", "new"),
            Err(KeystoreError::AccountExists(_))
        ));
    }

    #[test]
    fn test_import_raw_duplicate() {
        let (_dir, ks) = keystore();
        let key = KeyPair::generate();
        let account = ks.import_raw(&key, "").unwrap();
        assert_eq!(account.address, key.address());
        assert!(matches!(
            ks.import_raw(&key, ""),
            Err(KeystoreError::AccountExists(_))
        ));
    }

    #[test]
    fn test_concurrent_import_stores_one_file() {
        let (_dir, ks) = keystore();
        let ks = std::sync::Arc::new(ks);
        let key_hex = "46".repeat(32);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ks = ks.clone();
                let key_hex = key_hex.clone();
                std::thread::spawn(move || {
                    let key = KeyPair::from_private_key_hex(&key_hex).unwrap();
                    ks.import_raw(&key, "")
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, KeystoreError::AccountExists(_))));
        assert_eq!(ks.list().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_requires_passphrase() {
        let (_dir, ks) = keystore();
        let account = ks.new_account("pw").unwrap();

        assert!(ks.delete(&account, "wrong").is_err());
        assert!(ks.has_address(&account.address));

        ks.delete(&account, "pw").unwrap();
        assert!(!ks.has_address(&account.address));
        assert!(ks.list().unwrap().is_empty());
    }

    #[test]
    fn test_sign_transaction() {
        let (_dir, ks) = keystore();
        let account = ks.new_account("pw").unwrap();
        let tx = Transaction::new(0, Address::from_bytes([3; 20]), 5, 21_000, 1);

        let signed = ks.sign_transaction(&account, "pw", &tx, 3).unwrap();
        assert_eq!(signed.chain_id, 3);
        assert_eq!(signed.sender().unwrap(), account.address);
        assert!(ks.sign_transaction(&account, "nope", &tx, 3).is_err());
    }

    #[test]
    fn test_list_sorted_and_skips_dirs() {
        let (dir, ks) = keystore();
        ks.new_account("a").unwrap();
        ks.new_account("b").unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();

        let entries = ks.list().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].file_name <= entries[1].file_name);
    }
}
