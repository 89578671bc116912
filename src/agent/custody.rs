//! Custody agent façade
//!
//! Composes the session stores, the reaper and the keystore/RPC
//! collaborators. Every token-gated operation resolves its token first and
//! every passphrase-gated operation reads the secret store at call time, so
//! expiry is observed even by calls already in flight.

use super::AgentError;
use crate::config::AgentConfig;
use crate::core::{
    ether_to_wei, gwei_to_wei, wei_to_ether, wei_to_gwei, Account, Address, SignedTransaction,
    Transaction,
};
use crate::crypto::KeyPair;
use crate::keystore::{Keystore, KeystoreError, LocalKeystore};
use crate::rpc::{ChainRpc, JsonRpcClient};
use crate::session::{
    Clock, Permission, Reaper, ReaperHandle, SecretStore, SweepReport, SystemClock,
    TokenRegistry, TransactionQueue,
};
use chrono::Duration;
use std::path::PathBuf;
use std::sync::Arc;
use zeroize::Zeroizing;

pub struct CustodyAgent {
    config: AgentConfig,
    chain_id: u64,
    keystore: Arc<dyn Keystore>,
    rpc: Arc<dyn ChainRpc>,
    secrets: Arc<SecretStore>,
    tokens: Arc<TokenRegistry>,
    queue: Arc<TransactionQueue>,
    reaper: Arc<Reaper>,
}

impl CustodyAgent {
    pub fn new(config: AgentConfig, keystore: Arc<dyn Keystore>, rpc: Arc<dyn ChainRpc>) -> Self {
        Self::with_clock(config, keystore, rpc, Arc::new(SystemClock))
    }

    /// Build an agent reading time from `clock`
    pub fn with_clock(
        config: AgentConfig,
        keystore: Arc<dyn Keystore>,
        rpc: Arc<dyn ChainRpc>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let secrets = Arc::new(SecretStore::new(clock.clone()));
        let tokens = Arc::new(TokenRegistry::new(clock.clone()));
        let queue = Arc::new(TransactionQueue::new(clock));
        let reaper = Arc::new(Reaper::new(
            tokens.clone(),
            secrets.clone(),
            queue.clone(),
            keystore.clone(),
        ));

        Self {
            chain_id: config.chain_id,
            config,
            keystore,
            rpc,
            secrets,
            tokens,
            queue,
            reaper,
        }
    }

    /// Agent over a directory keystore and an HTTP JSON-RPC node
    pub fn open(config: AgentConfig) -> Result<Self, AgentError> {
        let keystore = LocalKeystore::new(&config.keystore_dir, config.kdf)?;
        let rpc = JsonRpcClient::new(&config.rpc_url, config.rpc_timeout())?;
        log::info!(
            "Opened keystore {:?} (chain {}, node {})",
            keystore.dir(),
            config.chain_id,
            rpc.url()
        );
        Ok(Self::new(config, Arc::new(keystore), Arc::new(rpc)))
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn keystore(&self) -> &Arc<dyn Keystore> {
        &self.keystore
    }

    pub fn download_token_ttl(&self) -> Duration {
        self.config.download_token_ttl()
    }

    pub fn send_token_ttl(&self) -> Duration {
        self.config.send_token_ttl()
    }

    // ========== Accounts ==========

    /// Generate a new key and cache its passphrase
    pub fn create_address(&self, passphrase: &str) -> Result<Account, AgentError> {
        let account = self.keystore.new_account(passphrase)?;
        self.secrets
            .cache(&account, passphrase, self.config.passphrase_ttl());
        log::info!("Created account {}", account.address);
        Ok(account)
    }

    /// Import an encrypted keyfile, keeping its passphrase
    pub fn import_keyfile(&self, keyfile: &[u8], passphrase: &str) -> Result<Account, AgentError> {
        let account = self.keystore.import(keyfile, passphrase, passphrase)?;
        self.secrets
            .cache(&account, passphrase, self.config.passphrase_ttl());
        log::info!("Imported keyfile for {}", account.address);
        Ok(account)
    }

    /// Import a hex private key with an empty passphrase
    ///
    /// A key already in the keystore resolves to the stored account. Its
    /// live cached passphrase is kept; otherwise the empty passphrase is
    /// cached only if it opens the stored key.
    pub fn import_raw_key(&self, private_key_hex: &str) -> Result<Account, AgentError> {
        let key = KeyPair::from_private_key_hex(private_key_hex)
            .map_err(|e| AgentError::InvalidInput(e.to_string()))?;

        let account = match self.keystore.import_raw(&key, "") {
            Ok(account) => {
                self.secrets.cache(&account, "", self.config.passphrase_ttl());
                account
            }
            Err(KeystoreError::AccountExists(address)) => {
                let account = self.keystore.find(&address)?;
                self.cache_existing_raw_key(&account);
                account
            }
            Err(e) => return Err(e.into()),
        };
        log::info!("Imported raw key for {}", account.address);
        Ok(account)
    }

    fn cache_existing_raw_key(&self, account: &Account) {
        if self.secrets.get(&account.address).is_ok() {
            log::debug!("Key for {} already stored and unlocked", account.address);
            return;
        }
        match self.keystore.export(account, "", "") {
            Ok(_) => self.secrets.cache(account, "", self.config.passphrase_ttl()),
            Err(_) => log::debug!(
                "Key for {} already stored under a passphrase; not caching",
                account.address
            ),
        }
    }

    /// Verify `passphrase` against a stored account and cache it
    pub fn unlock(&self, address: &Address, passphrase: &str) -> Result<Account, AgentError> {
        let account = self.keystore.find(address)?;
        self.keystore.export(&account, passphrase, passphrase)?;
        self.secrets
            .cache(&account, passphrase, self.config.passphrase_ttl());
        log::info!("Unlocked {}", account.address);
        Ok(account)
    }

    /// Raw private key as hex, using the cached passphrase
    pub fn export_private_key(&self, account: &Account) -> Result<Zeroizing<String>, AgentError> {
        let passphrase = self.secrets.get(&account.address)?;
        let keyfile = self.keystore.export(account, &passphrase, &passphrase)?;
        let secret = self.keystore.decrypt(&keyfile, &passphrase)?;
        log::info!("Exported private key of {}", account.address);
        Ok(Zeroizing::new(hex::encode(secret.as_slice())))
    }

    // ========== Tokens ==========

    pub fn issue_token(&self, account: &Account, permission: Permission, ttl: Duration) -> String {
        self.tokens.issue(account, permission, ttl)
    }

    pub fn account_of_token(&self, token_id: &str) -> Result<Account, AgentError> {
        Ok(self.tokens.account_of(token_id)?)
    }

    /// Keyfile location for a `download` token's account
    pub fn keyfile_path(&self, token_id: &str) -> Result<PathBuf, AgentError> {
        let account = self.tokens.resolve(token_id, Permission::Download)?;
        let suffix = account.address.to_hex();

        self.keystore
            .list()?
            .into_iter()
            .find(|entry| entry.file_name.to_ascii_lowercase().ends_with(&suffix))
            .map(|entry| entry.path)
            .ok_or_else(|| AgentError::NotFound(format!("keyfile for {}", account.address)))
    }

    // ========== Chain queries ==========

    /// Pending balance in ether, at microether precision
    pub fn balance(&self, address: &Address) -> Result<f64, AgentError> {
        let wei = self.rpc.pending_balance(address)?;
        Ok(wei_to_ether(wei))
    }

    pub fn nonce(&self, address: &Address) -> Result<u64, AgentError> {
        Ok(self.rpc.pending_nonce(address)?)
    }

    /// Suggested gas price in gwei
    pub fn estimate_gas(&self) -> Result<f64, AgentError> {
        let wei = self.rpc.suggested_gas_price()?;
        Ok(wei_to_gwei(wei))
    }

    // ========== Sending ==========

    /// Unsigned transfer of `amount` ether at `gas_price` gwei
    pub fn build_transaction(
        &self,
        nonce: u64,
        to: &Address,
        amount: f64,
        gas_limit: u64,
        gas_price: f64,
        token_id: &str,
    ) -> Result<Transaction, AgentError> {
        self.tokens.resolve(token_id, Permission::Send)?;
        let value = ether_to_wei(amount)?;
        let gas_price = gwei_to_wei(gas_price)?;
        Ok(Transaction::new(nonce, *to, value, gas_limit, gas_price))
    }

    /// Sign with the token account's cached passphrase and queue for broadcast
    pub fn sign_and_queue(&self, tx: &Transaction, token_id: &str) -> Result<String, AgentError> {
        let account = self.tokens.resolve(token_id, Permission::Send)?;
        let passphrase = self.secrets.get(&account.address)?;
        let signed = self
            .keystore
            .sign_transaction(&account, &passphrase, tx, self.chain_id)?;
        signed
            .verify_chain_id(self.chain_id)
            .map_err(KeystoreError::from)?;

        let tx_id = self.queue.enqueue(signed, self.config.transaction_ttl());
        log::info!("Queued transaction from {} to {}", account.address, tx.to);
        Ok(tx_id)
    }

    /// Queued transaction, without consuming it
    pub fn pending_transaction(&self, tx_id: &str) -> Result<SignedTransaction, AgentError> {
        Ok(self.queue.get(tx_id)?)
    }

    /// Take a queued transaction and submit it, returning its hash
    pub fn broadcast(&self, tx_id: &str) -> Result<String, AgentError> {
        let signed = self.queue.take(tx_id)?;
        let hash = self.rpc.send_raw_transaction(&signed.raw())?;
        log::info!("Broadcast transaction {}", hash);
        Ok(hash)
    }

    // ========== Expiry ==========

    pub fn sweep(&self) -> SweepReport {
        self.reaper.sweep()
    }

    /// Start the periodic reaper on the current tokio runtime
    pub fn spawn_reaper(&self) -> ReaperHandle {
        let interval = self.config.sweep_interval();
        log::info!("Sweeping expired sessions every {:?}", interval);
        self.reaper.clone().spawn(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::KdfStrength;
    use crate::rpc::RpcError;
    use crate::session::ManualClock;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockRpc {
        balance: u128,
        nonce: u64,
        gas_price: u128,
        fail: bool,
        sent: Mutex<Vec<Vec<u8>>>,
    }

    impl MockRpc {
        fn check(&self) -> Result<(), RpcError> {
            if self.fail {
                return Err(RpcError::InvalidResponse("node unavailable".to_string()));
            }
            Ok(())
        }
    }

    impl ChainRpc for MockRpc {
        fn pending_balance(&self, _address: &Address) -> Result<u128, RpcError> {
            self.check()?;
            Ok(self.balance)
        }

        fn pending_nonce(&self, _address: &Address) -> Result<u64, RpcError> {
            self.check()?;
            Ok(self.nonce)
        }

        fn suggested_gas_price(&self) -> Result<u128, RpcError> {
            self.check()?;
            Ok(self.gas_price)
        }

        fn send_raw_transaction(&self, raw: &[u8]) -> Result<String, RpcError> {
            self.check()?;
            self.sent.lock().unwrap().push(raw.to_vec());
            Ok(format!("0x{}", hex::encode(crate::crypto::keccak256(raw))))
        }
    }

    struct Fixture {
        clock: Arc<ManualClock>,
        rpc: Arc<MockRpc>,
        agent: CustodyAgent,
        _dir: tempfile::TempDir,
    }

    fn fixture_with(rpc: MockRpc) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let config = AgentConfig {
            keystore_dir: dir.path().to_path_buf(),
            chain_id: 5,
            kdf: KdfStrength::Light,
            ..Default::default()
        };
        let keystore = Arc::new(LocalKeystore::new(dir.path(), KdfStrength::Light).unwrap());
        let clock = Arc::new(ManualClock::default());
        let rpc = Arc::new(rpc);
        let agent = CustodyAgent::with_clock(config, keystore, rpc.clone(), clock.clone());
        Fixture {
            clock,
            rpc,
            agent,
            _dir: dir,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MockRpc {
            balance: 1_234_567_890_000_000_000,
            nonce: 7,
            gas_price: 20_000_000_000,
            ..Default::default()
        })
    }

    fn recipient() -> Address {
        "0x3535353535353535353535353535353535353535".parse().unwrap()
    }

    #[test]
    fn test_create_address_caches_passphrase() {
        let f = fixture();
        let account = f.agent.create_address("hunter2").unwrap();
        assert!(f.agent.keystore().has_address(&account.address));

        let key = f.agent.export_private_key(&account).unwrap();
        assert_eq!(key.len(), 64);
    }

    #[test]
    fn test_export_after_passphrase_expiry() {
        let f = fixture();
        let account = f.agent.create_address("pw").unwrap();

        f.clock.advance(Duration::minutes(59));
        assert!(f.agent.export_private_key(&account).is_ok());

        f.clock.advance(Duration::minutes(1));
        assert!(matches!(
            f.agent.export_private_key(&account),
            Err(AgentError::Expired(_))
        ));
    }

    #[test]
    fn test_export_unknown_account() {
        let f = fixture();
        let account = Account::new(recipient(), PathBuf::from("missing"));
        assert!(matches!(
            f.agent.export_private_key(&account),
            Err(AgentError::NotFound(_))
        ));
    }

    #[test]
    fn test_import_raw_key_reuses_existing_account() {
        let f = fixture();
        let hex_key = "0x4646464646464646464646464646464646464646464646464646464646464646";

        let first = f.agent.import_raw_key(hex_key).unwrap();
        let second = f.agent.import_raw_key(hex_key).unwrap();
        assert_eq!(first, second);
        assert_eq!(f.agent.keystore().list().unwrap().len(), 1);

        let exported = f.agent.export_private_key(&first).unwrap();
        assert_eq!(exported.as_str(), &hex_key[2..]);
    }

    #[test]
    fn test_import_raw_key_keeps_live_passphrase() {
        let f = fixture();
        let account = f.agent.create_address("pw").unwrap();
        let key_hex = f.agent.export_private_key(&account).unwrap();

        let reimported = f.agent.import_raw_key(&key_hex).unwrap();
        assert_eq!(reimported, account);
        assert!(f.agent.export_private_key(&account).is_ok());

        f.clock.advance(Duration::hours(1));
        let report = f.agent.sweep();
        assert_eq!(report.keys_deleted, 1);
        assert_eq!(report.keys_orphaned, 0);
    }

    #[test]
    fn test_import_raw_key_does_not_cache_wrong_passphrase() {
        let f = fixture();
        let account = f.agent.create_address("pw").unwrap();
        let key_hex = f.agent.export_private_key(&account).unwrap();
        f.clock.advance(Duration::hours(2));

        f.agent.import_raw_key(&key_hex).unwrap();
        assert!(matches!(
            f.agent.export_private_key(&account),
            Err(AgentError::Expired(_))
        ));

        f.agent.unlock(&account.address, "pw").unwrap();
        assert!(f.agent.export_private_key(&account).is_ok());
    }

    #[test]
    fn test_concurrent_raw_imports_share_one_account() {
        let f = fixture();
        let agent = Arc::new(f.agent);
        let hex_key = "0x4646464646464646464646464646464646464646464646464646464646464646";

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let agent = agent.clone();
                std::thread::spawn(move || agent.import_raw_key(hex_key).unwrap())
            })
            .collect();
        let accounts: Vec<Account> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(accounts.iter().all(|a| *a == accounts[0]));
        assert_eq!(agent.keystore().list().unwrap().len(), 1);
        assert!(agent.export_private_key(&accounts[0]).is_ok());
    }

    #[test]
    fn test_import_raw_key_rejects_bad_hex() {
        let f = fixture();
        assert!(matches!(
            f.agent.import_raw_key("0xnothex"),
            Err(AgentError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_import_keyfile() {
        let source = fixture();
        let account = source.agent.create_address("pw").unwrap();
        let keyfile = source.agent.keystore().export(&account, "pw", "pw").unwrap();

        let f = fixture();
        let imported = f.agent.import_keyfile(&keyfile, "pw").unwrap();
        assert_eq!(imported.address, account.address);
        assert!(f.agent.export_private_key(&imported).is_ok());

        assert!(matches!(
            f.agent.import_keyfile(&keyfile, "wrong"),
            Err(AgentError::Keystore(_))
        ));
    }

    #[test]
    fn test_unlock_verifies_passphrase() {
        let f = fixture();
        let account = f.agent.create_address("pw").unwrap();
        f.clock.advance(Duration::hours(2));

        let err = f.agent.unlock(&account.address, "wrong").unwrap_err();
        assert!(err.is_upstream());

        f.agent.unlock(&account.address, "pw").unwrap();
        assert!(f.agent.export_private_key(&account).is_ok());
    }

    #[test]
    fn test_keyfile_path_requires_download_token() {
        let f = fixture();
        let account = f.agent.create_address("pw").unwrap();
        let send = f.agent.issue_token(&account, Permission::Send, Duration::minutes(20));
        let download = f
            .agent
            .issue_token(&account, Permission::Download, Duration::minutes(30));

        assert!(matches!(
            f.agent.keyfile_path(&send),
            Err(AgentError::PermissionDenied {
                required: Permission::Download,
                granted: Permission::Send,
            })
        ));

        let path = f.agent.keyfile_path(&download).unwrap();
        assert_eq!(path, account.path);
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("UTC--"));
        assert!(name.ends_with(&account.address.to_hex()));

        f.clock.advance(Duration::minutes(30));
        assert!(matches!(
            f.agent.keyfile_path(&download),
            Err(AgentError::Expired(_))
        ));
    }

    #[test]
    fn test_keyfile_path_missing_file() {
        let f = fixture();
        let account = f.agent.create_address("pw").unwrap();
        let token = f
            .agent
            .issue_token(&account, Permission::Download, Duration::minutes(30));
        std::fs::remove_file(&account.path).unwrap();

        assert!(matches!(
            f.agent.keyfile_path(&token),
            Err(AgentError::NotFound(_))
        ));
    }

    #[test]
    fn test_account_of_token() {
        let f = fixture();
        let account = f.agent.create_address("pw").unwrap();
        let token = f.agent.issue_token(&account, Permission::Send, Duration::minutes(1));
        assert_eq!(f.agent.account_of_token(&token).unwrap(), account);
        assert!(matches!(
            f.agent.account_of_token("unknown"),
            Err(AgentError::NotFound(_))
        ));
    }

    #[test]
    fn test_chain_queries() {
        let f = fixture();
        let address = recipient();
        assert_eq!(f.agent.balance(&address).unwrap(), 1.234567);
        assert_eq!(f.agent.nonce(&address).unwrap(), 7);
        assert_eq!(f.agent.estimate_gas().unwrap(), 20.0);
    }

    #[test]
    fn test_rpc_failure_is_upstream() {
        let f = fixture_with(MockRpc {
            fail: true,
            ..Default::default()
        });
        let err = f.agent.balance(&recipient()).unwrap_err();
        assert!(matches!(err, AgentError::Rpc(_)));
        assert!(err.is_upstream());
    }

    #[test]
    fn test_build_transaction_scales_amounts() {
        let f = fixture();
        let account = f.agent.create_address("pw").unwrap();
        let token = f.agent.issue_token(&account, Permission::Send, Duration::minutes(20));

        let tx = f
            .agent
            .build_transaction(3, &recipient(), 1.5, 21_000, 2.5, &token)
            .unwrap();
        assert_eq!(tx.nonce, 3);
        assert_eq!(tx.to, recipient());
        assert_eq!(tx.value, 1_500_000_000_000_000_000);
        assert_eq!(tx.gas_price, 2_500_000_000);
        assert_eq!(tx.gas_limit, 21_000);
    }

    #[test]
    fn test_build_transaction_checks_token() {
        let f = fixture();
        let account = f.agent.create_address("pw").unwrap();
        let download = f
            .agent
            .issue_token(&account, Permission::Download, Duration::minutes(30));

        assert!(matches!(
            f.agent
                .build_transaction(0, &recipient(), 1.0, 21_000, 1.0, &download),
            Err(AgentError::PermissionDenied { .. })
        ));

        let send = f.agent.issue_token(&account, Permission::Send, Duration::minutes(20));
        assert!(matches!(
            f.agent.build_transaction(0, &recipient(), -1.0, 21_000, 1.0, &send),
            Err(AgentError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_sign_queue_and_broadcast() {
        let f = fixture();
        let account = f.agent.create_address("pw").unwrap();
        let token = f.agent.issue_token(&account, Permission::Send, Duration::minutes(20));
        let tx = f
            .agent
            .build_transaction(0, &recipient(), 0.1, 21_000, 1.0, &token)
            .unwrap();

        let tx_id = f.agent.sign_and_queue(&tx, &token).unwrap();
        let pending = f.agent.pending_transaction(&tx_id).unwrap();
        assert_eq!(pending.tx, tx);
        assert_eq!(pending.chain_id, 5);
        assert_eq!(pending.sender().unwrap(), account.address);

        let hash = f.agent.broadcast(&tx_id).unwrap();
        assert_eq!(hash, pending.hash_hex());
        assert_eq!(f.rpc.sent.lock().unwrap().as_slice(), &[pending.raw()]);

        assert!(matches!(f.agent.broadcast(&tx_id), Err(AgentError::NotFound(_))));
    }

    #[test]
    fn test_sign_with_expired_passphrase_fails() {
        let f = fixture();
        let account = f.agent.create_address("pw").unwrap();
        f.clock.advance(Duration::minutes(50));
        let token = f.agent.issue_token(&account, Permission::Send, Duration::minutes(20));
        let tx = f
            .agent
            .build_transaction(0, &recipient(), 0.1, 21_000, 1.0, &token)
            .unwrap();

        // token still live, passphrase not
        f.clock.advance(Duration::minutes(10));
        assert!(matches!(
            f.agent.sign_and_queue(&tx, &token),
            Err(AgentError::Expired(_))
        ));
    }

    #[test]
    fn test_sign_without_cached_passphrase() {
        let f = fixture();
        let account = f.agent.keystore().new_account("pw").unwrap();
        let token = f.agent.issue_token(&account, Permission::Send, Duration::minutes(20));
        let tx = Transaction::new(0, recipient(), 1, 21_000, 1);
        assert!(matches!(
            f.agent.sign_and_queue(&tx, &token),
            Err(AgentError::NotFound(_))
        ));
    }

    #[test]
    fn test_queued_transaction_expires() {
        let f = fixture();
        let account = f.agent.create_address("pw").unwrap();
        let token = f.agent.issue_token(&account, Permission::Send, Duration::minutes(20));
        let tx = Transaction::new(0, recipient(), 1, 21_000, 1);
        let tx_id = f.agent.sign_and_queue(&tx, &token).unwrap();

        f.clock.advance(Duration::minutes(21));
        assert!(matches!(
            f.agent.pending_transaction(&tx_id),
            Err(AgentError::Expired(_))
        ));

        let report = f.agent.sweep();
        assert_eq!(report.transactions, 1);
        assert!(matches!(f.agent.broadcast(&tx_id), Err(AgentError::NotFound(_))));
        assert!(f.rpc.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sweep_deletes_expired_account_key() {
        let f = fixture();
        let account = f.agent.create_address("pw").unwrap();

        f.clock.advance(Duration::hours(1));
        let report = f.agent.sweep();
        assert_eq!(report.secrets, 1);
        assert_eq!(report.keys_deleted, 1);
        assert!(!f.agent.keystore().has_address(&account.address));

        assert!(f.agent.sweep().is_empty());
    }

    #[test]
    fn test_concurrent_signing() {
        let f = fixture();
        let account = f.agent.create_address("pw").unwrap();
        let token = f.agent.issue_token(&account, Permission::Send, Duration::minutes(20));
        let agent = Arc::new(f.agent);

        let handles: Vec<_> = (0..4u64)
            .map(|nonce| {
                let agent = agent.clone();
                let token = token.clone();
                std::thread::spawn(move || {
                    let tx = Transaction::new(nonce, recipient(), 1, 21_000, 1);
                    agent.sign_and_queue(&tx, &token).unwrap()
                })
            })
            .collect();
        let ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for id in &ids {
            assert!(agent.broadcast(id).is_ok());
        }
        assert_eq!(f.rpc.sent.lock().unwrap().len(), 4);
    }
}
