//! Expiry reaper
//!
//! Periodically evicts expired tokens, passphrases and queued transactions.
//! Every expired passphrase also takes its key with it: the reaper asks the
//! keystore to delete the key the passphrase unlocks. A failed delete is
//! logged and the cache entry is dropped anyway, which can leave a key on
//! disk that this layer can no longer reach.

use super::{SecretStore, TokenRegistry, TransactionQueue};
use crate::keystore::Keystore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Default time between sweeps, in seconds
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 15 * 60;

/// What a single sweep removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub tokens: usize,
    pub secrets: usize,
    /// Keys removed from the keystore for expired passphrases
    pub keys_deleted: usize,
    /// Keys whose deletion failed and that stay on disk
    pub keys_orphaned: usize,
    pub transactions: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.tokens == 0 && self.secrets == 0 && self.transactions == 0
    }
}

/// Sweeps the three session stores
pub struct Reaper {
    tokens: Arc<TokenRegistry>,
    secrets: Arc<SecretStore>,
    queue: Arc<TransactionQueue>,
    keystore: Arc<dyn Keystore>,
}

impl Reaper {
    pub fn new(
        tokens: Arc<TokenRegistry>,
        secrets: Arc<SecretStore>,
        queue: Arc<TransactionQueue>,
        keystore: Arc<dyn Keystore>,
    ) -> Self {
        Self {
            tokens,
            secrets,
            queue,
            keystore,
        }
    }

    /// Run one sweep over all stores
    pub fn sweep(&self) -> SweepReport {
        let mut report = SweepReport {
            tokens: self.tokens.purge_expired(),
            ..Default::default()
        };

        let expired = self.secrets.purge_expired();
        report.secrets = expired.len();
        for secret in expired {
            match self.keystore.delete(&secret.account, &secret.passphrase) {
                Ok(()) => report.keys_deleted += 1,
                Err(e) => {
                    report.keys_orphaned += 1;
                    log::warn!(
                        "Failed to delete key for expired account {}: {}",
                        secret.account.address,
                        e
                    );
                }
            }
        }

        report.transactions = self.queue.purge_expired();

        log::debug!(
            "Sweep removed {} tokens, {} passphrases ({} keys deleted, {} orphaned), {} transactions",
            report.tokens,
            report.secrets,
            report.keys_deleted,
            report.keys_orphaned,
            report.transactions
        );
        report
    }

    /// Start sweeping every `interval` on the current tokio runtime
    pub fn spawn(self: Arc<Self>, interval: Duration) -> ReaperHandle {
        let handle = tokio::spawn(async move {
            loop {
                sleep(interval).await;

                let reaper = self.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || reaper.sweep()).await {
                    log::warn!("Sweep task failed: {}", e);
                }
            }
        });
        ReaperHandle { handle }
    }
}

/// Running reaper task; stops the task when dropped
pub struct ReaperHandle {
    handle: JoinHandle<()>,
}

impl ReaperHandle {
    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for ReaperHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
