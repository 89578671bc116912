//! Passphrase cache
//!
//! Remembers which account's unlock passphrase is available and until when.
//! The store never sees raw key material.

use super::{lock, Clock, SessionError};
use crate::core::{Account, Address};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use zeroize::Zeroizing;

/// Default lifetime of a cached passphrase, in seconds
pub const DEFAULT_PASSPHRASE_TTL_SECS: i64 = 60 * 60;

struct SecretEntry {
    account: Account,
    passphrase: Zeroizing<String>,
    expires_at: DateTime<Utc>,
}

/// An entry removed by [`SecretStore::purge_expired`]
///
/// Carries the passphrase so the reaper can delete the key it unlocks.
pub struct ExpiredSecret {
    pub account: Account,
    pub passphrase: Zeroizing<String>,
}

/// Thread-safe passphrase cache keyed by account address
pub struct SecretStore {
    entries: Mutex<HashMap<Address, SecretEntry>>,
    clock: Arc<dyn Clock>,
}

impl SecretStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Cache `passphrase` for `account` until now + `ttl`, replacing any previous entry
    pub fn cache(&self, account: &Account, passphrase: &str, ttl: Duration) {
        let entry = SecretEntry {
            account: account.clone(),
            passphrase: Zeroizing::new(passphrase.to_string()),
            expires_at: self.clock.now() + ttl,
        };
        if lock(&self.entries).insert(account.address, entry).is_some() {
            log::debug!("Replaced cached passphrase for {}", account.address);
        }
    }

    /// Cached passphrase for `address`
    ///
    /// An expired entry is reported as `Expired` but left in place: the
    /// reaper still needs its passphrase to delete the key.
    pub fn get(&self, address: &Address) -> Result<Zeroizing<String>, SessionError> {
        let entries = lock(&self.entries);
        let entry = entries
            .get(address)
            .ok_or_else(|| SessionError::NotFound(format!("passphrase for {}", address)))?;
        if self.clock.now() >= entry.expires_at {
            return Err(SessionError::Expired(format!("passphrase for {}", address)));
        }
        Ok(entry.passphrase.clone())
    }

    /// Remove every expired entry and hand them back
    pub fn purge_expired(&self) -> Vec<ExpiredSecret> {
        let now = self.clock.now();
        let mut entries = lock(&self.entries);

        let expired: Vec<Address> = entries
            .iter()
            .filter(|(_, e)| now >= e.expires_at)
            .map(|(addr, _)| *addr)
            .collect();

        expired
            .iter()
            .filter_map(|addr| entries.remove(addr))
            .map(|e| ExpiredSecret {
                account: e.account,
                passphrase: e.passphrase,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
