//! Capability tokens
//!
//! A token grants exactly one permission on one account until a fixed
//! expiry. Tokens are capability-scoped, not identity-scoped: an account may
//! hold any number of live tokens with different permissions and lifetimes.
//! There is no renewal and no revocation; a token dies when it expires.

use super::{lock, Clock, SessionError};
use crate::core::Account;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// Random bytes behind every token identifier (256 bits)
pub const TOKEN_ID_BYTES: usize = 32;

/// What a token allows its bearer to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Fetch the account's encrypted keyfile
    Download,
    /// Sign transactions from the account
    Send,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Download => "download",
            Permission::Send => "send",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "download" => Ok(Permission::Download),
            "send" => Ok(Permission::Send),
            other => Err(format!("unknown permission: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
struct TokenEntry {
    account: Account,
    permission: Permission,
    expires_at: DateTime<Utc>,
}

/// Thread-safe registry of live capability tokens
pub struct TokenRegistry {
    tokens: Mutex<HashMap<String, TokenEntry>>,
    clock: Arc<dyn Clock>,
}

impl TokenRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Mint a token for `account` scoped to `permission`, valid for `ttl`
    pub fn issue(&self, account: &Account, permission: Permission, ttl: Duration) -> String {
        let entry = TokenEntry {
            account: account.clone(),
            permission,
            expires_at: self.clock.now() + ttl,
        };

        let mut tokens = lock(&self.tokens);
        let token_id = loop {
            let candidate = generate_token_id();
            if !tokens.contains_key(&candidate) {
                break candidate;
            }
        };
        tokens.insert(token_id.clone(), entry);

        log::debug!(
            "Issued {} token for {} (ttl {}s)",
            permission,
            account.address,
            ttl.num_seconds()
        );
        token_id
    }

    /// Account behind `token_id`, provided it is live and grants `required`
    ///
    /// Checks run in order: existence, expiry, permission.
    pub fn resolve(&self, token_id: &str, required: Permission) -> Result<Account, SessionError> {
        let entry = self.live_entry(token_id)?;
        if entry.permission != required {
            return Err(SessionError::PermissionDenied {
                required,
                granted: entry.permission,
            });
        }
        Ok(entry.account)
    }

    /// Account behind `token_id` regardless of its permission
    pub fn account_of(&self, token_id: &str) -> Result<Account, SessionError> {
        self.live_entry(token_id).map(|entry| entry.account)
    }

    fn live_entry(&self, token_id: &str) -> Result<TokenEntry, SessionError> {
        let tokens = lock(&self.tokens);
        let entry = tokens
            .get(token_id)
            .ok_or_else(|| SessionError::NotFound("token".to_string()))?;
        if self.clock.now() >= entry.expires_at {
            return Err(SessionError::Expired("token".to_string()));
        }
        Ok(entry.clone())
    }

    /// Drop every expired token, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut tokens = lock(&self.tokens);
        let before = tokens.len();
        tokens.retain(|_, entry| now < entry.expires_at);
        before - tokens.len()
    }

    pub fn len(&self) -> usize {
        lock(&self.tokens).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fresh identifier straight from the OS random source
fn generate_token_id() -> String {
    let mut bytes = [0u8; TOKEN_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
