//! Agent configuration
//!
//! Defaults, optionally overridden by a JSON file and then by environment
//! variables:
//! - `CUSTODY_KEYSTORE_DIR`: keystore directory (default `keys/`)
//! - `CUSTODY_CHAIN_ID`: chain ID used for every signature (default 1)
//! - `CUSTODY_RPC_URL`: Ethereum JSON-RPC endpoint (default `http://localhost:8545`)

use crate::core::DEFAULT_CHAIN_ID;
use crate::keystore::KdfStrength;
use crate::session::{
    DEFAULT_PASSPHRASE_TTL_SECS, DEFAULT_SWEEP_INTERVAL_SECS, DEFAULT_TRANSACTION_TTL_SECS,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Custody agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub keystore_dir: PathBuf,
    pub chain_id: u64,
    pub rpc_url: String,
    pub rpc_timeout_secs: u64,
    pub passphrase_ttl_secs: i64,
    pub transaction_ttl_secs: i64,
    pub sweep_interval_secs: u64,
    pub download_token_ttl_secs: i64,
    pub send_token_ttl_secs: i64,
    pub kdf: KdfStrength,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            keystore_dir: PathBuf::from("keys"),
            chain_id: DEFAULT_CHAIN_ID,
            rpc_url: "http://localhost:8545".to_string(),
            rpc_timeout_secs: 30,
            passphrase_ttl_secs: DEFAULT_PASSPHRASE_TTL_SECS,
            transaction_ttl_secs: DEFAULT_TRANSACTION_TTL_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            download_token_ttl_secs: 30 * 60,
            send_token_ttl_secs: 20 * 60,
            kdf: KdfStrength::Standard,
        }
    }
}

impl AgentConfig {
    /// Load a JSON config file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env()
    }

    /// Apply `CUSTODY_*` environment overrides
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(dir) = lookup("CUSTODY_KEYSTORE_DIR") {
            self.keystore_dir = PathBuf::from(dir);
        }
        if let Some(chain_id) = lookup("CUSTODY_CHAIN_ID") {
            self.chain_id = chain_id
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("CUSTODY_CHAIN_ID".to_string(), chain_id))?;
        }
        if let Some(url) = lookup("CUSTODY_RPC_URL") {
            self.rpc_url = url;
        }
        Ok(self)
    }

    pub fn passphrase_ttl(&self) -> Duration {
        Duration::seconds(self.passphrase_ttl_secs)
    }

    pub fn transaction_ttl(&self) -> Duration {
        Duration::seconds(self.transaction_ttl_secs)
    }

    pub fn download_token_ttl(&self) -> Duration {
        Duration::seconds(self.download_token_ttl_secs)
    }

    pub fn send_token_ttl(&self) -> Duration {
        Duration::seconds(self.send_token_ttl_secs)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn rpc_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.rpc_timeout_secs)
    }
}
