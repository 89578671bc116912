//! Chain RPC collaborator
//!
//! Read-only chain queries plus raw transaction submission. Calls block the
//! caller; timeouts belong to the implementation.

pub mod client;

pub use client::{parse_quantity, JsonRpcClient};

use crate::core::Address;
use thiserror::Error;

/// RPC errors
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("RPC error {code}: {message}")]
    Remote { code: i64, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Chain queries the custody layer relies on
pub trait ChainRpc: Send + Sync {
    /// Balance in wei, including pending transactions
    fn pending_balance(&self, address: &Address) -> Result<u128, RpcError>;

    /// Next nonce, including pending transactions
    fn pending_nonce(&self, address: &Address) -> Result<u64, RpcError>;

    /// Node's suggested gas price in wei
    fn suggested_gas_price(&self) -> Result<u128, RpcError>;

    /// Submit a signed transaction, returning its hash
    fn send_raw_transaction(&self, raw: &[u8]) -> Result<String, RpcError>;
}
