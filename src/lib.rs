//! Custody Agent: short-lived custody of Ethereum wallet keys
//!
//! This crate provides the authorization layer between a request front-end
//! and an encrypted keystore:
//! - Passphrase cache with per-entry expiry
//! - Permission-scoped capability tokens
//! - Two-step sign-then-broadcast transaction queue
//! - Periodic reaper that evicts expired state and deletes idle keys
//! - Legacy EIP-155 transaction signing (secp256k1, Keccak-256, RLP)
//! - Argon2id / AES-256-GCM keyfiles and a blocking JSON-RPC client
//!
//! # Example
//!
//! ```rust,no_run
//! use custody_agent::agent::CustodyAgent;
//! use custody_agent::config::AgentConfig;
//! use custody_agent::session::Permission;
//!
//! let agent = CustodyAgent::open(AgentConfig::default()).unwrap();
//!
//! // Create an account; its passphrase stays cached for an hour
//! let account = agent.create_address("correct horse").unwrap();
//!
//! // Sign a transfer under a send token and queue it
//! let token = agent.issue_token(&account, Permission::Send, agent.send_token_ttl());
//! let nonce = agent.nonce(&account.address).unwrap();
//! let tx = agent
//!     .build_transaction(nonce, &account.address, 0.01, 21_000, 2.0, &token)
//!     .unwrap();
//! let tx_id = agent.sign_and_queue(&tx, &token).unwrap();
//!
//! // Confirm and submit
//! let hash = agent.broadcast(&tx_id).unwrap();
//! println!("Sent {}", hash);
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod keystore;
pub mod rpc;
pub mod session;

// Re-export commonly used types
pub use agent::{AgentError, CustodyAgent};
pub use config::AgentConfig;
pub use core::{Account, Address, SignedTransaction, Transaction};
pub use crypto::KeyPair;
pub use keystore::{Keystore, LocalKeystore};
pub use rpc::{ChainRpc, JsonRpcClient};
pub use session::{Permission, ReaperHandle, SweepReport};
