//! Agent error taxonomy

use crate::core::{AddressError, UnitError};
use crate::keystore::KeystoreError;
use crate::rpc::RpcError;
use crate::session::{Permission, SessionError};
use thiserror::Error;

/// Errors returned by every custody agent operation
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Expired: {0}")]
    Expired(String),
    #[error("Permission denied: token grants {granted}, operation requires {required}")]
    PermissionDenied {
        required: Permission,
        granted: Permission,
    },
    #[error("Keystore error: {0}")]
    Keystore(#[from] KeystoreError),
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AgentError {
    /// Whether a collaborator (keystore or chain RPC) failed
    pub fn is_upstream(&self) -> bool {
        matches!(self, AgentError::Keystore(_) | AgentError::Rpc(_))
    }
}

impl From<SessionError> for AgentError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(what) => AgentError::NotFound(what),
            SessionError::Expired(what) => AgentError::Expired(what),
            SessionError::PermissionDenied { required, granted } => {
                AgentError::PermissionDenied { required, granted }
            }
        }
    }
}

impl From<UnitError> for AgentError {
    fn from(err: UnitError) -> Self {
        AgentError::InvalidInput(err.to_string())
    }
}

impl From<AddressError> for AgentError {
    fn from(err: AddressError) -> Self {
        AgentError::InvalidInput(err.to_string())
    }
}
