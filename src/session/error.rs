//! Session lookup errors

use super::tokens::Permission;
use thiserror::Error;

/// Failure of a store lookup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} expired")]
    Expired(String),
    #[error("Permission denied: token grants {granted}, operation requires {required}")]
    PermissionDenied {
        required: Permission,
        granted: Permission,
    },
}
