//! Custody agent
//!
//! The façade the request layer talks to: account creation and import,
//! capability tokens, chain queries and the two-step sign-then-broadcast
//! flow.

pub mod custody;
pub mod error;

pub use custody::CustodyAgent;
pub use error::AgentError;
