//! Session state
//!
//! The three expiring stores behind the custody agent and the reaper that
//! sweeps them:
//! - Secret store: cached unlock passphrases
//! - Token registry: permission-scoped capability tokens
//! - Transaction queue: signed transactions awaiting broadcast
//!
//! Each store guards its map with its own mutex. Expiry is checked on every
//! read, so an entry is unusable the moment it expires even if the reaper
//! has not run yet.

pub mod clock;
pub mod error;
pub mod queue;
pub mod reaper;
pub mod secrets;
pub mod tokens;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SessionError;
pub use queue::{TransactionQueue, DEFAULT_TRANSACTION_TTL_SECS};
pub use reaper::{Reaper, ReaperHandle, SweepReport, DEFAULT_SWEEP_INTERVAL_SECS};
pub use secrets::{ExpiredSecret, SecretStore, DEFAULT_PASSPHRASE_TTL_SECS};
pub use tokens::{Permission, TokenRegistry};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a store map, recovering from poisoning
///
/// Every mutation is a single map call, so a panicking holder cannot leave
/// the map half-updated.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
