//! Signed transactions awaiting broadcast
//!
//! Only signed material is ever queued. `take` is the single consumer of an
//! entry: once it succeeds the id is gone for good.

use super::{lock, Clock, SessionError};
use crate::core::SignedTransaction;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Default lifetime of a queued transaction, in seconds
pub const DEFAULT_TRANSACTION_TTL_SECS: i64 = 20 * 60;

/// Random bytes behind every queue identifier (128 bits)
pub const TX_ID_BYTES: usize = 16;

struct QueuedTransaction {
    signed: SignedTransaction,
    expires_at: DateTime<Utc>,
}

/// Thread-safe queue of signed transactions keyed by random id
pub struct TransactionQueue {
    pending: Mutex<HashMap<String, QueuedTransaction>>,
    clock: Arc<dyn Clock>,
}

impl TransactionQueue {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Store `signed` for `ttl` under a fresh id
    pub fn enqueue(&self, signed: SignedTransaction, ttl: Duration) -> String {
        let entry = QueuedTransaction {
            signed,
            expires_at: self.clock.now() + ttl,
        };

        let mut pending = lock(&self.pending);
        let tx_id = loop {
            let mut bytes = [0u8; TX_ID_BYTES];
            OsRng.fill_bytes(&mut bytes);
            let candidate = hex::encode(bytes);
            if !pending.contains_key(&candidate) {
                break candidate;
            }
        };
        log::debug!(
            "Queued transaction {} as {}",
            entry.signed.hash_hex(),
            tx_id
        );
        pending.insert(tx_id.clone(), entry);
        tx_id
    }

    /// Remove and return the transaction queued under `tx_id`
    ///
    /// Check and removal happen under one lock, so concurrent callers cannot
    /// both receive the same transaction. Expired entries stay for the reaper.
    pub fn take(&self, tx_id: &str) -> Result<SignedTransaction, SessionError> {
        let mut pending = lock(&self.pending);
        let entry = pending
            .get(tx_id)
            .ok_or_else(|| SessionError::NotFound(format!("transaction {}", tx_id)))?;
        if self.clock.now() >= entry.expires_at {
            return Err(SessionError::Expired(format!("transaction {}", tx_id)));
        }
        pending
            .remove(tx_id)
            .map(|entry| entry.signed)
            .ok_or_else(|| SessionError::NotFound(format!("transaction {}", tx_id)))
    }

    /// Copy of the queued transaction, without consuming it
    pub fn get(&self, tx_id: &str) -> Result<SignedTransaction, SessionError> {
        let pending = lock(&self.pending);
        let entry = pending
            .get(tx_id)
            .ok_or_else(|| SessionError::NotFound(format!("transaction {}", tx_id)))?;
        if self.clock.now() >= entry.expires_at {
            return Err(SessionError::Expired(format!("transaction {}", tx_id)));
        }
        Ok(entry.signed.clone())
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut pending = lock(&self.pending);
        let before = pending.len();
        pending.retain(|_, entry| now < entry.expires_at);
        before - pending.len()
    }

    pub fn len(&self) -> usize {
        lock(&self.pending).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transaction;
    use crate::crypto::KeyPair;
    use crate::session::ManualClock;
    use std::thread;

    fn signed_tx() -> SignedTransaction {
        let key = KeyPair::generate();
        Transaction::new(0, key.address(), 1, 21_000, 1)
            .sign(&key, 1)
            .unwrap()
    }

    fn setup() -> (Arc<ManualClock>, TransactionQueue) {
        let clock = Arc::new(ManualClock::default());
        let queue = TransactionQueue::new(clock.clone());
        (clock, queue)
    }

    #[test]
    fn test_take_exactly_once() {
        let (_, queue) = setup();
        let signed = signed_tx();
        let tx_id = queue.enqueue(signed.clone(), Duration::minutes(20));

        assert_eq!(queue.take(&tx_id).unwrap(), signed);
        assert!(matches!(queue.take(&tx_id), Err(SessionError::NotFound(_))));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_get_does_not_consume() {
        let (_, queue) = setup();
        let signed = signed_tx();
        let tx_id = queue.enqueue(signed.clone(), Duration::minutes(20));

        assert_eq!(queue.get(&tx_id).unwrap(), signed);
        assert_eq!(queue.take(&tx_id).unwrap(), signed);
    }

    #[test]
    fn test_take_expired() {
        let (clock, queue) = setup();
        let tx_id = queue.enqueue(signed_tx(), Duration::minutes(20));
        clock.advance(Duration::minutes(20));

        assert!(matches!(queue.take(&tx_id), Err(SessionError::Expired(_))));
        assert!(matches!(queue.get(&tx_id), Err(SessionError::Expired(_))));
    }

    #[test]
    fn test_sweep_then_take() {
        let (clock, queue) = setup();
        let tx_id = queue.enqueue(signed_tx(), Duration::minutes(20));
        clock.advance(Duration::minutes(21));

        assert_eq!(queue.purge_expired(), 1);
        assert!(matches!(queue.take(&tx_id), Err(SessionError::NotFound(_))));
    }

    #[test]
    fn test_concurrent_take_single_winner() {
        let (_, queue) = setup();
        let queue = Arc::new(queue);
        let tx_id = queue.enqueue(signed_tx(), Duration::minutes(20));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = queue.clone();
                let tx_id = tx_id.clone();
                thread::spawn(move || queue.take(&tx_id).is_ok())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
