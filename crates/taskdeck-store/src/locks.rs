//! Async per-key locks
//!
//! Serializes work on one key (a task group, a project's grant set) while
//! letting unrelated keys proceed in parallel. Multi-key acquisition always
//! locks in ascending key order, so two callers locking overlapping sets
//! cannot deadlock.

use crate::error::StoreError;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;

/// Lazily created mutex per key
#[derive(Debug)]
pub struct KeyedLocks<K: Eq + Hash> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Ord + Copy + Display,
{
    /// Create empty lock table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `key`, waiting at most `timeout`
    ///
    /// # Errors
    /// `StoreError::LockTimeout` if the lock is still held when the wait ends.
    pub async fn acquire(&self, key: K, timeout: Duration) -> Result<OwnedMutexGuard<()>, StoreError> {
        let lock = self.locks.entry(key).or_default().clone();
        tokio::time::timeout(timeout, lock.lock_owned())
            .await
            .map_err(|_| {
                tracing::warn!("lock wait on {} timed out", key);
                StoreError::LockTimeout {
                    key: key.to_string(),
                    waited_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                }
            })
    }

    /// Lock every key in ascending order within one overall `timeout`
    ///
    /// Duplicate keys are locked once.
    ///
    /// # Errors
    /// `StoreError::LockTimeout`; locks taken so far are released.
    pub async fn acquire_all(
        &self,
        keys: impl IntoIterator<Item = K>,
        timeout: Duration,
    ) -> Result<Vec<OwnedMutexGuard<()>>, StoreError> {
        let keys: BTreeSet<K> = keys.into_iter().collect();
        let deadline = Instant::now() + timeout;
        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            let remaining = deadline.saturating_duration_since(Instant::now());
            guards.push(self.acquire(key, remaining).await?);
        }
        Ok(guards)
    }

    /// Number of keys ever locked
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// No key locked yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
