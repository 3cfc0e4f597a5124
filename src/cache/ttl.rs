//! Generic short-TTL keyed cache.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A thread-safe `HashMap` where every entry expires `ttl` after it was
/// written. Reads past expiry behave as a miss; expired entries are reaped
/// lazily on access, not by a background sweep, matching the "reads are
/// single-operation" contract.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, (V, Instant)>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Last-writer-wins insert.
    pub fn insert(&self, key: K, value: V) {
        self.entries.write().insert(key, (value, Instant::now()));
    }

    /// Returns `None` both for a missing key and for an expired one.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read();
        match entries.get(key) {
            Some((value, written_at)) if written_at.elapsed() < self.ttl => Some(value.clone()),
            _ => None,
        }
    }

    pub fn remove(&self, key: &K) {
        self.entries.write().remove(key);
    }

    /// Drop all entries whose TTL has elapsed. Call periodically to bound
    /// memory; never required for correctness since `get` already treats
    /// expired entries as absent.
    pub fn sweep_expired(&self) {
        let ttl = self.ttl;
        self.entries
            .write()
            .retain(|_, (_, written_at)| written_at.elapsed() < ttl);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
