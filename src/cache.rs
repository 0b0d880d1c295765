//! In-process response cache.
//!
//! ## Eviction
//!
//! Entries expire individually after the TTL and are invisible once expired.
//! Expired entries are purged on insert; if the cache is still full, the
//! oldest inserted entry is evicted.

use crate::clock::Clock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// Default number of cached records.
pub const DEFAULT_CAPACITY: usize = 128;

/// Default time-to-live per record.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Capacity-bounded key/value store with per-entry expiry.
pub struct TtlCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    capacity: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty cache. A zero capacity stores nothing.
    pub fn new(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { entries: HashMap::new(), capacity, ttl, clock }
    }

    fn is_expired(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        now.duration_since(entry.inserted_at) >= self.ttl
    }

    /// Returns a fresh value for `key`, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        self.entries
            .get(key)
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| entry.value.clone())
    }

    /// Stores `value`, replacing any previous value for `key`.
    pub fn insert(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }

        let now = self.clock.now();
        self.purge_expired(now);

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        self.entries.insert(key, CacheEntry { value, inserted_at: now });
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn purge_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| now.duration_since(entry.inserted_at) < ttl);

        let purged = before - self.entries.len();
        if purged > 0 {
            trace!("Purged {} expired cache entries", purged);
        }
    }

    fn evict_oldest(&mut self) {
        let oldest =
            self.entries.iter().min_by_key(|(_, entry)| entry.inserted_at).map(|(k, _)| k.clone());

        if let Some(key) = oldest {
            trace!("Cache full, evicting oldest entry");
            self.entries.remove(&key);
        }
    }
}
