//! Bounded Cache Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and TTL expiration.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::cache::size::estimate_size;
use crate::cache::{CacheEntry, CacheStats, LruTracker, StatsRecorder};

// == Bounded Cache ==
/// Capacity-bounded key/value store with a single TTL for every entry.
///
/// Expired entries are dropped lazily by `get`/`has` and actively by
/// `remove_expired`. When full, inserting a new key evicts the least
/// recently accessed entry.
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker<K>,
    /// Performance counters
    stats: StatsRecorder,
    /// Running sum of `size_bytes` across live entries
    memory_usage: usize,
    /// Maximum number of entries allowed
    max_size: usize,
    /// Maximum entry age
    ttl: Duration,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone + Serialize,
{
    // == Constructor ==
    /// Creates a new cache. A `max_size` of 0 is treated as 1.
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: StatsRecorder::new(),
            memory_usage: 0,
            max_size: max_size.max(1),
            ttl,
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let started = Instant::now();
        let value = self.lookup(key, started);
        self.stats.record_access_time(started.elapsed());
        value
    }

    fn lookup(&mut self, key: &K, now: Instant) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(self.ttl, now),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_miss();
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        entry.touch(now);
        let value = entry.value.clone();
        self.lru.touch(key);
        self.stats.record_hit();
        Some(value)
    }

    // == Set ==
    /// Stores a value, replacing any previous value and timestamps for `key`.
    ///
    /// If the key is new and the cache is full, exactly one entry is evicted
    /// first.
    pub fn set(&mut self, key: K, value: V) {
        let size_bytes = estimate_size(&value);
        self.set_sized(key, value, size_bytes);
    }

    /// Like [`set`](Self::set), but charges `size_bytes` to memory usage
    /// instead of estimating the stored value.
    ///
    /// Used by wrappers that store metadata alongside the cached value.
    pub fn set_sized(&mut self, key: K, value: V, size_bytes: usize) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            self.evict_one();
        }

        let entry = CacheEntry::new(value, size_bytes);
        self.memory_usage += entry.size_bytes;
        if let Some(previous) = self.entries.insert(key.clone(), entry) {
            self.memory_usage = self.memory_usage.saturating_sub(previous.size_bytes);
        }
        self.lru.touch(&key);
    }

    // == Has ==
    /// Checks for a live entry without touching access metadata or counters.
    ///
    /// An expired entry is removed as a side effect.
    pub fn has(&mut self, key: &K) -> bool {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(self.ttl, Instant::now()),
            None => return false,
        };

        if expired {
            self.remove_entry(key);
            false
        } else {
            true
        }
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether an entry was present.
    pub fn delete(&mut self, key: &K) -> bool {
        self.remove_entry(key).is_some()
    }

    /// Removes every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.memory_usage = 0;
    }

    // == Remove Expired ==
    /// Removes all entries older than the TTL.
    ///
    /// Returns the number of entries removed.
    pub fn remove_expired(&mut self) -> usize {
        let now = Instant::now();
        let ttl = self.ttl;
        self.remove_where(|_, entry| entry.is_expired(ttl, now))
    }

    // == Remove Where ==
    /// Removes every entry matching `predicate`, returning how many were removed.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&K, &CacheEntry<V>) -> bool,
    {
        let doomed: Vec<K> = self
            .entries
            .iter()
            .filter(|(key, entry)| predicate(key, entry))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &doomed {
            self.remove_entry(key);
        }
        doomed.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats
            .snapshot(self.entries.len(), self.max_size, self.memory_usage)
    }

    /// Returns the keys of all stored entries, expired or not.
    pub fn keys(&self) -> Vec<K> {
        self.entries.keys().cloned().collect()
    }

    /// Returns the entry for `key` without touching metadata or expiry.
    pub fn peek(&self, key: &K) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn evict_one(&mut self) {
        if let Some(evicted) = self.lru.evict_oldest() {
            if let Some(entry) = self.entries.remove(&evicted) {
                self.memory_usage = self.memory_usage.saturating_sub(entry.size_bytes);
            }
            self.stats.record_eviction();
            debug!(size = self.entries.len(), "Evicted least recently accessed entry");
        }
    }

    fn remove_entry(&mut self, key: &K) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.memory_usage = self.memory_usage.saturating_sub(entry.size_bytes);
        Some(entry)
    }
}
