//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with access metadata.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// Represents a single cache entry with value and bookkeeping metadata.
///
/// All timestamps come from the monotonic clock, so expiry is immune to
/// wall-clock adjustments.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When the entry was inserted (or last overwritten)
    pub inserted_at: Instant,
    /// Estimated size of the value in bytes
    pub size_bytes: usize,
    /// Number of successful reads
    pub access_count: u64,
    /// Last successful read, or insertion time if never read
    pub last_accessed_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped with the current instant.
    pub fn new(value: V, size_bytes: usize) -> Self {
        let now = Instant::now();
        Self {
            value,
            inserted_at: now,
            size_bytes,
            access_count: 0,
            last_accessed_at: now,
        }
    }

    // == Age ==
    /// Time elapsed since insertion, measured against `now`.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.inserted_at)
    }

    // == Is Expired ==
    /// Checks if the entry is older than `ttl`.
    ///
    /// Boundary condition: an entry whose age equals the TTL exactly is still
    /// live; only a strictly greater age expires it.
    pub fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        self.age(now) > ttl
    }

    // == Touch ==
    /// Records a successful read.
    pub fn touch(&mut self, now: Instant) {
        self.access_count += 1;
        self.last_accessed_at = now.max(self.inserted_at);
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, `Duration::ZERO` once expired.
    #[allow(dead_code)]
    pub fn ttl_remaining(&self, ttl: Duration, now: Instant) -> Duration {
        ttl.saturating_sub(self.age(now))
    }
}
