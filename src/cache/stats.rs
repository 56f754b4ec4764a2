//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, evictions and
//! access latency.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of most recent `get` timings kept for the rolling average.
pub const ACCESS_TIME_WINDOW: usize = 1000;

// == Cache Stats ==
/// Point-in-time snapshot of a cache's performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// hits / (hits + misses), 0.0 when no requests were made
    pub hit_rate: f64,
    /// Current number of live entries
    pub size: usize,
    /// Configured capacity
    pub max_size: usize,
    /// Number of entries evicted due to the LRU policy
    pub evictions: u64,
    /// Sum of estimated entry sizes in bytes
    pub memory_usage: usize,
    /// Rolling average `get` latency in milliseconds
    pub avg_access_time_ms: f64,
}

impl CacheStats {
    /// Total number of lookups observed.
    pub fn requests(&self) -> u64 {
        self.hits + self.misses
    }
}

// == Stats Recorder ==
/// Mutable counters owned by a cache; snapshotted into [`CacheStats`].
#[derive(Debug, Default)]
pub struct StatsRecorder {
    hits: u64,
    misses: u64,
    evictions: u64,
    access_times: VecDeque<Duration>,
    access_time_sum: Duration,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Record Access Time ==
    /// Adds a `get` timing, dropping the oldest once the window is full.
    pub fn record_access_time(&mut self, elapsed: Duration) {
        if self.access_times.len() == ACCESS_TIME_WINDOW {
            if let Some(oldest) = self.access_times.pop_front() {
                self.access_time_sum = self.access_time_sum.saturating_sub(oldest);
            }
        }
        self.access_times.push_back(elapsed);
        self.access_time_sum += elapsed;
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn avg_access_time_ms(&self) -> f64 {
        match self.access_samples() {
            0 => 0.0,
            samples => self.access_time_sum.as_secs_f64() * 1000.0 / samples as f64,
        }
    }

    /// Samples currently in the rolling window.
    pub fn access_samples(&self) -> usize {
        self.access_times.len()
    }

    // == Snapshot ==
    /// Builds a [`CacheStats`] with the live-entry figures supplied by the cache.
    pub fn snapshot(&self, size: usize, max_size: usize, memory_usage: usize) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            hit_rate: self.hit_rate(),
            size,
            max_size,
            evictions: self.evictions,
            memory_usage,
            avg_access_time_ms: self.avg_access_time_ms(),
        }
    }
}
