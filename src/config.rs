//! Configuration Module
//!
//! Handles loading cache, cleanup and stream settings from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{embedding, query, response};
use crate::stream::StreamConfig;

/// Capacity and lifetime of one cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub max_size: usize,
    pub ttl: Duration,
}

/// Toolkit configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub response_cache: CacheSettings,
    pub embedding_cache: CacheSettings,
    pub query_cache: CacheSettings,
    /// Interval between background expiry sweeps
    pub cleanup_interval: Duration,
    /// Defaults for dataset streams
    pub stream: StreamConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `RESPONSE_CACHE_MAX_SIZE` / `RESPONSE_CACHE_TTL_SECS` (default: 500 / 7200)
    /// - `EMBEDDING_CACHE_MAX_SIZE` / `EMBEDDING_CACHE_TTL_SECS` (default: 1000 / 86400)
    /// - `QUERY_CACHE_MAX_SIZE` / `QUERY_CACHE_TTL_SECS` (default: 200 / 300)
    /// - `CACHE_CLEANUP_INTERVAL_MS` - Sweep frequency (default: 60000)
    /// - `STREAM_BATCH_SIZE` - Items per drained batch (default: 10)
    /// - `STREAM_MAX_MEMORY_BYTES` - Buffered memory that pauses a stream (default: 100 MiB)
    /// - `STREAM_BUFFER_CAPACITY` - Items buffered before backpressure (default: 1000)
    ///
    /// Unset or unparseable variables fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            response_cache: cache_from_env("RESPONSE_CACHE", defaults.response_cache),
            embedding_cache: cache_from_env("EMBEDDING_CACHE", defaults.embedding_cache),
            query_cache: cache_from_env("QUERY_CACHE", defaults.query_cache),
            cleanup_interval: Duration::from_millis(env_or(
                "CACHE_CLEANUP_INTERVAL_MS",
                defaults.cleanup_interval.as_millis() as u64,
            )),
            stream: StreamConfig {
                batch_size: env_or("STREAM_BATCH_SIZE", defaults.stream.batch_size),
                max_memory_bytes: env_or("STREAM_MAX_MEMORY_BYTES", defaults.stream.max_memory_bytes),
                buffer_capacity: env_or("STREAM_BUFFER_CAPACITY", defaults.stream.buffer_capacity),
            },
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn cache_from_env(prefix: &str, defaults: CacheSettings) -> CacheSettings {
    CacheSettings {
        max_size: env_or(&format!("{}_MAX_SIZE", prefix), defaults.max_size),
        ttl: Duration::from_secs(env_or(
            &format!("{}_TTL_SECS", prefix),
            defaults.ttl.as_secs(),
        )),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            response_cache: CacheSettings {
                max_size: response::DEFAULT_MAX_SIZE,
                ttl: response::DEFAULT_TTL,
            },
            embedding_cache: CacheSettings {
                max_size: embedding::DEFAULT_MAX_SIZE,
                ttl: embedding::DEFAULT_TTL,
            },
            query_cache: CacheSettings {
                max_size: query::DEFAULT_MAX_SIZE,
                ttl: query::DEFAULT_TTL,
            },
            cleanup_interval: Duration::from_secs(60),
            stream: StreamConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.response_cache.max_size, 500);
        assert_eq!(config.response_cache.ttl, Duration::from_secs(7200));
        assert_eq!(config.embedding_cache.max_size, 1000);
        assert_eq!(config.embedding_cache.ttl, Duration::from_secs(86400));
        assert_eq!(config.query_cache.max_size, 200);
        assert_eq!(config.query_cache.ttl, Duration::from_secs(300));
        assert_eq!(config.cleanup_interval, Duration::from_secs(60));
        assert_eq!(config.stream.batch_size, 10);
    }

    #[test]
    fn test_config_from_env_overrides_and_fallbacks() {
        env::set_var("QUERY_CACHE_MAX_SIZE", "42");
        env::set_var("QUERY_CACHE_TTL_SECS", "not-a-number");
        env::remove_var("STREAM_BUFFER_CAPACITY");

        let config = Config::from_env();
        assert_eq!(config.query_cache.max_size, 42);
        assert_eq!(config.query_cache.ttl, Duration::from_secs(300));
        assert_eq!(config.stream.buffer_capacity, 1000);

        env::remove_var("QUERY_CACHE_MAX_SIZE");
        env::remove_var("QUERY_CACHE_TTL_SECS");
    }
}
