//! Cache Manager Module
//!
//! Owns the response, embedding and query caches, keeps a name → cache
//! registry for bulk operations, and drives the periodic expiry sweep.
//!
//! The manager is an ordinary value: build it once at startup, wrap it in an
//! `Arc`, and hand that to every component that needs caching.

use std::collections::BTreeMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError, RwLock as StdRwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::{BoundedCache, CacheStats, EmbeddingCache, QueryCache, ResponseCache};
use crate::config::Config;
use crate::error::{PerfError, Result};
use crate::tasks::spawn_cleanup_task;

/// Registry name of the response cache.
pub const RESPONSE_CACHE: &str = "response";
/// Registry name of the embedding cache.
pub const EMBEDDING_CACHE: &str = "embedding";
/// Registry name of the query cache.
pub const QUERY_CACHE: &str = "query";

// == Managed Cache ==
/// Operations the manager performs on every registered cache.
#[async_trait]
pub trait ManagedCache: Send + Sync {
    async fn clear(&self);
    async fn remove_expired(&self) -> usize;
    async fn stats(&self) -> CacheStats;
}

#[async_trait]
impl<K, V> ManagedCache for RwLock<BoundedCache<K, V>>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Serialize + Send + Sync,
{
    async fn clear(&self) {
        self.write().await.clear();
    }

    async fn remove_expired(&self) -> usize {
        self.write().await.remove_expired()
    }

    async fn stats(&self) -> CacheStats {
        self.read().await.stats()
    }
}

// == Cache Registry ==
/// Shared name → cache map. Cloning shares the same map.
#[derive(Clone, Default)]
pub struct CacheRegistry {
    caches: Arc<StdRwLock<BTreeMap<String, Arc<dyn ManagedCache>>>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the cache registered under `name`.
    pub fn register(&self, name: impl Into<String>, cache: Arc<dyn ManagedCache>) {
        self.caches
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), cache);
    }

    /// Copies out the current entries so no lock is held across awaits.
    pub fn snapshot(&self) -> Vec<(String, Arc<dyn ManagedCache>)> {
        self.caches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, cache)| (name.clone(), Arc::clone(cache)))
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.caches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    // == Sweep ==
    /// Removes expired entries from every registered cache.
    pub async fn remove_expired_all(&self) -> usize {
        let mut removed = 0;
        for (_, cache) in self.snapshot() {
            removed += cache.remove_expired().await;
        }
        removed
    }
}

// == Cache Manager ==
pub struct CacheManager {
    response: ResponseCache,
    embedding: EmbeddingCache,
    query: QueryCache,
    registry: CacheRegistry,
    /// Handle of the running cleanup task, if any
    cleanup: Mutex<Option<JoinHandle<()>>>,
}

impl CacheManager {
    /// Creates a manager whose caches use their default capacities and TTLs.
    pub fn new() -> Self {
        Self::with_caches(ResponseCache::new(), EmbeddingCache::new(), QueryCache::new())
    }

    /// Creates a manager sized from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::with_caches(
            ResponseCache::with_capacity(config.response_cache.max_size, config.response_cache.ttl),
            EmbeddingCache::with_capacity(config.embedding_cache.max_size, config.embedding_cache.ttl),
            QueryCache::with_capacity(config.query_cache.max_size, config.query_cache.ttl),
        )
    }

    fn with_caches(response: ResponseCache, embedding: EmbeddingCache, query: QueryCache) -> Self {
        let registry = CacheRegistry::new();
        registry.register(RESPONSE_CACHE, response.shared());
        registry.register(EMBEDDING_CACHE, embedding.shared());
        registry.register(QUERY_CACHE, query.shared());

        Self {
            response,
            embedding,
            query,
            registry,
            cleanup: Mutex::new(None),
        }
    }

    pub fn response(&self) -> &ResponseCache {
        &self.response
    }

    pub fn embedding(&self) -> &EmbeddingCache {
        &self.embedding
    }

    pub fn query(&self) -> &QueryCache {
        &self.query
    }

    pub fn registry(&self) -> &CacheRegistry {
        &self.registry
    }

    /// Registers an additional cache for bulk clears, stats and sweeps.
    pub fn register(&self, name: impl Into<String>, cache: Arc<dyn ManagedCache>) {
        self.registry.register(name, cache);
    }

    // == Clear All ==
    pub async fn clear_all(&self) {
        for (_, cache) in self.registry.snapshot() {
            cache.clear().await;
        }
        info!("Cleared all registered caches");
    }

    // == All Stats ==
    /// Returns the stats of every registered cache keyed by name.
    pub async fn all_stats(&self) -> BTreeMap<String, CacheStats> {
        let mut all = BTreeMap::new();
        for (name, cache) in self.registry.snapshot() {
            all.insert(name, cache.stats().await);
        }
        all
    }

    pub async fn remove_expired_all(&self) -> usize {
        self.registry.remove_expired_all().await
    }

    // == Start Cleanup ==
    /// Starts the periodic expiry sweep, replacing any sweep already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_cleanup(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(PerfError::InvalidConfig(
                "cleanup interval must be greater than zero".to_string(),
            ));
        }

        let handle = spawn_cleanup_task(self.registry.clone(), interval);
        let previous = self
            .cleanup
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
            info!("Replaced running cache cleanup task");
        }
        Ok(())
    }

    // == Stop Cleanup ==
    pub fn stop_cleanup(&self) {
        if let Some(handle) = self
            .cleanup
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
            info!("Cache cleanup task stopped");
        }
    }

    pub fn is_cleanup_running(&self) -> bool {
        self.cleanup
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CacheManager {
    fn drop(&mut self) {
        if let Some(handle) = self
            .cleanup
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}
