//! Response Cache Module
//!
//! Caches model responses keyed by the content hash of the input together
//! with the model configuration that produced them.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::cache::key::content_key;
use crate::cache::{BoundedCache, CacheStats, SharedCache};
use crate::error::Result;

/// Default number of cached responses.
pub const DEFAULT_MAX_SIZE: usize = 500;
/// Default response lifetime (2 hours).
pub const DEFAULT_TTL: Duration = Duration::from_secs(2 * 60 * 60);

// == Response Cache ==
/// Cache of model responses.
///
/// Cloning yields another handle onto the same underlying cache.
#[derive(Debug, Clone)]
pub struct ResponseCache<V = Value> {
    inner: SharedCache<V>,
}

impl<V> ResponseCache<V>
where
    V: Clone + Serialize + Send + Sync + 'static,
{
    /// Creates a response cache with the default capacity and TTL.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_SIZE, DEFAULT_TTL)
    }

    pub fn with_capacity(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(BoundedCache::new(max_size, ttl))),
        }
    }

    // == Key ==
    /// Derives the cache key for an input under a model configuration.
    pub fn key_for<I, C>(input: &I, model_config: &C) -> Result<String>
    where
        I: Serialize + ?Sized,
        C: Serialize + ?Sized,
    {
        content_key(&(input, model_config))
    }

    pub async fn get<I, C>(&self, input: &I, model_config: &C) -> Result<Option<V>>
    where
        I: Serialize + ?Sized,
        C: Serialize + ?Sized,
    {
        let key = Self::key_for(input, model_config)?;
        Ok(self.inner.write().await.get(&key))
    }

    pub async fn set<I, C>(&self, input: &I, model_config: &C, response: V) -> Result<()>
    where
        I: Serialize + ?Sized,
        C: Serialize + ?Sized,
    {
        let key = Self::key_for(input, model_config)?;
        self.inner.write().await.set(key, response);
        Ok(())
    }

    pub async fn has<I, C>(&self, input: &I, model_config: &C) -> Result<bool>
    where
        I: Serialize + ?Sized,
        C: Serialize + ?Sized,
    {
        let key = Self::key_for(input, model_config)?;
        Ok(self.inner.write().await.has(&key))
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }

    pub async fn remove_expired(&self) -> usize {
        self.inner.write().await.remove_expired()
    }

    /// Returns the shared handle used by the cache manager's registry.
    pub fn shared(&self) -> SharedCache<V> {
        Arc::clone(&self.inner)
    }
}

impl<V> Default for ResponseCache<V>
where
    V: Clone + Serialize + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
