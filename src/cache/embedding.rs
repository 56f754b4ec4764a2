//! Embedding Cache Module
//!
//! Embeddings are expensive to recompute, so they are retained much longer
//! than responses. Keys are the SHA-256 of the raw text.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::cache::key::text_key;
use crate::cache::{BoundedCache, CacheStats, SharedCache};

/// Default number of cached embeddings.
pub const DEFAULT_MAX_SIZE: usize = 1000;
/// Default embedding lifetime (24 hours).
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A dense embedding vector.
pub type Embedding = Vec<f32>;

// == Embedding Cache ==
#[derive(Debug, Clone)]
pub struct EmbeddingCache {
    inner: SharedCache<Embedding>,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_SIZE, DEFAULT_TTL)
    }

    pub fn with_capacity(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(BoundedCache::new(max_size, ttl))),
        }
    }

    pub async fn get(&self, text: &str) -> Option<Embedding> {
        self.inner.write().await.get(&text_key(text))
    }

    pub async fn set(&self, text: &str, embedding: Embedding) {
        self.inner.write().await.set(text_key(text), embedding);
    }

    pub async fn has(&self, text: &str) -> bool {
        self.inner.write().await.has(&text_key(text))
    }

    // == Batch Get ==
    /// Looks up every text under one lock; misses map to `None`.
    pub async fn batch_get<S: AsRef<str>>(&self, texts: &[S]) -> HashMap<String, Option<Embedding>> {
        let mut cache = self.inner.write().await;
        texts
            .iter()
            .map(|text| {
                let text = text.as_ref();
                (text.to_string(), cache.get(&text_key(text)))
            })
            .collect()
    }

    // == Batch Set ==
    /// Stores every text/embedding pair under one lock.
    pub async fn batch_set<I>(&self, embeddings: I)
    where
        I: IntoIterator<Item = (String, Embedding)>,
    {
        let mut cache = self.inner.write().await;
        for (text, embedding) in embeddings {
            cache.set(text_key(&text), embedding);
        }
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

    pub fn shared(&self) -> SharedCache<Embedding> {
        Arc::clone(&self.inner)
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new()
    }
}
