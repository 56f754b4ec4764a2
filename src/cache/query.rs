//! Query Cache Module
//!
//! Short-lived cache for query results, keyed by the content hash of the
//! query text and its parameters, with pattern-based invalidation.

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::key::content_key;
use crate::cache::size::estimate_size;
use crate::cache::{BoundedCache, CacheStats, SharedCache};
use crate::error::Result;

/// Default number of cached query results.
pub const DEFAULT_MAX_SIZE: usize = 200;
/// Default query-result lifetime (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

// == Key Pattern ==
/// Matcher used by [`QueryCache::invalidate`].
#[derive(Debug, Clone)]
pub enum KeyPattern {
    /// Matches a derived key or query text exactly
    Exact(String),
    /// Matches when the regex finds a match in the derived key or query text
    Regex(Regex),
}

impl KeyPattern {
    /// Compiles a regex pattern.
    pub fn regex(pattern: &str) -> Result<Self> {
        Ok(Self::Regex(Regex::new(pattern)?))
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            KeyPattern::Exact(expected) => expected == text,
            KeyPattern::Regex(re) => re.is_match(text),
        }
    }
}

impl From<&str> for KeyPattern {
    fn from(s: &str) -> Self {
        KeyPattern::Exact(s.to_string())
    }
}

impl From<Regex> for KeyPattern {
    fn from(re: Regex) -> Self {
        KeyPattern::Regex(re)
    }
}

// == Cached Query ==
/// Stored value: the result plus the query text it answers.
#[derive(Debug, Clone, Serialize)]
pub struct CachedQuery<V> {
    pub query: String,
    pub result: V,
}

// == Query Cache ==
#[derive(Debug, Clone)]
pub struct QueryCache<V = Value> {
    inner: SharedCache<CachedQuery<V>>,
}

impl<V> QueryCache<V>
where
    V: Clone + Serialize + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_SIZE, DEFAULT_TTL)
    }

    pub fn with_capacity(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(BoundedCache::new(max_size, ttl))),
        }
    }

    /// Derives the cache key for a query and its parameters.
    pub fn key_for<P: Serialize + ?Sized>(query: &str, params: &P) -> Result<String> {
        content_key(&(query, params))
    }

    pub async fn get<P: Serialize + ?Sized>(&self, query: &str, params: &P) -> Result<Option<V>> {
        let key = Self::key_for(query, params)?;
        Ok(self.inner.write().await.get(&key).map(|cached| cached.result))
    }

    pub async fn set<P: Serialize + ?Sized>(&self, query: &str, params: &P, result: V) -> Result<()> {
        let key = Self::key_for(query, params)?;
        // Memory usage counts the result only, not the stored query text
        let size_bytes = estimate_size(&result);
        let cached = CachedQuery {
            query: query.to_string(),
            result,
        };
        self.inner.write().await.set_sized(key, cached, size_bytes);
        Ok(())
    }

    pub async fn has<P: Serialize + ?Sized>(&self, query: &str, params: &P) -> Result<bool> {
        let key = Self::key_for(query, params)?;
        Ok(self.inner.write().await.has(&key))
    }

    // == Invalidate ==
    /// Deletes every entry whose derived key or query text matches `pattern`.
    ///
    /// Returns the number of entries removed.
    pub async fn invalidate(&self, pattern: &KeyPattern) -> usize {
        let removed = self
            .inner
            .write()
            .await
            .remove_where(|key, entry| pattern.matches(key) || pattern.matches(&entry.value.query));
        debug!(removed, "Query cache invalidation");
        removed
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

    pub fn shared(&self) -> SharedCache<CachedQuery<V>> {
        Arc::clone(&self.inner)
    }
}

impl<V> Default for QueryCache<V>
where
    V: Clone + Serialize + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
