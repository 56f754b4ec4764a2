//! Cache Module
//!
//! Provides bounded in-memory caching with TTL expiration and LRU eviction,
//! the three specialized caches built on it, and the manager that sweeps them.

mod entry;
mod lru;
mod stats;
mod store;

pub mod embedding;
pub mod key;
pub mod manager;
pub mod query;
pub mod response;
pub mod size;


use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use embedding::{Embedding, EmbeddingCache};
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use manager::{CacheManager, CacheRegistry, ManagedCache};
pub use query::{CachedQuery, KeyPattern, QueryCache};
pub use response::ResponseCache;
pub use stats::{CacheStats, StatsRecorder, ACCESS_TIME_WINDOW};
pub use store::BoundedCache;

/// A bounded cache keyed by content hash, shared between a specialized cache
/// and the manager's registry.
pub type SharedCache<V> = Arc<RwLock<BoundedCache<String, V>>>;
