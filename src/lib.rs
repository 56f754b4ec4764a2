//! Eval Perf - Caching, streaming and benchmarking for evaluation pipelines
//!
//! Provides bounded TTL/LRU caches for model responses, embeddings and
//! queries, backpressure-aware dataset streams, and a micro-benchmark harness.

pub mod bench;
pub mod cache;
pub mod config;
pub mod error;
pub mod stream;
pub mod tasks;

pub use cache::CacheManager;
pub use config::Config;
pub use error::{PerfError, Result};
pub use tasks::spawn_cleanup_task;
