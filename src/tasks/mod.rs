//! Background Tasks Module
//!
//! Contains background tasks that run periodically while caches are live.
//!
//! # Tasks
//! - Cache cleanup: sweeps expired entries from every registered cache

mod cleanup;

pub use cleanup::spawn_cleanup_task;
