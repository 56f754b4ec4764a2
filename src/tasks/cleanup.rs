//! TTL Cleanup Task
//!
//! Background task that periodically removes expired entries from every
//! registered cache.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheRegistry;

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between
/// sweeps. The registry is re-read on every sweep, so caches registered
/// after the task starts are picked up.
///
/// # Returns
/// A JoinHandle for the spawned task; abort it to stop sweeping.
///
/// # Example
/// ```ignore
/// let registry = CacheRegistry::new();
/// let cleanup_handle = spawn_cleanup_task(registry.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(registry: CacheRegistry, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting cache cleanup task with interval of {}ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let mut removed = 0;
            for (name, cache) in registry.snapshot() {
                let swept = cache.remove_expired().await;
                if swept > 0 {
                    debug!(cache = %name, swept, "Swept expired entries");
                }
                removed += swept;
            }

            if removed > 0 {
                info!("Cache cleanup: removed {} expired entries", removed);
            } else {
                debug!("Cache cleanup: no expired entries found");
            }
        }
    })
}
