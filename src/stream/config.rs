//! Stream configuration and statistics.

use serde::{Deserialize, Serialize};

/// Tuning knobs for a [`DatasetStream`](super::DatasetStream).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Items drained per batch
    pub batch_size: usize,
    /// Estimated buffered bytes above which the stream pauses itself
    pub max_memory_bytes: usize,
    /// Buffered items above which pushes are rejected
    pub buffer_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_memory_bytes: 100 * 1024 * 1024,
            buffer_capacity: 1000,
        }
    }
}

impl StreamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_memory_bytes(mut self, bytes: usize) -> Self {
        self.max_memory_bytes = bytes;
        self
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }
}

/// Point-in-time snapshot of a stream's counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamStats {
    /// Items handed to batch functions that completed successfully
    pub items_processed: u64,
    /// Items currently buffered
    pub buffered: usize,
    /// Estimated bytes currently buffered
    pub memory_bytes: usize,
    /// Pushes rejected because the buffer was full
    pub backpressure_events: u64,
    /// Rolling average batch time in milliseconds
    pub avg_batch_time_ms: f64,
    /// Items processed per second since the stream was created
    pub throughput: f64,
    pub paused: bool,
}
