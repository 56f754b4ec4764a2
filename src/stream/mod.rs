//! Stream Module
//!
//! Backpressure-aware buffering for evaluation workloads.
//!
//! # Components
//! - [`DatasetStream`]: bounded FIFO buffer drained in batches
//! - [`BatchProcessor`]: queues test cases and collects executor results
//! - [`ResultWriter`]: buffers results and flushes them in chunks
//! - [`StreamEvent`]: typed notifications published on a caller-supplied channel

mod config;
mod dataset;
mod events;
mod processor;
mod writer;

pub use config::{StreamConfig, StreamStats};
pub use dataset::{DatasetStream, BATCH_TIME_WINDOW};
pub use events::StreamEvent;
pub use processor::BatchProcessor;
pub use writer::{ResultWriter, WriterStats};
