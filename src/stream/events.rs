//! Typed stream notifications.
//!
//! A stream publishes [`StreamEvent`]s onto a caller-supplied bounded
//! channel. Publishing never blocks: when the channel is full or closed the
//! notification is dropped.

use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent<T> {
    /// A push was rejected because the buffer was at capacity
    Backpressure { buffered: usize, capacity: usize },
    /// Buffered memory went over the configured ceiling
    MemoryPressure { memory_bytes: usize, limit: usize },
    /// The stream stopped draining
    Paused,
    /// The stream resumed draining
    Resumed,
    /// A batch function returned successfully
    BatchComplete { size: usize, elapsed: Duration },
    /// A batch function failed; carries the batch it was given
    BatchError { batch: Vec<T>, error: String },
}

/// Optional sending half used by a stream to publish events.
#[derive(Debug)]
pub(crate) struct EventSink<T> {
    tx: Option<mpsc::Sender<StreamEvent<T>>>,
}

impl<T> EventSink<T> {
    pub(crate) fn none() -> Self {
        Self { tx: None }
    }

    pub(crate) fn new(tx: mpsc::Sender<StreamEvent<T>>) -> Self {
        Self { tx: Some(tx) }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    pub(crate) fn emit(&self, event: StreamEvent<T>) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => debug!("Stream event queue full; notification dropped"),
            Err(TrySendError::Closed(_)) => debug!("Stream event receiver closed; notification dropped"),
        }
    }
}
