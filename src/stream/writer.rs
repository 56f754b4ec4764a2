//! Result Writer Module
//!
//! Buffers results and hands them to a caller-supplied writer in chunks.
//! Failed flushes keep the buffer intact; retrying is up to the caller.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{BoxError, PerfError, Result};

/// Counters for a [`ResultWriter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterStats {
    /// Results waiting for the next flush
    pub buffered: usize,
    /// Successful flushes
    pub flushes: u64,
    /// Results handed to a writer that succeeded
    pub items_written: u64,
    /// Failed flushes
    pub errors: u64,
}

// == Result Writer ==
#[derive(Debug)]
pub struct ResultWriter<T> {
    batch_size: usize,
    buffer: Vec<T>,
    flushes: u64,
    items_written: u64,
    errors: u64,
}

impl<T: Clone> ResultWriter<T> {
    /// Creates a writer that flushes every `batch_size` results (minimum 1).
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            buffer: Vec::with_capacity(batch_size),
            flushes: 0,
            items_written: 0,
            errors: 0,
        }
    }

    // == Write ==
    /// Buffers a result, flushing once the buffer reaches `batch_size`.
    pub async fn write<F, Fut, E>(&mut self, item: T, writer: &F) -> Result<()>
    where
        F: Fn(Vec<T>) -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
        E: Into<BoxError>,
    {
        self.buffer.push(item);
        if self.buffer.len() >= self.batch_size {
            self.flush(writer).await?;
        }
        Ok(())
    }

    pub async fn write_many<I, F, Fut, E>(&mut self, items: I, writer: &F) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        F: Fn(Vec<T>) -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
        E: Into<BoxError>,
    {
        for item in items {
            self.write(item, writer).await?;
        }
        Ok(())
    }

    // == Flush ==
    /// Sends a snapshot of the buffer to `writer`.
    ///
    /// On success the buffer is cleared; on failure it is kept and the error
    /// counter incremented. Flushing an empty buffer does nothing.
    pub async fn flush<F, Fut, E>(&mut self, writer: &F) -> Result<()>
    where
        F: Fn(Vec<T>) -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
        E: Into<BoxError>,
    {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let pending = self.buffer.len();
        match writer(self.buffer.clone()).await {
            Ok(()) => {
                self.buffer.clear();
                self.flushes += 1;
                self.items_written += pending as u64;
                debug!(pending, flushes = self.flushes, "Flushed results");
                Ok(())
            }
            Err(err) => {
                self.errors += 1;
                let source: BoxError = err.into();
                error!(pending, error = %source, "Result flush failed; buffer kept");
                Err(PerfError::FlushFailed { pending, source })
            }
        }
    }

    /// Results currently buffered.
    pub fn buffered(&self) -> &[T] {
        &self.buffer
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn stats(&self) -> WriterStats {
        WriterStats {
            buffered: self.buffer.len(),
            flushes: self.flushes,
            items_written: self.items_written,
            errors: self.errors,
        }
    }
}
