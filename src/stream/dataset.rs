//! Dataset Stream Module
//!
//! Bounded FIFO buffer with backpressure, memory-pressure pausing and
//! cooperative batched draining.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::cache::size::estimate_size;
use crate::error::{BoxError, PerfError, Result};
use crate::stream::events::EventSink;
use crate::stream::{StreamConfig, StreamEvent, StreamStats};

/// Number of most recent batch timings kept for the rolling average.
pub const BATCH_TIME_WINDOW: usize = 100;

#[derive(Debug)]
struct StreamState<T> {
    /// Buffered items with their estimated sizes
    buffer: VecDeque<(T, usize)>,
    memory_bytes: usize,
    paused: bool,
    items_processed: u64,
    backpressure_events: u64,
    batch_times: VecDeque<Duration>,
}

impl<T> StreamState<T> {
    fn new() -> Self {
        Self {
            buffer: VecDeque::new(),
            memory_bytes: 0,
            paused: false,
            items_processed: 0,
            backpressure_events: 0,
            batch_times: VecDeque::new(),
        }
    }

    fn record_batch(&mut self, size: usize, elapsed: Duration) {
        if self.batch_times.len() == BATCH_TIME_WINDOW {
            self.batch_times.pop_front();
        }
        self.batch_times.push_back(elapsed);
        self.items_processed += size as u64;
    }

    fn take_batch(&mut self, batch_size: usize) -> Vec<T> {
        let n = batch_size.min(self.buffer.len());
        let mut batch = Vec::with_capacity(n);
        for (item, size) in self.buffer.drain(..n) {
            self.memory_bytes = self.memory_bytes.saturating_sub(size);
            batch.push(item);
        }
        batch
    }
}

// == Dataset Stream ==
/// A bounded buffer of work items drained in FIFO batches.
///
/// All methods take `&self`, so items may be pushed (and the stream paused)
/// while a `process` call is awaiting a batch. Share it behind an `Arc`.
///
/// The stream starts active. Memory pressure pauses it; only `resume`
/// reactivates it.
#[derive(Debug)]
pub struct DatasetStream<T> {
    config: StreamConfig,
    state: Mutex<StreamState<T>>,
    events: EventSink<T>,
    created_at: Instant,
}

impl<T> DatasetStream<T>
where
    T: Serialize + Clone,
{
    /// Creates a stream without event notifications. A `batch_size` of 0 is treated as 1.
    pub fn new(config: StreamConfig) -> Self {
        Self::build(config, EventSink::none())
    }

    /// Creates a stream that publishes [`StreamEvent`]s on `events`.
    pub fn with_events(config: StreamConfig, events: mpsc::Sender<StreamEvent<T>>) -> Self {
        Self::build(config, EventSink::new(events))
    }

    fn build(mut config: StreamConfig, events: EventSink<T>) -> Self {
        config.batch_size = config.batch_size.max(1);
        Self {
            config,
            state: Mutex::new(StreamState::new()),
            events,
            created_at: Instant::now(),
        }
    }

    fn state(&self) -> MutexGuard<'_, StreamState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Push ==
    /// Buffers an item.
    ///
    /// Returns `false` without buffering when the buffer is full. Pushing past
    /// the memory ceiling still succeeds but pauses the stream.
    pub fn push(&self, item: T) -> bool {
        self.try_push(item).is_ok()
    }

    /// Like [`push`](Self::push), but hands a rejected item back to the caller.
    pub fn try_push(&self, item: T) -> std::result::Result<(), T> {
        let size = estimate_size(&item);
        let mut state = self.state();

        if state.buffer.len() >= self.config.buffer_capacity {
            state.backpressure_events += 1;
            let buffered = state.buffer.len();
            drop(state);
            warn!(buffered, "Dataset stream full; push rejected");
            self.events.emit(StreamEvent::Backpressure {
                buffered,
                capacity: self.config.buffer_capacity,
            });
            return Err(item);
        }

        state.buffer.push_back((item, size));
        state.memory_bytes += size;

        if state.memory_bytes > self.config.max_memory_bytes {
            let memory_bytes = state.memory_bytes;
            let newly_paused = !state.paused;
            state.paused = true;
            drop(state);

            warn!(
                memory_bytes,
                limit = self.config.max_memory_bytes,
                "Dataset stream over memory ceiling; pausing"
            );
            self.events.emit(StreamEvent::MemoryPressure {
                memory_bytes,
                limit: self.config.max_memory_bytes,
            });
            if newly_paused {
                self.events.emit(StreamEvent::Paused);
            }
        }
        Ok(())
    }

    // == Process ==
    /// Drains the buffer in batches of up to `batch_size` until it is empty
    /// or the stream is paused.
    ///
    /// Results are returned in drain order. The task yields to the scheduler
    /// between batches. If `batch_fn` fails the drain stops, a
    /// [`StreamEvent::BatchError`] carrying the batch is published, and the
    /// error is returned; items not yet drained stay buffered.
    pub async fn process<R, E, F, Fut>(&self, mut batch_fn: F) -> Result<Vec<R>>
    where
        F: FnMut(Vec<T>) -> Fut,
        Fut: Future<Output = std::result::Result<Vec<R>, E>>,
        E: Into<BoxError>,
    {
        let mut results = Vec::new();

        loop {
            let batch = {
                let mut state = self.state();
                if state.paused || state.buffer.is_empty() {
                    break;
                }
                state.take_batch(self.config.batch_size)
            };

            let size = batch.len();
            let failed_batch = self.events.is_enabled().then(|| batch.clone());
            let started = Instant::now();

            match batch_fn(batch).await {
                Ok(mut output) => {
                    let elapsed = started.elapsed();
                    self.state().record_batch(size, elapsed);
                    debug!(size, elapsed_ms = elapsed.as_millis() as u64, "Batch processed");
                    self.events.emit(StreamEvent::BatchComplete { size, elapsed });
                    results.append(&mut output);
                }
                Err(err) => {
                    let source: BoxError = err.into();
                    error!(size, error = %source, "Batch processing failed");
                    if let Some(batch) = failed_batch {
                        self.events.emit(StreamEvent::BatchError {
                            batch,
                            error: source.to_string(),
                        });
                    }
                    return Err(PerfError::BatchFailed {
                        batch_size: size,
                        source,
                    });
                }
            }

            tokio::task::yield_now().await;
        }

        Ok(results)
    }

    pub fn pause(&self) {
        let was_paused = std::mem::replace(&mut self.state().paused, true);
        if !was_paused {
            self.events.emit(StreamEvent::Paused);
        }
    }

    pub fn resume(&self) {
        let was_paused = std::mem::replace(&mut self.state().paused, false);
        if was_paused {
            self.events.emit(StreamEvent::Resumed);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.state().paused
    }

    /// Discards every buffered item without processing it.
    pub fn clear(&self) {
        let mut state = self.state();
        state.buffer.clear();
        state.memory_bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.state().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().buffer.is_empty()
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    // == Stats ==
    pub fn stats(&self) -> StreamStats {
        let state = self.state();
        let avg_batch_time_ms = if state.batch_times.is_empty() {
            0.0
        } else {
            let total: Duration = state.batch_times.iter().sum();
            total.as_secs_f64() * 1000.0 / state.batch_times.len() as f64
        };
        let elapsed = self.created_at.elapsed().as_secs_f64();
        let throughput = if elapsed > 0.0 {
            state.items_processed as f64 / elapsed
        } else {
            0.0
        };

        StreamStats {
            items_processed: state.items_processed,
            buffered: state.buffer.len(),
            memory_bytes: state.memory_bytes,
            backpressure_events: state.backpressure_events,
            avg_batch_time_ms,
            throughput,
            paused: state.paused,
        }
    }
}
