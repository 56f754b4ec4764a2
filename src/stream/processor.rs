//! Batch Processor Module
//!
//! Queues evaluation test cases on a [`DatasetStream`] and collects the
//! executor's results.

use std::future::Future;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;

use crate::error::{BoxError, Result};
use crate::stream::{DatasetStream, StreamConfig, StreamEvent};

// == Batch Processor ==
#[derive(Debug)]
pub struct BatchProcessor<T, R> {
    stream: DatasetStream<T>,
    results: Vec<R>,
}

impl<T, R> BatchProcessor<T, R>
where
    T: Serialize + Clone,
    R: Clone,
{
    pub fn new(config: StreamConfig) -> Self {
        Self {
            stream: DatasetStream::new(config),
            results: Vec::new(),
        }
    }

    pub fn with_events(config: StreamConfig, events: mpsc::Sender<StreamEvent<T>>) -> Self {
        Self {
            stream: DatasetStream::with_events(config, events),
            results: Vec::new(),
        }
    }

    /// Queues one test case. Returns `false` if the stream applied backpressure.
    pub fn add_test_case(&self, test_case: T) -> bool {
        self.stream.push(test_case)
    }

    // == Add Test Cases ==
    /// Queues test cases in order, stopping at the first rejection.
    ///
    /// Returns the test cases that were not queued (empty when all fit), in
    /// their original order, so the caller can retry them after draining.
    pub fn add_test_cases(&self, test_cases: Vec<T>) -> Vec<T> {
        let mut remaining = test_cases.into_iter();
        while let Some(test_case) = remaining.next() {
            if let Err(rejected) = self.stream.try_push(test_case) {
                let mut not_queued = vec![rejected];
                not_queued.extend(remaining);
                return not_queued;
            }
        }
        Vec::new()
    }

    // == Process All ==
    /// Drains every queued test case through `executor`.
    ///
    /// Results are appended to the retained list in drain order; the newly
    /// produced results are also returned.
    pub async fn process_all<E, F, Fut>(&mut self, executor: F) -> Result<Vec<R>>
    where
        F: FnMut(Vec<T>) -> Fut,
        Fut: Future<Output = std::result::Result<Vec<R>, E>>,
        E: Into<BoxError>,
    {
        let produced = self.stream.process(executor).await?;
        self.results.extend(produced.iter().cloned());
        info!(
            produced = produced.len(),
            total = self.results.len(),
            "Processed queued test cases"
        );
        Ok(produced)
    }

    /// Every result collected so far, in drain order.
    pub fn results(&self) -> &[R] {
        &self.results
    }

    pub fn clear_results(&mut self) {
        self.results.clear();
    }

    pub fn stream(&self) -> &DatasetStream<T> {
        &self.stream
    }
}
