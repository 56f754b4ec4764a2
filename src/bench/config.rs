//! Benchmark configuration.

use serde::{Deserialize, Serialize};

/// Measured iterations for async workloads when unset.
pub const DEFAULT_ITERATIONS: usize = 100;
/// Warmup iterations for async workloads when unset.
pub const DEFAULT_WARMUP_ITERATIONS: usize = 10;
/// Measured iterations for synchronous workloads when unset.
pub const DEFAULT_SYNC_ITERATIONS: usize = 1000;
/// Warmup iterations for synchronous workloads when unset.
pub const DEFAULT_SYNC_WARMUP_ITERATIONS: usize = 100;

/// Describes one benchmark run.
///
/// Unset iteration counts fall back to defaults that depend on whether the
/// workload is run with [`Benchmark::run`](super::Benchmark::run) or
/// [`Benchmark::run_sync`](super::Benchmark::run_sync).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    pub name: String,
    pub description: Option<String>,
    pub iterations: Option<usize>,
    pub warmup_iterations: Option<usize>,
    /// Run measured iterations in concurrent waves of this size
    pub parallel: Option<usize>,
}

impl BenchmarkConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            iterations: None,
            warmup_iterations: None,
            parallel: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = Some(iterations);
        self
    }

    pub fn with_warmup(mut self, warmup_iterations: usize) -> Self {
        self.warmup_iterations = Some(warmup_iterations);
        self
    }

    pub fn with_parallel(mut self, concurrency: usize) -> Self {
        self.parallel = Some(concurrency);
        self
    }
}
