//! Benchmark Suite Module
//!
//! Runs an ordered list of named workloads through one harness and
//! summarizes the results.

use std::fmt;
use std::future::Future;

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::config::BenchmarkConfig;
use super::harness::Benchmark;
use super::result::BenchmarkResult;
use crate::error::{BoxError, Result};

type Workload = Box<dyn Fn() -> BoxFuture<'static, std::result::Result<(), BoxError>> + Send + Sync>;

/// Aggregate figures across a suite run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteSummary {
    pub total_benchmarks: usize,
    pub total_duration_ms: f64,
    /// Benchmark with the lowest average duration
    pub fastest: Option<String>,
    /// Benchmark with the highest average duration
    pub slowest: Option<String>,
    pub avg_throughput: f64,
}

impl SuiteSummary {
    pub fn from_results(results: &[BenchmarkResult]) -> Self {
        let by_avg = |a: &&BenchmarkResult, b: &&BenchmarkResult| {
            a.avg_duration_ms.total_cmp(&b.avg_duration_ms)
        };
        let avg_throughput = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.throughput).sum::<f64>() / results.len() as f64
        };

        Self {
            total_benchmarks: results.len(),
            total_duration_ms: results.iter().map(|r| r.total_duration_ms).sum(),
            fastest: results.iter().min_by(by_avg).map(|r| r.name.clone()),
            slowest: results.iter().max_by(by_avg).map(|r| r.name.clone()),
            avg_throughput,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub results: Vec<BenchmarkResult>,
    pub summary: SuiteSummary,
}

impl SuiteReport {
    /// Pretty-printed JSON for archiving or diffing between runs.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            writeln!(f, "{result}")?;
        }
        let summary = &self.summary;
        writeln!(f, "Summary")?;
        writeln!(f, "  benchmarks: {}", summary.total_benchmarks)?;
        writeln!(f, "  total time: {:.2}ms", summary.total_duration_ms)?;
        if let (Some(fastest), Some(slowest)) = (&summary.fastest, &summary.slowest) {
            writeln!(f, "  fastest: {fastest}")?;
            writeln!(f, "  slowest: {slowest}")?;
        }
        write!(f, "  avg throughput: {:.2} ops/sec", summary.avg_throughput)
    }
}

// == Benchmark Suite ==
pub struct BenchmarkSuite {
    harness: Benchmark,
    entries: Vec<(BenchmarkConfig, Workload)>,
}

impl BenchmarkSuite {
    pub fn new() -> Self {
        Self::with_harness(Benchmark::new())
    }

    /// Uses a preconfigured harness, e.g. one with a GC hook.
    pub fn with_harness(harness: Benchmark) -> Self {
        Self {
            harness,
            entries: Vec::new(),
        }
    }

    pub fn add<F, Fut, O, E>(mut self, config: BenchmarkConfig, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<O, E>> + Send + 'static,
        O: 'static,
        E: Into<BoxError> + 'static,
    {
        let workload: Workload = Box::new(move || {
            let fut = f();
            async move { fut.await.map(|_| ()).map_err(Into::into) }.boxed()
        });
        self.entries.push((config, workload));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Run ==
    /// Runs every benchmark in insertion order. The first failure aborts
    /// the suite.
    pub async fn run(&mut self) -> Result<SuiteReport> {
        let mut results = Vec::with_capacity(self.entries.len());
        for (config, workload) in &self.entries {
            let result = self.harness.run(config, || workload()).await?;
            results.push(result);
        }

        let summary = SuiteSummary::from_results(&results);
        info!(
            benchmarks = summary.total_benchmarks,
            total_ms = summary.total_duration_ms,
            fastest = summary.fastest.as_deref().unwrap_or("-"),
            slowest = summary.slowest.as_deref().unwrap_or("-"),
            "Benchmark suite complete"
        );

        Ok(SuiteReport { results, summary })
    }

    /// The harness, including the history of every run so far.
    pub fn harness(&self) -> &Benchmark {
        &self.harness
    }
}

impl Default for BenchmarkSuite {
    fn default() -> Self {
        Self::new()
    }
}
