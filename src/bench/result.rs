//! Benchmark result value object.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::BenchmarkConfig;
use super::stats::DurationStats;

/// Outcome of one benchmark run. Durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub name: String,
    pub description: Option<String>,
    pub iterations: usize,
    pub total_duration_ms: f64,
    pub avg_duration_ms: f64,
    pub min_duration_ms: f64,
    pub max_duration_ms: f64,
    pub median_duration_ms: f64,
    pub p95_duration_ms: f64,
    pub p99_duration_ms: f64,
    pub std_dev_ms: f64,
    /// Operations per second
    pub throughput: f64,
    /// Resident memory change across the measured phase. Approximate.
    pub memory_delta_bytes: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

impl BenchmarkResult {
    pub(crate) fn from_durations(
        config: &BenchmarkConfig,
        durations: &[Duration],
        total: Duration,
        memory_delta_bytes: Option<i64>,
    ) -> Self {
        let stats = DurationStats::from_durations(durations);
        let total_duration_ms = total.as_secs_f64() * 1000.0;
        let throughput = if total_duration_ms > 0.0 {
            durations.len() as f64 / total_duration_ms * 1000.0
        } else {
            0.0
        };

        Self {
            name: config.name.clone(),
            description: config.description.clone(),
            iterations: durations.len(),
            total_duration_ms,
            avg_duration_ms: stats.avg,
            min_duration_ms: stats.min,
            max_duration_ms: stats.max,
            median_duration_ms: stats.median,
            p95_duration_ms: stats.p95,
            p99_duration_ms: stats.p99,
            std_dev_ms: stats.std_dev,
            throughput,
            memory_delta_bytes,
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        if let Some(description) = &self.description {
            writeln!(f, "  {description}")?;
        }
        writeln!(f, "  iterations: {}", self.iterations)?;
        writeln!(
            f,
            "  avg: {:.3}ms  min: {:.3}ms  max: {:.3}ms",
            self.avg_duration_ms, self.min_duration_ms, self.max_duration_ms
        )?;
        writeln!(
            f,
            "  p50: {:.3}ms  p95: {:.3}ms  p99: {:.3}ms  std dev: {:.3}ms",
            self.median_duration_ms, self.p95_duration_ms, self.p99_duration_ms, self.std_dev_ms
        )?;
        write!(f, "  throughput: {:.2} ops/sec", self.throughput)?;
        if let Some(delta) = self.memory_delta_bytes {
            write!(f, "\n  memory delta: {:.2} KiB", delta as f64 / 1024.0)?;
        }
        Ok(())
    }
}
