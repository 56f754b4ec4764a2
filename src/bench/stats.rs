//! Latency distribution statistics.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Summary of a sample of per-iteration durations, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DurationStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub p95: f64,
    pub p99: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub samples: usize,
}

impl DurationStats {
    /// Computes statistics from durations. An empty sample yields all zeros.
    pub fn from_durations(durations: &[Duration]) -> Self {
        let millis: Vec<f64> = durations.iter().map(|d| d.as_secs_f64() * 1000.0).collect();
        Self::from_millis(&millis)
    }

    pub fn from_millis(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len() as f64;
        let avg = sorted.iter().sum::<f64>() / n;
        let variance = sorted.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / n;

        Self {
            // Clamp guards against summation rounding pushing avg past the bounds
            avg: avg.clamp(sorted[0], sorted[sorted.len() - 1]),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            median: percentile(&sorted, 50.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
            std_dev: variance.sqrt(),
            samples: sorted.len(),
        }
    }
}

// == Percentile ==
/// Nearest-rank percentile of an ascending sample.
///
/// The index is `ceil(n * p / 100) - 1`, clamped to the sample. Returns 0.0
/// for an empty sample.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (sorted.len() as f64 * p / 100.0).ceil() as isize - 1;
    let index = rank.clamp(0, sorted.len() as isize - 1) as usize;
    sorted[index]
}
