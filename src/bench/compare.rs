//! Baseline comparison of two benchmark results.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::result::BenchmarkResult;

/// Duration changes smaller than this (in percent) are treated as noise.
pub const SIMILAR_THRESHOLD_PCT: f64 = 5.0;
pub const MODERATE_THRESHOLD_PCT: f64 = 15.0;
pub const SIGNIFICANT_THRESHOLD_PCT: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Faster,
    Slower,
    Similar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Significance {
    Negligible,
    Minor,
    Moderate,
    Significant,
}

/// Percentage changes of `current` relative to `baseline`.
///
/// Positive values are improvements: lower average duration, higher
/// throughput, smaller memory delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub baseline: String,
    pub current: String,
    pub duration_improvement_pct: f64,
    pub throughput_improvement_pct: f64,
    /// Present only when both results carry memory data.
    ///
    /// Computed as `(baseline - current) / |baseline| * 100`, so a smaller
    /// delta is positive even when the baseline delta is negative.
    pub memory_improvement_pct: Option<f64>,
    pub verdict: Verdict,
    pub significance: Significance,
}

// == Compare ==
pub fn compare(baseline: &BenchmarkResult, current: &BenchmarkResult) -> Comparison {
    let duration_improvement_pct = relative_change(
        baseline.avg_duration_ms,
        baseline.avg_duration_ms - current.avg_duration_ms,
    );
    let throughput_improvement_pct =
        relative_change(baseline.throughput, current.throughput - baseline.throughput);
    let memory_improvement_pct = match (baseline.memory_delta_bytes, current.memory_delta_bytes) {
        (Some(base), Some(cur)) => Some(relative_change(base as f64, (base - cur) as f64)),
        _ => None,
    };

    let verdict = if duration_improvement_pct.abs() < SIMILAR_THRESHOLD_PCT {
        Verdict::Similar
    } else if duration_improvement_pct > 0.0 {
        Verdict::Faster
    } else {
        Verdict::Slower
    };

    let magnitude = duration_improvement_pct.abs();
    let significance = if verdict == Verdict::Similar {
        Significance::Negligible
    } else if magnitude > SIGNIFICANT_THRESHOLD_PCT {
        Significance::Significant
    } else if magnitude > MODERATE_THRESHOLD_PCT {
        Significance::Moderate
    } else {
        Significance::Minor
    };

    Comparison {
        baseline: baseline.name.clone(),
        current: current.name.clone(),
        duration_improvement_pct,
        throughput_improvement_pct,
        memory_improvement_pct,
        verdict,
        significance,
    }
}

/// `delta / |base| * 100`, or 0 when the base is zero.
fn relative_change(base: f64, delta: f64) -> f64 {
    if base == 0.0 {
        0.0
    } else {
        delta / base.abs() * 100.0
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Faster => "faster",
            Verdict::Slower => "slower",
            Verdict::Similar => "similar",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Significance::Negligible => "negligible",
            Significance::Minor => "minor",
            Significance::Moderate => "moderate",
            Significance::Significant => "significant",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} vs {}: {} ({})", self.current, self.baseline, self.verdict, self.significance)?;
        writeln!(f, "  duration: {:+.2}%", self.duration_improvement_pct)?;
        write!(f, "  throughput: {:+.2}%", self.throughput_improvement_pct)?;
        if let Some(memory) = self.memory_improvement_pct {
            write!(f, "\n  memory: {memory:+.2}%")?;
        }
        Ok(())
    }
}
