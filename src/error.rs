//! Error types for the performance toolkit
//!
//! Provides unified error handling using thiserror. Cache misses are never
//! errors; they are reported as `None`.

use thiserror::Error;

/// Boxed error returned by caller-supplied batch, writer and workload functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// == Perf Error Enum ==
/// Unified error type for caches, streams and benchmarks.
#[derive(Error, Debug)]
pub enum PerfError {
    /// A batch function failed while draining a dataset stream
    #[error("Batch of {batch_size} items failed: {source}")]
    BatchFailed {
        batch_size: usize,
        #[source]
        source: BoxError,
    },

    /// A writer function failed while flushing buffered results
    #[error("Flush of {pending} buffered results failed: {source}")]
    FlushFailed {
        pending: usize,
        #[source]
        source: BoxError,
    },

    /// A benchmark workload failed during a measured iteration
    #[error("Benchmark '{name}' failed at iteration {iteration}: {source}")]
    WorkloadFailed {
        name: String,
        iteration: usize,
        #[source]
        source: BoxError,
    },

    /// Invalid invalidation pattern
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Value could not be serialized for hashing
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the toolkit.
pub type Result<T> = std::result::Result<T, PerfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_failed_message() {
        let err = PerfError::BatchFailed {
            batch_size: 3,
            source: "model timeout".into(),
        };
        assert_eq!(err.to_string(), "Batch of 3 items failed: model timeout");
    }

    #[test]
    fn test_workload_failed_keeps_source() {
        use std::error::Error as _;

        let err = PerfError::WorkloadFailed {
            name: "lookup".to_string(),
            iteration: 7,
            source: anyhow::anyhow!("boom").into(),
        };
        assert!(err.to_string().contains("iteration 7"));
        assert_eq!(err.source().map(|s| s.to_string()), Some("boom".to_string()));
    }

    #[test]
    fn test_invalid_pattern_from_regex() {
        let err: PerfError = regex::Regex::new("(").unwrap_err().into();
        assert!(matches!(err, PerfError::InvalidPattern(_)));
    }
}
