//! Bench Module
//!
//! Micro-benchmark harness for cache, stream and evaluation workloads.
//!
//! # Components
//! - [`Benchmark`]: times a workload and computes latency statistics
//! - [`compare`]: relative change between a baseline and a current result
//! - [`BenchmarkSuite`]: runs named workloads in order and summarizes them

mod compare;
mod config;
mod harness;
mod result;
mod stats;
mod suite;


pub use compare::{
    compare, Comparison, Significance, Verdict, MODERATE_THRESHOLD_PCT, SIGNIFICANT_THRESHOLD_PCT,
    SIMILAR_THRESHOLD_PCT,
};
pub use config::{
    BenchmarkConfig, DEFAULT_ITERATIONS, DEFAULT_SYNC_ITERATIONS, DEFAULT_SYNC_WARMUP_ITERATIONS,
    DEFAULT_WARMUP_ITERATIONS,
};
pub use harness::{resident_memory_bytes, Benchmark, GcHook, MemoryProbe};
pub use result::BenchmarkResult;
pub use stats::{percentile, DurationStats};
pub use suite::{BenchmarkSuite, SuiteReport, SuiteSummary};
