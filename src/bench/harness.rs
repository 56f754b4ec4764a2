//! Benchmark Harness Module
//!
//! Times caller-supplied workloads and keeps a history of results.
//!
//! # Phases
//! 1. Warmup iterations run sequentially and are discarded
//! 2. The GC hook runs and the memory probe is read
//! 3. Measured iterations run sequentially, or in concurrent waves
//! 4. The memory probe is read again and statistics are computed

use std::future::Future;
use std::hint::black_box;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::try_join_all;
use tracing::{debug, info};

use super::config::{
    BenchmarkConfig, DEFAULT_ITERATIONS, DEFAULT_SYNC_ITERATIONS, DEFAULT_SYNC_WARMUP_ITERATIONS,
    DEFAULT_WARMUP_ITERATIONS,
};
use super::result::BenchmarkResult;
use crate::error::{BoxError, PerfError, Result};

/// Hook invoked before measurement to reclaim memory.
pub type GcHook = Arc<dyn Fn() + Send + Sync>;
/// Reads current memory usage in bytes, when available.
pub type MemoryProbe = Arc<dyn Fn() -> Option<u64> + Send + Sync>;

/// Resident set size of this process.
///
/// Reads the `Rss:` line of `/proc/self/smaps_rollup`, falling back to
/// `VmRSS:` in `/proc/self/status`. Both report KiB, so the result does not
/// depend on the kernel page size. Returns `None` where procfs is
/// unavailable.
pub fn resident_memory_bytes() -> Option<u64> {
    let read_field = |path: &str, field: &str| {
        let text = std::fs::read_to_string(path).ok()?;
        parse_kib_field(&text, field)
    };
    read_field("/proc/self/smaps_rollup", "Rss:")
        .or_else(|| read_field("/proc/self/status", "VmRSS:"))
}

/// Finds `field` at the start of a line like `Rss:   1234 kB` and returns bytes.
fn parse_kib_field(text: &str, field: &str) -> Option<u64> {
    let line = text.lines().find(|line| line.starts_with(field))?;
    let kib: u64 = line[field.len()..].split_whitespace().next()?.parse().ok()?;
    Some(kib * 1024)
}

// == Benchmark ==
pub struct Benchmark {
    gc_hook: Option<GcHook>,
    memory_probe: Option<MemoryProbe>,
    history: Vec<BenchmarkResult>,
}

impl Benchmark {
    /// Creates a harness with no GC hook and the procfs memory probe.
    pub fn new() -> Self {
        Self {
            gc_hook: None,
            memory_probe: Some(Arc::new(resident_memory_bytes)),
            history: Vec::new(),
        }
    }

    pub fn with_gc_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.gc_hook = Some(Arc::new(hook));
        self
    }

    /// Replaces the memory probe. Pass `None` to disable memory deltas.
    pub fn with_memory_probe(mut self, probe: Option<MemoryProbe>) -> Self {
        self.memory_probe = probe;
        self
    }

    // == Run ==
    /// Benchmarks an async workload.
    ///
    /// With `config.parallel` above 1, measured iterations run in waves of
    /// that many concurrent futures; each wave completes before the next
    /// starts. The first failing iteration aborts the run.
    pub async fn run<F, Fut, O, E>(&mut self, config: &BenchmarkConfig, f: F) -> Result<BenchmarkResult>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<O, E>>,
        E: Into<BoxError>,
    {
        let iterations = config.iterations.unwrap_or(DEFAULT_ITERATIONS);
        let warmup = config.warmup_iterations.unwrap_or(DEFAULT_WARMUP_ITERATIONS);
        validate(config, iterations)?;

        debug!(name = %config.name, warmup, "Warming up");
        for i in 0..warmup {
            f().await.map_err(|e| workload_failed(config, i, e))?;
        }

        let memory_before = self.prepare_measurement();
        let mut durations = Vec::with_capacity(iterations);
        let started = Instant::now();

        match config.parallel.filter(|&concurrency| concurrency > 1) {
            Some(concurrency) => {
                let f = &f;
                let mut completed = 0;
                while completed < iterations {
                    let wave = concurrency.min(iterations - completed);
                    let base = completed;
                    let timed = (0..wave).map(|offset| {
                        let fut = f();
                        async move {
                            let start = Instant::now();
                            match fut.await {
                                Ok(out) => {
                                    black_box(out);
                                    Ok(start.elapsed())
                                }
                                Err(e) => Err((base + offset, e)),
                            }
                        }
                    });
                    let wave_durations = try_join_all(timed)
                        .await
                        .map_err(|(index, e)| workload_failed(config, index, e))?;
                    durations.extend(wave_durations);
                    completed += wave;
                }
            }
            None => {
                for i in 0..iterations {
                    let start = Instant::now();
                    let out = f().await.map_err(|e| workload_failed(config, i, e))?;
                    durations.push(start.elapsed());
                    black_box(out);
                }
            }
        }

        let total = started.elapsed();
        Ok(self.finish(config, &durations, total, memory_before))
    }

    /// Benchmarks a synchronous workload. `config.parallel` is ignored.
    pub fn run_sync<F, O, E>(&mut self, config: &BenchmarkConfig, mut f: F) -> Result<BenchmarkResult>
    where
        F: FnMut() -> std::result::Result<O, E>,
        E: Into<BoxError>,
    {
        let iterations = config.iterations.unwrap_or(DEFAULT_SYNC_ITERATIONS);
        let warmup = config.warmup_iterations.unwrap_or(DEFAULT_SYNC_WARMUP_ITERATIONS);
        validate(config, iterations)?;

        if config.parallel.is_some() {
            debug!(name = %config.name, "Parallel mode ignored for sync workload");
        }

        for i in 0..warmup {
            f().map_err(|e| workload_failed(config, i, e))?;
        }

        let memory_before = self.prepare_measurement();
        let mut durations = Vec::with_capacity(iterations);
        let started = Instant::now();

        for i in 0..iterations {
            let start = Instant::now();
            let out = f().map_err(|e| workload_failed(config, i, e))?;
            durations.push(start.elapsed());
            black_box(out);
        }

        let total = started.elapsed();
        Ok(self.finish(config, &durations, total, memory_before))
    }

    /// Results of every successful run, oldest first.
    pub fn history(&self) -> &[BenchmarkResult] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn prepare_measurement(&self) -> Option<u64> {
        if let Some(hook) = &self.gc_hook {
            hook();
        }
        self.read_memory()
    }

    fn read_memory(&self) -> Option<u64> {
        self.memory_probe.as_ref().and_then(|probe| probe())
    }

    fn finish(
        &mut self,
        config: &BenchmarkConfig,
        durations: &[Duration],
        total: Duration,
        memory_before: Option<u64>,
    ) -> BenchmarkResult {
        let memory_delta = match (memory_before, self.read_memory()) {
            (Some(before), Some(after)) => Some(after as i64 - before as i64),
            _ => None,
        };

        let result = BenchmarkResult::from_durations(config, durations, total, memory_delta);
        info!(
            name = %result.name,
            iterations = result.iterations,
            avg_ms = result.avg_duration_ms,
            p99_ms = result.p99_duration_ms,
            throughput = result.throughput,
            "Benchmark complete"
        );
        self.history.push(result.clone());
        result
    }
}

impl Default for Benchmark {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(config: &BenchmarkConfig, iterations: usize) -> Result<()> {
    if iterations == 0 {
        return Err(PerfError::InvalidConfig(format!(
            "benchmark '{}' needs at least one iteration",
            config.name
        )));
    }
    Ok(())
}

fn workload_failed(config: &BenchmarkConfig, iteration: usize, err: impl Into<BoxError>) -> PerfError {
    PerfError::WorkloadFailed {
        name: config.name.clone(),
        iteration,
        source: err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quiet() -> Benchmark {
        Benchmark::new().with_memory_probe(None)
    }

    #[tokio::test]
    async fn test_sleep_workload_statistics() {
        let mut bench = quiet();
        let config = BenchmarkConfig::new("sleep").with_iterations(5).with_warmup(0);

        let result = bench
            .run(&config, || async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok::<_, BoxError>(())
            })
            .await
            .unwrap();

        assert_eq!(result.iterations, 5);
        assert!(result.avg_duration_ms >= 10.0);
        assert!(result.avg_duration_ms < 60.0, "avg was {}", result.avg_duration_ms);
        assert!(result.p99_duration_ms >= result.median_duration_ms);
        assert!(result.min_duration_ms <= result.avg_duration_ms);
        assert!(result.throughput > 0.0);
        assert_eq!(result.memory_delta_bytes, None);
        assert_eq!(bench.history().len(), 1);
    }

    #[tokio::test]
    async fn test_warmup_and_iteration_counts() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let mut bench = quiet();
        let config = BenchmarkConfig::new("count").with_iterations(7).with_warmup(3);

        bench
            .run(&config, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BoxError>(())
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_default_iterations() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let mut bench = quiet();

        let result = bench
            .run(&BenchmarkConfig::new("defaults"), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BoxError>(())
            })
            .await
            .unwrap();

        assert_eq!(result.iterations, DEFAULT_ITERATIONS);
        assert_eq!(calls.load(Ordering::SeqCst), DEFAULT_ITERATIONS + DEFAULT_WARMUP_ITERATIONS);
    }

    #[tokio::test]
    async fn test_failure_aborts_without_result() {
        let calls = AtomicUsize::new(0);
        let mut bench = quiet();
        let config = BenchmarkConfig::new("flaky").with_iterations(10).with_warmup(0);

        let err = bench
            .run(&config, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 3 {
                        Err(anyhow::anyhow!("model unavailable"))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PerfError::WorkloadFailed { iteration: 3, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(bench.history().is_empty());
    }

    #[tokio::test]
    async fn test_parallel_waves() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut bench = quiet();
        let config = BenchmarkConfig::new("parallel")
            .with_iterations(10)
            .with_warmup(0)
            .with_parallel(4);

        let result = bench
            .run(&config, || {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, BoxError>(())
                }
            })
            .await
            .unwrap();

        assert_eq!(result.iterations, 10);
        assert_eq!(peak.load(Ordering::SeqCst), 4);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_iterations_rejected() {
        let mut bench = quiet();
        let config = BenchmarkConfig::new("empty").with_iterations(0);

        let err = bench
            .run(&config, || async { Ok::<_, BoxError>(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, PerfError::InvalidConfig(_)));

        let err = bench.run_sync(&config, || Ok::<_, BoxError>(())).unwrap_err();
        assert!(matches!(err, PerfError::InvalidConfig(_)));
    }

    #[test]
    fn test_run_sync_defaults_and_history() {
        let mut calls = 0usize;
        let mut bench = quiet();

        let result = bench
            .run_sync(&BenchmarkConfig::new("sum"), || {
                calls += 1;
                Ok::<_, BoxError>((0..100u64).sum::<u64>())
            })
            .unwrap();

        assert_eq!(result.iterations, DEFAULT_SYNC_ITERATIONS);
        assert_eq!(calls, DEFAULT_SYNC_ITERATIONS + DEFAULT_SYNC_WARMUP_ITERATIONS);
        assert_eq!(bench.history().len(), 1);

        bench.clear_history();
        assert!(bench.history().is_empty());
    }

    #[test]
    fn test_gc_hook_and_memory_probe() {
        let gc_calls = Arc::new(AtomicUsize::new(0));
        let reads = Arc::new(AtomicUsize::new(0));
        let gc_clone = gc_calls.clone();
        let reads_clone = reads.clone();

        let mut bench = Benchmark::new()
            .with_gc_hook(move || {
                gc_clone.fetch_add(1, Ordering::SeqCst);
            })
            .with_memory_probe(Some(Arc::new(move || {
                let n = reads_clone.fetch_add(1, Ordering::SeqCst) as u64;
                Some(1_000 + n * 256)
            })));

        let config = BenchmarkConfig::new("alloc").with_iterations(3).with_warmup(1);
        let result = bench.run_sync(&config, || Ok::<_, BoxError>(vec![0u8; 64])).unwrap();

        assert_eq!(gc_calls.load(Ordering::SeqCst), 1);
        assert_eq!(reads.load(Ordering::SeqCst), 2);
        assert_eq!(result.memory_delta_bytes, Some(256));
    }

    #[test]
    fn test_parse_kib_field() {
        let rollup = "55d0c0a00000-7ffd5a1f2000 ---p 00000000 00:00 0  [rollup]\n\
                      Rss:                3520 kB\n\
                      Pss:                1024 kB\n";
        assert_eq!(parse_kib_field(rollup, "Rss:"), Some(3520 * 1024));
        assert_eq!(parse_kib_field(rollup, "VmRSS:"), None);
        assert_eq!(parse_kib_field("Rss: lots kB\n", "Rss:"), None);
    }

    #[test]
    fn test_resident_memory_probe() {
        if cfg!(target_os = "linux") {
            assert!(resident_memory_bytes().is_some_and(|bytes| bytes > 0));
        }
    }
}
