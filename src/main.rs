//! Eval Perf - benchmark runner for the evaluation caches and streams
//!
//! Builds the cache manager from the environment, then benchmarks the
//! hot paths of each cache and of batch stream processing.

use std::sync::Arc;

use anyhow::Context;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eval_perf::bench::{BenchmarkConfig, BenchmarkSuite};
use eval_perf::cache::KeyPattern;
use eval_perf::error::BoxError;
use eval_perf::stream::DatasetStream;
use eval_perf::{CacheManager, Config};

const SAMPLE_TEXTS: usize = 32;
const STREAM_ITEMS: u64 = 500;

/// Main entry point for the benchmark runner.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache manager and start background cleanup
/// 4. Seed the caches and run the benchmark suite
/// 5. Print the report and stop cleanup
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eval_perf=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting eval perf benchmarks");

    let config = Config::from_env();
    info!(
        "Configuration loaded: response={}/{}s, embedding={}/{}s, query={}/{}s, cleanup_interval={}ms",
        config.response_cache.max_size,
        config.response_cache.ttl.as_secs(),
        config.embedding_cache.max_size,
        config.embedding_cache.ttl.as_secs(),
        config.query_cache.max_size,
        config.query_cache.ttl.as_secs(),
        config.cleanup_interval.as_millis()
    );

    let manager = Arc::new(CacheManager::from_config(&config));
    manager
        .start_cleanup(config.cleanup_interval)
        .context("starting cache cleanup")?;

    seed_caches(&manager).await?;
    info!("Caches seeded");

    let mut suite = build_suite(&manager, &config);
    let report = suite.run().await.context("running benchmark suite")?;
    println!("{report}");

    for (name, stats) in manager.all_stats().await {
        info!(
            cache = %name,
            hits = stats.hits,
            misses = stats.misses,
            hit_rate = stats.hit_rate,
            size = stats.size,
            "Cache statistics"
        );
    }

    manager.stop_cleanup();
    info!("Benchmarks complete");
    Ok(())
}

fn sample_text(i: usize) -> String {
    format!("evaluation sample {i}")
}

async fn seed_caches(manager: &CacheManager) -> anyhow::Result<()> {
    let model = json!({ "model": "judge", "temperature": 0.0 });
    manager
        .response()
        .set(&"Is the answer grounded?", &model, json!({ "score": 0.92 }))
        .await?;

    manager
        .embedding()
        .batch_set((0..SAMPLE_TEXTS).map(|i| (sample_text(i), vec![i as f32; 8])))
        .await;

    manager
        .query()
        .set("SELECT * FROM runs WHERE suite = ?", &json!(["nightly"]), json!([1, 2, 3]))
        .await?;
    Ok(())
}

fn build_suite(manager: &Arc<CacheManager>, config: &Config) -> BenchmarkSuite {
    let response = manager.clone();
    let embedding = manager.clone();
    let query = manager.clone();
    let invalidate = manager.clone();
    let stream_config = config.stream;

    BenchmarkSuite::new()
        .add(
            BenchmarkConfig::new("response_cache_hit").with_description("Lookup of a cached judge response"),
            move || {
                let manager = response.clone();
                async move {
                    let model = json!({ "model": "judge", "temperature": 0.0 });
                    manager.response().get(&"Is the answer grounded?", &model).await
                }
            },
        )
        .add(
            BenchmarkConfig::new("embedding_batch_get")
                .with_description("Batch lookup of cached embeddings with one miss"),
            move || {
                let manager = embedding.clone();
                async move {
                    let mut texts: Vec<String> = (0..SAMPLE_TEXTS).map(sample_text).collect();
                    texts.push("never embedded".to_string());
                    Ok::<_, BoxError>(manager.embedding().batch_get(&texts).await)
                }
            },
        )
        .add(
            BenchmarkConfig::new("query_cache_parallel")
                .with_description("Concurrent query lookups")
                .with_parallel(8),
            move || {
                let manager = query.clone();
                async move {
                    manager
                        .query()
                        .get("SELECT * FROM runs WHERE suite = ?", &json!(["nightly"]))
                        .await
                }
            },
        )
        .add(
            BenchmarkConfig::new("query_invalidate")
                .with_description("Set then invalidate a query by regex")
                .with_iterations(50),
            move || {
                let manager = invalidate.clone();
                async move {
                    let query = manager.query();
                    query.set("SELECT 1", &json!([]), json!(1)).await?;
                    let pattern = KeyPattern::regex("^SELECT 1$")?;
                    Ok::<_, BoxError>(query.invalidate(&pattern).await)
                }
            },
        )
        .add(
            BenchmarkConfig::new("stream_process")
                .with_description("Drain buffered items through an identity batch function")
                .with_iterations(20)
                .with_warmup(2),
            move || async move {
                let stream = DatasetStream::new(stream_config);
                for item in 0..STREAM_ITEMS {
                    stream.push(item);
                }
                stream
                    .process(|batch: Vec<u64>| async move { Ok::<_, BoxError>(batch) })
                    .await
            },
        )
}
