//! Integration Tests for the Performance Toolkit
//!
//! Exercises the public API end to end: the cache manager with its
//! background sweep, a stream-to-writer evaluation pipeline, and a
//! benchmark suite over live caches.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use eval_perf::bench::{compare, Benchmark, BenchmarkConfig, BenchmarkSuite, Verdict};
use eval_perf::cache::{CachedQuery, KeyPattern, ManagedCache, SharedCache};
use eval_perf::config::CacheSettings;
use eval_perf::error::BoxError;
use eval_perf::stream::{BatchProcessor, ResultWriter, StreamConfig, StreamEvent};
use eval_perf::{CacheManager, Config, PerfError};

// == Helper Functions ==

fn short_ttl_config(ttl: Duration) -> Config {
    let settings = CacheSettings { max_size: 10, ttl };
    Config {
        response_cache: settings,
        embedding_cache: settings,
        query_cache: settings,
        ..Config::default()
    }
}

// == Cache Manager ==

#[tokio::test]
async fn test_background_cleanup_sweeps_all_caches() {
    let manager = CacheManager::from_config(&short_ttl_config(Duration::from_millis(30)));
    let model = json!({ "model": "judge" });

    manager.response().set(&"prompt", &model, json!("answer")).await.unwrap();
    manager.embedding().set("text", vec![0.1, 0.2]).await;
    manager.query().set("SELECT 1", &json!([]), json!(1)).await.unwrap();

    manager.start_cleanup(Duration::from_millis(20)).unwrap();
    assert!(manager.is_cleanup_running());

    tokio::time::sleep(Duration::from_millis(150)).await;

    let stats = manager.all_stats().await;
    assert_eq!(stats.len(), 3);
    assert!(stats.values().all(|s| s.size == 0), "stats: {stats:?}");

    manager.stop_cleanup();
    assert!(!manager.is_cleanup_running());
}

#[tokio::test]
async fn test_zero_cleanup_interval_rejected() {
    let manager = CacheManager::new();
    let err = manager.start_cleanup(Duration::ZERO).unwrap_err();
    assert!(matches!(err, PerfError::InvalidConfig(_)));
    assert!(!manager.is_cleanup_running());
}

#[tokio::test]
async fn test_custom_cache_joins_registry() {
    let manager = CacheManager::new();
    let custom: SharedCache<CachedQuery<String>> = Arc::new(tokio::sync::RwLock::new(
        eval_perf::cache::BoundedCache::new(4, Duration::from_millis(10)),
    ));
    custom.write().await.set(
        "k".to_string(),
        CachedQuery {
            query: "q".to_string(),
            result: "r".to_string(),
        },
    );
    manager.register("custom", custom.clone());

    assert!(manager.registry().names().contains(&"custom".to_string()));

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(manager.remove_expired_all().await, 1);
    assert_eq!(custom.stats().await.size, 0);
}

#[tokio::test]
async fn test_embedding_batch_scenario() {
    let manager = CacheManager::new();
    let embeddings = manager.embedding();

    embeddings.batch_set([("x".to_string(), vec![1.0, 2.0])]).await;
    let found = embeddings.batch_get(&["x", "y"]).await;

    assert_eq!(found.len(), 2);
    assert_eq!(found["x"], Some(vec![1.0, 2.0]));
    assert_eq!(found["y"], None);

    let stats = embeddings.stats().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hit_rate, 0.5);
}

#[tokio::test]
async fn test_query_invalidation_and_clear_all() {
    let manager = CacheManager::new();
    let queries = manager.query();

    for suite in ["nightly", "weekly"] {
        let sql = format!("SELECT * FROM runs WHERE suite = '{suite}'");
        queries.set(&sql, &json!([]), json!(suite)).await.unwrap();
    }
    queries.set("SELECT count(*) FROM runs", &json!([]), json!(2)).await.unwrap();

    let removed = queries
        .invalidate(&KeyPattern::regex("WHERE suite = ").unwrap())
        .await;
    assert_eq!(removed, 2);
    assert_eq!(queries.stats().await.size, 1);

    manager.clear_all().await;
    assert!(manager.all_stats().await.values().all(|s| s.size == 0));
}

// == Stream Pipeline ==

#[tokio::test]
async fn test_processor_to_writer_pipeline() {
    let (tx, mut rx) = mpsc::channel(64);
    let config = StreamConfig::new().with_batch_size(4).with_buffer_capacity(8);
    let mut processor: BatchProcessor<u32, String> = BatchProcessor::with_events(config, tx);

    let leftover = processor.add_test_cases((1..=10).collect());
    assert_eq!(leftover, vec![9, 10]);

    let produced = processor
        .process_all(|batch: Vec<u32>| async move {
            Ok::<_, BoxError>(batch.into_iter().map(|n| format!("case-{n}")).collect())
        })
        .await
        .unwrap();
    assert_eq!(produced.len(), 8);

    // Retry the remainder once the buffer has drained
    assert!(processor.add_test_cases(leftover).is_empty());
    processor
        .process_all(|batch: Vec<u32>| async move {
            Ok::<_, BoxError>(batch.into_iter().map(|n| format!("case-{n}")).collect())
        })
        .await
        .unwrap();

    let expected: Vec<String> = (1..=10).map(|n| format!("case-{n}")).collect();
    assert_eq!(processor.results(), expected.as_slice());

    let written = Arc::new(Mutex::new(Vec::new()));
    let sink = written.clone();
    let writer_fn = move |batch: Vec<String>| {
        sink.lock().unwrap().push(batch);
        async { Ok::<(), BoxError>(()) }
    };

    let mut writer = ResultWriter::new(3);
    writer
        .write_many(processor.results().iter().cloned(), &writer_fn)
        .await
        .unwrap();
    writer.flush(&writer_fn).await.unwrap();

    let chunks = written.lock().unwrap().clone();
    assert_eq!(chunks.len(), 4);
    assert_eq!(chunks.concat(), expected);
    assert_eq!(writer.stats().items_written, 10);

    let mut backpressure = 0;
    let mut completed = 0;
    while let Ok(event) = rx.try_recv() {
        match event {
            StreamEvent::Backpressure { capacity, .. } => {
                assert_eq!(capacity, 8);
                backpressure += 1;
            }
            StreamEvent::BatchComplete { .. } => completed += 1,
            _ => {}
        }
    }
    assert_eq!(backpressure, 1);
    assert_eq!(completed, 3);
}

#[tokio::test]
async fn test_failed_batch_keeps_remaining_items() {
    let (tx, mut rx) = mpsc::channel(16);
    let config = StreamConfig::new().with_batch_size(2);
    let mut processor: BatchProcessor<u32, u32> = BatchProcessor::with_events(config, tx);
    processor.add_test_cases(vec![1, 2, 3, 4, 5]);

    let err = processor
        .process_all(|batch: Vec<u32>| async move {
            if batch.contains(&3) {
                Err(anyhow::anyhow!("judge timed out"))
            } else {
                Ok(batch)
            }
        })
        .await
        .unwrap_err();

    assert!(matches!(err, PerfError::BatchFailed { batch_size: 2, .. }));
    assert_eq!(processor.stream().len(), 1);

    let failed = std::iter::from_fn(|| rx.try_recv().ok()).find_map(|event| match event {
        StreamEvent::BatchError { batch, .. } => Some(batch),
        _ => None,
    });
    assert_eq!(failed, Some(vec![3, 4]));
}

// == Benchmarks ==

#[tokio::test]
async fn test_suite_over_live_caches() {
    let manager = Arc::new(CacheManager::new());
    let model = json!({ "model": "judge" });
    manager.response().set(&"warm", &model, json!(1)).await.unwrap();

    let hit = manager.clone();
    let miss = manager.clone();
    let mut suite = BenchmarkSuite::with_harness(Benchmark::new().with_memory_probe(None))
        .add(BenchmarkConfig::new("hit").with_iterations(50), move || {
            let manager = hit.clone();
            async move {
                let model = json!({ "model": "judge" });
                manager.response().get(&"warm", &model).await
            }
        })
        .add(BenchmarkConfig::new("miss").with_iterations(50).with_parallel(5), move || {
            let manager = miss.clone();
            async move {
                let model = json!({ "model": "judge" });
                manager.response().get(&"cold", &model).await
            }
        });

    let report = suite.run().await.unwrap();
    assert_eq!(report.summary.total_benchmarks, 2);
    assert!(report.summary.fastest.is_some());

    let stats = manager.response().stats().await;
    // Warmup iterations count too: (10 + 50) per benchmark
    assert_eq!(stats.hits, 60);
    assert_eq!(stats.misses, 60);

    let self_cmp = compare(&report.results[0], &report.results[0]);
    assert_eq!(self_cmp.verdict, Verdict::Similar);

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["results"][1]["name"], "miss");
}
