//! TierCache Integration Tests
//!
//! End-to-end coverage across the public surface:
//! - Feature 1: Two-tier lookups with mirror promotion
//! - Feature 2: Memoized data sources
//! - Feature 3: Filesystem mirror durability

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tiercache::{
    memoize, CacheConfig, CacheOptions, FsMirrorBackend, InMemoryMirrorBackend, ManualClock,
    MirrorBackend, TtlCache,
};

fn mirrored(ttl_millis: u64) -> CacheOptions {
    CacheOptions {
        ttl: Some(Duration::from_millis(ttl_millis)),
        use_mirror: true,
        capacity: None,
    }
}

// =============================================================================
// Feature 1: Two-Tier Lookup Tests
// =============================================================================

mod two_tier_tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_first_then_mirror_then_miss() {
        let clock = ManualClock::new(0);
        let cache = TtlCache::<String>::with_parts(
            CacheConfig::default(),
            Some(Arc::new(InMemoryMirrorBackend::new())),
            Arc::new(clock.clone()),
        );

        cache.set("report", "q1".to_string(), mirrored(60_000)).await;

        // Memory hit
        assert_eq!(cache.get("report", true).await, Some("q1".to_string()));

        // Memory lost, mirror serves and promotes
        cache.store().remove("report");
        assert_eq!(cache.get("report", true).await, Some("q1".to_string()));
        assert_eq!(cache.store().len(), 1);

        // Both tiers dead
        clock.set(120_000);
        assert_eq!(cache.get("report", true).await, None);
    }

    #[tokio::test]
    async fn test_eviction_under_sustained_writes() {
        let clock = ManualClock::new(0);
        let cache = TtlCache::<u32>::with_parts(
            CacheConfig {
                capacity: 5,
                default_ttl: Duration::from_secs(300),
            },
            None,
            Arc::new(clock.clone()),
        );

        for i in 0..50u32 {
            clock.set(u64::from(i));
            cache
                .set(&format!("k{i}"), i, CacheOptions::default())
                .await;
        }

        // Soft bound held throughout; the survivors are the newest five
        assert_eq!(cache.store().len(), 5);
        for i in 45..50u32 {
            assert_eq!(cache.get(&format!("k{i}"), false).await, Some(i));
        }
        assert_eq!(cache.store().evictions(), 45);
    }

    #[tokio::test]
    async fn test_stats_reflect_both_tiers() {
        let cache = TtlCache::<u32>::in_memory();

        cache.set("both", 1, mirrored(60_000)).await;
        cache.set("memory-only", 2, CacheOptions::default()).await;

        let stats = cache.stats().await;
        assert_eq!(stats.memory_entries, 2);
        assert_eq!(stats.mirror_entries, 1);
        assert_eq!(stats.total_distinct_keys, 2);
        assert!(stats.memory.hits == 0 && stats.memory.misses == 0);
    }
}

// =============================================================================
// Feature 2: Memoized Data Source Tests
// =============================================================================

mod memoized_source_tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    /// Synthetic reading record, standing in for a slow upstream source
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Reading {
        source: String,
        day: String,
        values: Vec<f64>,
    }

    #[derive(Debug, Clone)]
    struct Query {
        source: String,
        day: String,
        count: usize,
    }

    fn query_key(q: &Query) -> String {
        format!("{}:{}:{}", q.source, q.day, q.count)
    }

    fn generate(q: &Query) -> Reading {
        Reading {
            source: q.source.clone(),
            day: q.day.clone(),
            values: (0..q.count).map(|i| i as f64 * 0.5).collect(),
        }
    }

    #[tokio::test]
    async fn test_source_generates_once_per_query_within_ttl() {
        let clock = ManualClock::new(0);
        let cache = Arc::new(TtlCache::<Reading>::with_parts(
            CacheConfig::default(),
            Some(Arc::new(InMemoryMirrorBackend::new())),
            Arc::new(clock.clone()),
        ));
        let generations = Arc::new(AtomicU32::new(0));

        let source = memoize(
            Arc::clone(&cache),
            {
                let generations = Arc::clone(&generations);
                move |q: &Query| {
                    generations.fetch_add(1, Ordering::SeqCst);
                    let reading = generate(q);
                    async move { Ok::<Reading, std::convert::Infallible>(reading) }
                }
            },
            query_key,
            mirrored(5 * 60 * 1000),
        );

        let q = Query {
            source: "mill-3".into(),
            day: "2024-06-01".into(),
            count: 4,
        };

        let first = source.call(&q).await.unwrap();
        let second = source.call(&q).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(generations.load(Ordering::SeqCst), 1);

        // A different query generates independently
        let other = Query {
            count: 8,
            ..q.clone()
        };
        source.call(&other).await.unwrap();
        assert_eq!(generations.load(Ordering::SeqCst), 2);

        // Past the five-minute window the original regenerates
        clock.set(5 * 60 * 1000);
        source.call(&q).await.unwrap();
        assert_eq!(generations.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_memoized_results_survive_memory_loss_via_mirror() {
        let backend: Arc<dyn MirrorBackend> = Arc::new(InMemoryMirrorBackend::new());
        let clock = ManualClock::new(0);
        let cache = Arc::new(TtlCache::<Reading>::with_parts(
            CacheConfig::default(),
            Some(backend),
            Arc::new(clock.clone()),
        ));
        let generations = Arc::new(AtomicU32::new(0));

        let source = memoize(
            Arc::clone(&cache),
            {
                let generations = Arc::clone(&generations);
                move |q: &Query| {
                    generations.fetch_add(1, Ordering::SeqCst);
                    let reading = generate(q);
                    async move { Ok::<Reading, std::convert::Infallible>(reading) }
                }
            },
            query_key,
            mirrored(60_000),
        );

        let q = Query {
            source: "press-1".into(),
            day: "2024-06-02".into(),
            count: 2,
        };

        source.call(&q).await.unwrap();

        // Simulated restart of the hot tier; the mirror still has the result
        cache.store().clear();
        source.call(&q).await.unwrap();
        assert_eq!(generations.load(Ordering::SeqCst), 1);
    }
}

// =============================================================================
// Feature 3: Filesystem Mirror Durability Tests
// =============================================================================

mod fs_durability_tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_cache_survives_process_restart() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::new(0);

        {
            let backend = Arc::new(FsMirrorBackend::new(dir.path()).unwrap());
            let cache = TtlCache::<Vec<u32>>::with_parts(
                CacheConfig::default(),
                Some(backend),
                Arc::new(clock.clone()),
            );
            cache.set("grades", vec![92, 88, 75], mirrored(60_000)).await;
        }

        // "Restart": a brand-new cache instance over the same directory
        let backend = Arc::new(FsMirrorBackend::new(dir.path()).unwrap());
        let cache = TtlCache::<Vec<u32>>::with_parts(
            CacheConfig::default(),
            Some(backend),
            Arc::new(clock.clone()),
        );

        assert_eq!(cache.store().len(), 0);
        assert_matches!(cache.get("grades", true).await, Some(v) if v == vec![92, 88, 75]);
        // Promoted into the new instance's memory
        assert_eq!(cache.store().len(), 1);
    }

    #[tokio::test]
    async fn test_expired_entries_do_not_survive_restart() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::new(0);

        {
            let backend = Arc::new(FsMirrorBackend::new(dir.path()).unwrap());
            let cache = TtlCache::<u32>::with_parts(
                CacheConfig::default(),
                Some(backend),
                Arc::new(clock.clone()),
            );
            cache.set("stale", 1, mirrored(1_000)).await;
        }

        clock.set(5_000);
        let backend = Arc::new(FsMirrorBackend::new(dir.path()).unwrap());
        let cache = TtlCache::<u32>::with_parts(
            CacheConfig::default(),
            Some(Arc::clone(&backend) as Arc<dyn MirrorBackend>),
            Arc::new(clock.clone()),
        );

        assert_eq!(cache.get("stale", true).await, None);
        // The read also reaped the dead file
        assert!(backend.keys("cache_").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_removes_mirror_files() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(FsMirrorBackend::new(dir.path()).unwrap());
        let cache = TtlCache::<u32>::with_mirror(
            CacheConfig::default(),
            Arc::clone(&backend) as Arc<dyn MirrorBackend>,
        );

        cache.set("a", 1, mirrored(60_000)).await;
        cache.set("b", 2, mirrored(60_000)).await;
        assert_eq!(backend.keys("cache_").await.unwrap().len(), 2);

        cache.clear(true).await;
        assert!(backend.keys("cache_").await.unwrap().is_empty());
        assert!(cache.store().is_empty());
    }
}
