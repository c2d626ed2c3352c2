use std::time::Duration;

use trendlens::cache::TtlCache;
use trendlens::test_utils::{TestCase, run_table_tests};

#[derive(Debug, Clone, Copy)]
enum Op {
    Set(&'static str),
    Get(&'static str),
}

/// Apply `ops` to a cache of `capacity` and report the surviving keys.
fn surviving_keys(capacity: usize, ops: &[Op]) -> Vec<&'static str> {
    let cache = TtlCache::new(capacity, Duration::from_secs(3600));
    let mut seen: Vec<&'static str> = Vec::new();
    for op in ops {
        match *op {
            Op::Set(key) => {
                cache.set(key, key.len());
                if !seen.contains(&key) {
                    seen.push(key);
                }
            }
            Op::Get(key) => {
                let _ = cache.get(key);
            }
        }
    }
    seen.into_iter().filter(|key| cache.has(key)).collect()
}

#[test]
fn cache_eviction_table() -> Result<(), String> {
    use Op::{Get, Set};

    let cases = vec![
        TestCase {
            name: "lowest hit count evicted",
            input: (
                3,
                vec![Set("A"), Set("B"), Set("C"), Get("B"), Get("B"), Get("B"), Get("C"), Set("D")],
            ),
            expected: vec!["B", "C", "D"],
            should_panic: false,
        },
        TestCase {
            name: "ties go to earliest insertion",
            input: (2, vec![Set("A"), Set("B"), Set("C")]),
            expected: vec!["B", "C"],
            should_panic: false,
        },
        TestCase {
            name: "overwrite keeps position and resets hits",
            input: (
                2,
                vec![Set("A"), Set("B"), Get("A"), Get("B"), Set("A"), Set("C")],
            ),
            expected: vec!["B", "C"],
            should_panic: false,
        },
        TestCase {
            name: "overwrite at capacity evicts nothing",
            input: (2, vec![Set("A"), Set("B"), Set("B")]),
            expected: vec!["A", "B"],
            should_panic: false,
        },
        TestCase {
            name: "zero capacity holds one",
            input: (0, vec![Set("A"), Set("B")]),
            expected: vec!["B"],
            should_panic: false,
        },
    ];

    run_table_tests(cases, |(capacity, ops)| surviving_keys(capacity, &ops))
}

#[test]
fn cache_stats_track_activity() {
    let cache = TtlCache::new(2, Duration::from_secs(60));
    cache.set("a", 1);
    cache.set("b", 2);
    assert_eq!(cache.get("a"), Some(1));
    assert_eq!(cache.get("missing"), None);
    cache.set("c", 3);

    let stats = cache.stats();
    assert_eq!(stats.size, 2);
    assert_eq!(stats.max_size, 2);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.evictions, 1);
    assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn cache_ttl_two_hours() {
    let cache = TtlCache::new(10, Duration::from_secs(2 * 60 * 60));
    cache.set("embedding", vec![0.5_f32]);

    tokio::time::advance(Duration::from_secs(119 * 60)).await;
    assert_eq!(cache.get("embedding"), Some(vec![0.5_f32]));

    tokio::time::advance(Duration::from_secs(2 * 60)).await;
    assert_eq!(cache.get("embedding"), None);
    assert_eq!(cache.stats().expirations, 1);
}
