use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use trendlens::config::Config;
use trendlens::test_utils::{TestCase, run_table_tests};

fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn load_fixture(relative: &str) -> Config {
    let path = fixture_path(relative);
    let content = fs::read_to_string(&path).expect("read fixture");
    toml::from_str(&content).expect("parse config")
}

#[test]
fn config_embedding_section_from_fixture() -> Result<(), String> {
    let cases = vec![
        TestCase {
            name: "default",
            input: "tests/fixtures/configs/default.toml",
            expected: (
                None,
                "https://api.openai.com/v1".to_string(),
                "text-embedding-3-small".to_string(),
                1536usize,
                30u64,
                100usize,
            ),
            should_panic: false,
        },
        TestCase {
            name: "custom",
            input: "tests/fixtures/configs/custom.toml",
            expected: (
                Some("sk-fixture-0000000000abcd".to_string()),
                "http://localhost:8080/v1".to_string(),
                "local-embed".to_string(),
                384usize,
                30u64,
                100usize,
            ),
            should_panic: false,
        },
    ];

    run_table_tests(cases, |relative_path| {
        let config = load_fixture(relative_path);
        (
            config.embedding.api_key,
            config.embedding.base_url,
            config.embedding.model,
            config.embedding.dimensions,
            config.embedding.timeout_secs,
            config.embedding.batch_size,
        )
    })
}

#[test]
fn config_cache_and_search_from_fixture() -> Result<(), String> {
    let cases = vec![
        TestCase {
            name: "default",
            input: "tests/fixtures/configs/default.toml",
            expected: (500usize, Duration::from_secs(7200), Duration::from_secs(300), 10usize),
            should_panic: false,
        },
        TestCase {
            name: "custom disables caching",
            input: "tests/fixtures/configs/custom.toml",
            expected: (50usize, Duration::ZERO, Duration::ZERO, 25usize),
            should_panic: false,
        },
        TestCase {
            name: "partial keeps section defaults",
            input: "tests/fixtures/configs/partial.toml",
            expected: (500usize, Duration::from_secs(60), Duration::from_secs(300), 10usize),
            should_panic: false,
        },
    ];

    run_table_tests(cases, |relative_path| {
        let config = load_fixture(relative_path);
        (
            config.cache.max_entries,
            config.cache.ttl(),
            config.cache.result_ttl(),
            config.search.per_collection_limit,
        )
    })
}

#[test]
fn config_database_path_from_fixture() {
    let root = PathBuf::from("/data/root");

    let default = load_fixture("tests/fixtures/configs/default.toml");
    assert_eq!(default.storage.database_path(&root), root.join("trendlens.db"));

    let custom = load_fixture("tests/fixtures/configs/custom.toml");
    assert_eq!(
        custom.storage.database_path(&root),
        PathBuf::from("/var/lib/trendlens/data.db")
    );
}

#[test]
fn config_redacted_hides_fixture_key() {
    let config = load_fixture("tests/fixtures/configs/custom.toml");
    let rendered = toml::to_string(&config.redacted()).expect("serialize");
    assert!(!rendered.contains("sk-fixture"));
    assert!(rendered.contains("****abcd"));
}
