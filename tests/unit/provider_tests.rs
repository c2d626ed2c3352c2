use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use trendlens::TrendError;
use trendlens::cache::TtlCache;
use trendlens::config::EmbeddingConfig;
use trendlens::embeddings::{EmbeddingLookup, EmbeddingProvider, EmbeddingService, HttpEmbeddingProvider};

fn provider_for(server: &MockServer) -> HttpEmbeddingProvider {
    let config = EmbeddingConfig {
        api_key: Some("sk-test".to_string()),
        base_url: server.url("/v1"),
        model: "test-model".to_string(),
        dimensions: 3,
        timeout_secs: 5,
        batch_size: 10,
    };
    HttpEmbeddingProvider::from_config(&config)
        .expect("valid config")
        .expect("key configured")
}

#[tokio::test]
async fn http_provider_posts_and_reorders_by_index() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/embeddings")
                .header("authorization", "Bearer sk-test");
            then.status(200).json_body(json!({
                "object": "list",
                "data": [
                    {"object": "embedding", "index": 1, "embedding": [0.0, 1.0, 0.0]},
                    {"object": "embedding", "index": 0, "embedding": [1.0, 0.0, 0.0]}
                ],
                "model": "test-model"
            }));
        })
        .await;

    let provider = provider_for(&server);
    let vectors = provider
        .embed_many(&["first".to_string(), "second".to_string()])
        .await
        .expect("embeddings");

    mock.assert_async().await;
    assert_eq!(vectors, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
}

#[tokio::test]
async fn http_provider_error_status_is_provider_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(500).body("upstream exploded");
        })
        .await;

    let provider = provider_for(&server);
    let err = provider
        .embed_many(&["text".to_string()])
        .await
        .expect_err("500 must fail");
    match err {
        TrendError::Provider(message) => {
            assert!(message.contains("500"), "{message}");
            assert!(message.contains("upstream exploded"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn service_over_http_caches_and_fails_soft() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(200).json_body(json!({
                "data": [{"index": 0, "embedding": [0.6, 0.8, 0.0]}]
            }));
        })
        .await;

    let service = EmbeddingService::new(
        Some(provider_for(&server)),
        Arc::new(TtlCache::new(10, Duration::from_secs(60))),
        3,
    );

    assert!(matches!(service.resolve("hello").await, EmbeddingLookup::Fetched(_)));
    assert!(matches!(service.resolve("hello").await, EmbeddingLookup::Cached(_)));
    mock.assert_async().await;

    let dead = EmbeddingService::new(
        Some(
            HttpEmbeddingProvider::new("http://127.0.0.1:9", "sk-test", "m", Duration::from_millis(200))
                .expect("provider"),
        ),
        Arc::new(TtlCache::new(10, Duration::from_secs(60))),
        3,
    );
    assert!(dead.embed("hello").await.is_none());
}
