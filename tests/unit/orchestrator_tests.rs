use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use trendlens::Result;
use trendlens::cache::TtlCache;
use trendlens::embeddings::{EMBEDDING_DIM, EmbeddingService};
use trendlens::records::{Collection, Record};
use trendlens::search::{QueryOrchestrator, SimilarityResult, SimilaritySearch};
use trendlens::storage::{SqliteStore, VectorStore};
use trendlens::test_utils::fixtures::{StoreFixture, unit_vector};
use trendlens::test_utils::provider::RecordingProvider;

/// Store wrapper counting which primitives the orchestrator touches.
struct CountingStore {
    inner: SqliteStore,
    nearest_calls: AtomicUsize,
    substring_calls: AtomicUsize,
}

impl CountingStore {
    fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            nearest_calls: AtomicUsize::new(0),
            substring_calls: AtomicUsize::new(0),
        }
    }
}

impl VectorStore for CountingStore {
    async fn nearest(
        &self,
        collection: Collection,
        query: &[f32],
        limit: usize,
        owner: Option<&str>,
    ) -> Result<Vec<SimilarityResult>> {
        self.nearest_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.nearest(collection, query, limit, owner).await
    }

    async fn substring(
        &self,
        collection: Collection,
        pattern: &str,
        limit: usize,
        owner: Option<&str>,
    ) -> Result<Vec<Record>> {
        self.substring_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.substring(collection, pattern, limit, owner).await
    }

    async fn pending_embeddings(
        &self,
        collection: Collection,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Record>> {
        self.inner.pending_embeddings(collection, after, limit).await
    }

    async fn store_embedding(&self, collection: Collection, id: &str, vector: &[f32]) -> Result<()> {
        self.inner.store_embedding(collection, id, vector).await
    }
}

fn service(provider: Option<RecordingProvider>, dim: usize) -> Arc<EmbeddingService<RecordingProvider>> {
    Arc::new(EmbeddingService::new(
        provider,
        Arc::new(TtlCache::new(500, Duration::from_secs(7200))),
        dim,
    ))
}

fn is_descending(similarities: &[f32]) -> bool {
    similarities.windows(2).all(|pair| pair[0] >= pair[1])
}

#[tokio::test]
async fn dance_trends_end_to_end() {
    let fixture = StoreFixture::new();
    for i in 0..15 {
        let angle = 0.1 * i as f32;
        fixture.insert(
            Collection::Trends,
            &format!("trend-{i:02}"),
            &format!("Trend {i}"),
            None,
            Some(&unit_vector(EMBEDDING_DIM, angle)),
        );
    }
    for i in 0..3 {
        fixture.insert(
            Collection::Creators,
            &format!("creator-{i}"),
            &format!("Creator {i}"),
            None,
            Some(&unit_vector(EMBEDDING_DIM, 0.3 * i as f32)),
        );
    }
    for i in 0..12 {
        fixture.insert(
            Collection::ContentAssets,
            &format!("asset-{i:02}"),
            &format!("Asset {i}"),
            None,
            Some(&unit_vector(EMBEDDING_DIM, 0.2 * i as f32)),
        );
    }

    let provider = RecordingProvider::new(EMBEDDING_DIM)
        .with_vector("dance trends", unit_vector(EMBEDDING_DIM, 0.0));
    let store = Arc::new(fixture.store.clone());
    let orchestrator = QueryOrchestrator::new(
        service(Some(provider.clone()), EMBEDDING_DIM),
        SimilaritySearch::new(store),
    );

    let results = orchestrator.search("dance trends").await;

    assert_eq!(provider.call_count(), 1);
    assert_eq!(results.trends.len(), 10);
    assert_eq!(results.creators.len(), 3);
    assert_eq!(results.assets.len(), 10);

    for hits in [&results.trends, &results.creators, &results.assets] {
        let similarities: Vec<f32> = hits.iter().map(|hit| hit.similarity.unwrap()).collect();
        assert!(is_descending(&similarities), "not descending: {similarities:?}");
    }
    assert_eq!(results.trends[0].id(), "trend-00");
    assert!((results.trends[0].similarity.unwrap() - 1.0).abs() < 1e-5);
    assert_eq!(results.trends[9].id(), "trend-09");

    let again = orchestrator.search("dance trends").await;
    assert_eq!(provider.call_count(), 1, "second query must be served from cache");
    assert_eq!(again, results);
}

#[tokio::test]
async fn fallback_never_touches_similarity_path() {
    let fixture = StoreFixture::new();
    fixture.insert(Collection::Trends, "t1", "Dance challenge", None, None);
    fixture.insert(Collection::Creators, "c1", "Dancer Dee", None, Some(&[1.0, 0.0]));
    fixture.insert(Collection::ContentAssets, "a1", "Cooking clip", None, None);

    let store = Arc::new(CountingStore::new(fixture.store.clone()));
    let orchestrator =
        QueryOrchestrator::new(service(None, 2), SimilaritySearch::new(Arc::clone(&store)));

    let results = orchestrator.search("DANCE").await;

    assert_eq!(store.nearest_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.substring_calls.load(Ordering::SeqCst), 3);
    assert_eq!(results.trends.len(), 1);
    assert_eq!(results.creators.len(), 1);
    assert!(results.assets.is_empty());
    assert!(results.trends.iter().all(|hit| hit.similarity.is_none()));
}

#[tokio::test]
async fn failing_provider_degrades_to_fallback() {
    let fixture = StoreFixture::new();
    fixture.insert(Collection::Trends, "t1", "Dance", None, Some(&[1.0, 0.0]));

    let store = Arc::new(CountingStore::new(fixture.store.clone()));
    let provider = RecordingProvider::failing(2);
    let orchestrator = QueryOrchestrator::new(
        service(Some(provider.clone()), 2),
        SimilaritySearch::new(Arc::clone(&store)),
    );

    let results = orchestrator.search("dance").await;
    assert_eq!(provider.call_count(), 1);
    assert_eq!(store.nearest_calls.load(Ordering::SeqCst), 0);
    assert_eq!(results.trends.len(), 1);
    assert!(results.trends[0].similarity.is_none());
}

#[tokio::test]
async fn blank_query_touches_nothing() {
    let fixture = StoreFixture::new();
    let store = Arc::new(CountingStore::new(fixture.store.clone()));
    let provider = RecordingProvider::new(2);
    let orchestrator = QueryOrchestrator::new(
        service(Some(provider.clone()), 2),
        SimilaritySearch::new(Arc::clone(&store)),
    );

    let results = orchestrator.search("   ").await;
    assert!(results.is_empty());
    assert_eq!(provider.call_count(), 0);
    assert_eq!(store.nearest_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.substring_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn owner_scope_applies_on_both_paths() {
    let fixture = StoreFixture::new();
    fixture.insert(Collection::Trends, "mine", "Dance A", Some("u1"), Some(&[0.6, 0.8]));
    fixture.insert(Collection::Trends, "theirs", "Dance B", Some("u2"), Some(&[1.0, 0.0]));
    let store = Arc::new(fixture.store.clone());

    let semantic = QueryOrchestrator::new(
        service(Some(RecordingProvider::new(2).with_vector("dance", vec![1.0, 0.0])), 2),
        SimilaritySearch::new(Arc::clone(&store)),
    );
    let scoped = semantic.search_scoped("dance", Some("u1")).await;
    assert_eq!(scoped.trends.len(), 1);
    assert_eq!(scoped.trends[0].id(), "mine");

    let fallback = QueryOrchestrator::new(service(None, 2), SimilaritySearch::new(store));
    let scoped = fallback.search_scoped("dance", Some("u2")).await;
    assert_eq!(scoped.trends.len(), 1);
    assert_eq!(scoped.trends[0].id(), "theirs");
}
