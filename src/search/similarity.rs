//! Similarity search engine
//!
//! Thin fail-soft layer over a [`VectorStore`]: store errors become empty
//! result lists plus a warning, so one failing collection never aborts a
//! multi-collection query.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::records::{Collection, Record};
use crate::search::SimilarityResult;
use crate::storage::VectorStore;

pub struct SimilaritySearch<S> {
    store: Arc<S>,
}

impl<S> Clone for SimilaritySearch<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: VectorStore> SimilaritySearch<S> {
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Nearest records of `collection` to `query`, most similar first.
    ///
    /// Only records with a stored vector are eligible; `owner` narrows that
    /// set further. Returns at most `limit` results and an empty list on
    /// store failure.
    pub async fn search(
        &self,
        collection: Collection,
        query: &[f32],
        limit: usize,
        owner: Option<&str>,
    ) -> Vec<SimilarityResult> {
        if limit == 0 {
            return Vec::new();
        }

        match self.store.nearest(collection, query, limit, owner).await {
            Ok(mut results) => {
                results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
                results.truncate(limit);
                debug!(%collection, count = results.len(), "similarity search");
                results
            }
            Err(err) => {
                warn!(%collection, error = %err, "similarity search failed");
                Vec::new()
            }
        }
    }

    /// Records of `collection` whose display field contains `pattern`,
    /// case-insensitively, in store order. Empty on store failure.
    pub async fn search_text(
        &self,
        collection: Collection,
        pattern: &str,
        limit: usize,
        owner: Option<&str>,
    ) -> Vec<Record> {
        if limit == 0 {
            return Vec::new();
        }

        match self.store.substring(collection, pattern, limit, owner).await {
            Ok(mut records) => {
                records.truncate(limit);
                records
            }
            Err(err) => {
                warn!(%collection, error = %err, "substring search failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, TrendError};
    use crate::storage::SqliteStore;
    use chrono::Utc;

    struct BrokenStore;

    impl VectorStore for BrokenStore {
        async fn nearest(
            &self,
            _collection: Collection,
            _query: &[f32],
            _limit: usize,
            _owner: Option<&str>,
        ) -> Result<Vec<SimilarityResult>> {
            Err(TrendError::Provider("store offline".to_string()))
        }

        async fn substring(
            &self,
            _collection: Collection,
            _pattern: &str,
            _limit: usize,
            _owner: Option<&str>,
        ) -> Result<Vec<Record>> {
            Err(TrendError::Provider("store offline".to_string()))
        }

        async fn pending_embeddings(
            &self,
            _collection: Collection,
            _after: Option<&str>,
            _limit: usize,
        ) -> Result<Vec<Record>> {
            Ok(Vec::new())
        }

        async fn store_embedding(&self, _collection: Collection, _id: &str, _vector: &[f32]) -> Result<()> {
            Ok(())
        }
    }

    fn creator(id: &str, owner: &str) -> Record {
        Record::from_parts(
            Collection::Creators,
            id.to_string(),
            Some(owner.to_string()),
            format!("Creator {id}"),
            [None, None],
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_store_failure_degrades_to_empty() {
        let engine = SimilaritySearch::new(Arc::new(BrokenStore));
        assert!(engine.search(Collection::Trends, &[1.0], 10, None).await.is_empty());
        assert!(engine.search_text(Collection::Trends, "x", 10, None).await.is_empty());
    }

    #[tokio::test]
    async fn test_zero_limit_returns_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&creator("c1", "u1"), Some(&[1.0, 0.0])).unwrap();
        let engine = SimilaritySearch::new(Arc::new(store));
        assert!(engine.search(Collection::Creators, &[1.0, 0.0], 0, None).await.is_empty());
    }

    #[tokio::test]
    async fn test_owner_filter_excludes_better_match() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&creator("exact", "someone-else"), Some(&[1.0, 0.0])).unwrap();
        store.insert(&creator("close", "me"), Some(&[0.8, 0.6])).unwrap();
        let engine = SimilaritySearch::new(Arc::new(store));

        let unfiltered = engine.search(Collection::Creators, &[1.0, 0.0], 10, None).await;
        assert_eq!(unfiltered[0].record.id(), "exact");

        let mine = engine.search(Collection::Creators, &[1.0, 0.0], 10, Some("me")).await;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].record.id(), "close");
        assert!((mine[0].similarity - 0.8).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_fewer_records_than_limit() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&creator("only", "u"), Some(&[0.0, 1.0])).unwrap();
        let engine = SimilaritySearch::new(Arc::new(store));
        let results = engine.search(Collection::Creators, &[1.0, 0.0], 10, None).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].similarity.abs() < 1e-6);
    }
}
