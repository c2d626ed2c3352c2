//! Query orchestrator
//!
//! Free text in, `{trends, creators, assets}` out. The query is embedded
//! through the cache-fronted [`EmbeddingService`]; with a vector, the three
//! collections are ranked concurrently by similarity. Without one (no
//! credential, provider down) each collection falls back to a
//! case-insensitive substring match on its label/name, in store order.
//!
//! The two paths rank differently on purpose: semantic lists are sorted by
//! descending similarity, fallback lists are not sorted at all.

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::TtlCache;
use crate::embeddings::{EmbeddingLookup, EmbeddingProvider, EmbeddingService, content_hash};
use crate::records::Collection;
use crate::search::{DEFAULT_RESULT_LIMIT, Hit, SearchResults, SimilaritySearch};
use crate::storage::VectorStore;

/// Which path produced a [`SearchOutcome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMode {
    /// Blank query; nothing was looked up
    Skipped,
    /// Ranked by similarity, possibly served from the results cache
    Semantic,
    /// Substring fallback because no provider is configured
    NoProvider,
    /// Substring fallback because the provider call failed
    ProviderFailed(String),
}

impl SearchMode {
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::NoProvider | Self::ProviderFailed(_))
    }

    /// Human-readable reason the fallback was used, if it was.
    pub fn fallback_reason(&self) -> Option<String> {
        match self {
            Self::NoProvider => {
                Some("embedding provider not configured; substring fallback used".to_string())
            }
            Self::ProviderFailed(reason) => {
                Some(format!("embedding request failed ({reason}); substring fallback used"))
            }
            Self::Skipped | Self::Semantic => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub results: SearchResults,
    pub mode: SearchMode,
}

pub struct QueryOrchestrator<P, S> {
    embeddings: Arc<EmbeddingService<P>>,
    search: SimilaritySearch<S>,
    limit: usize,
    results_cache: Option<Arc<TtlCache<SearchResults>>>,
}

impl<P, S> QueryOrchestrator<P, S>
where
    P: EmbeddingProvider,
    S: VectorStore,
{
    pub const fn new(embeddings: Arc<EmbeddingService<P>>, search: SimilaritySearch<S>) -> Self {
        Self {
            embeddings,
            search,
            limit: DEFAULT_RESULT_LIMIT,
            results_cache: None,
        }
    }

    /// Cap each collection's list at `limit` results.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Memoise semantic results. Fallback results are never cached.
    #[must_use]
    pub fn with_results_cache(mut self, cache: Arc<TtlCache<SearchResults>>) -> Self {
        self.results_cache = Some(cache);
        self
    }

    pub const fn limit(&self) -> usize {
        self.limit
    }

    pub fn embeddings(&self) -> &Arc<EmbeddingService<P>> {
        &self.embeddings
    }

    /// Search every collection for `query`.
    pub async fn search(&self, query: &str) -> SearchResults {
        self.search_scoped(query, None).await
    }

    /// Search every collection for `query`, restricted to `owner`'s records
    /// when given.
    pub async fn search_scoped(&self, query: &str, owner: Option<&str>) -> SearchResults {
        self.search_detailed(query, owner).await.results
    }

    /// [`Self::search_scoped`], also reporting which path answered.
    pub async fn search_detailed(&self, query: &str, owner: Option<&str>) -> SearchOutcome {
        let query = query.trim();
        if query.is_empty() {
            return SearchOutcome {
                results: SearchResults::default(),
                mode: SearchMode::Skipped,
            };
        }

        let cache_key = results_key(query, owner);
        if let Some(cache) = &self.results_cache {
            if let Some(results) = cache.get(&cache_key) {
                debug!(query, "search results cache hit");
                return SearchOutcome {
                    results,
                    mode: SearchMode::Semantic,
                };
            }
        }

        let vector = match self.embeddings.resolve(query).await {
            EmbeddingLookup::Cached(vector) | EmbeddingLookup::Fetched(vector) => vector,
            EmbeddingLookup::Unavailable => {
                info!(query, "no embedding provider; using substring fallback");
                return SearchOutcome {
                    results: self.substring_fallback(query, owner).await,
                    mode: SearchMode::NoProvider,
                };
            }
            EmbeddingLookup::Failed(reason) => {
                info!(query, %reason, "embedding failed; using substring fallback");
                return SearchOutcome {
                    results: self.substring_fallback(query, owner).await,
                    mode: SearchMode::ProviderFailed(reason),
                };
            }
        };

        let limit = self.limit;
        let (trends, creators, assets) = tokio::join!(
            self.search.search(Collection::Trends, &vector, limit, owner),
            self.search.search(Collection::Creators, &vector, limit, owner),
            self.search.search(Collection::ContentAssets, &vector, limit, owner),
        );

        let results = SearchResults {
            trends: trends.into_iter().map(Hit::from).collect(),
            creators: creators.into_iter().map(Hit::from).collect(),
            assets: assets.into_iter().map(Hit::from).collect(),
        };
        debug!(query, total = results.total(), "semantic search complete");

        if let Some(cache) = &self.results_cache {
            cache.set(cache_key, results.clone());
        }
        SearchOutcome {
            results,
            mode: SearchMode::Semantic,
        }
    }

    async fn substring_fallback(&self, query: &str, owner: Option<&str>) -> SearchResults {
        let limit = self.limit;
        let (trends, creators, assets) = tokio::join!(
            self.search.search_text(Collection::Trends, query, limit, owner),
            self.search.search_text(Collection::Creators, query, limit, owner),
            self.search.search_text(Collection::ContentAssets, query, limit, owner),
        );

        SearchResults {
            trends: trends.into_iter().map(Hit::from).collect(),
            creators: creators.into_iter().map(Hit::from).collect(),
            assets: assets.into_iter().map(Hit::from).collect(),
        }
    }
}

/// Same text hash as the embedding cache, so a results hit implies the
/// embedding for that exact text.
fn results_key(query: &str, owner: Option<&str>) -> String {
    format!("{}\u{1f}{}", owner.unwrap_or(""), content_hash(query))
}
