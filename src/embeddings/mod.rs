//! Embedding adapter
//!
//! Wraps a remote [`EmbeddingProvider`] with a content-hash keyed cache.
//! Lookups go cache -> provider -> nothing: a missing credential or a
//! failed provider call yields no vector instead of an error, and callers
//! fall back to non-semantic retrieval.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::error::{Result, TrendError};

pub mod backfill;
pub mod provider;

pub use backfill::{BackfillReport, backfill};
pub use provider::HttpEmbeddingProvider;

/// Default embedding dimension (text-embedding-3-small / ada-002)
pub const EMBEDDING_DIM: usize = 1536;

/// Default embedding model
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// An immutable embedding vector, cheap to clone out of the cache.
pub type Embedding = Arc<[f32]>;

/// A remote text-embedding service.
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier sent with every request.
    fn model(&self) -> &str;

    /// Embed every input, returning one vector per input in request order.
    fn embed_many(&self, inputs: &[String]) -> impl Future<Output = Result<Vec<Vec<f32>>>> + Send;
}

/// How a single lookup was resolved.
#[derive(Debug, Clone)]
pub enum EmbeddingLookup {
    /// Served from the cache without a provider call
    Cached(Embedding),
    /// Fetched from the provider and cached
    Fetched(Embedding),
    /// No provider credential configured
    Unavailable,
    /// The provider call failed; the reason was logged
    Failed(String),
}

impl EmbeddingLookup {
    /// The vector, if one was produced.
    pub fn into_embedding(self) -> Option<Embedding> {
        match self {
            Self::Cached(vector) | Self::Fetched(vector) => Some(vector),
            Self::Unavailable | Self::Failed(_) => None,
        }
    }
}

/// SHA-256 hex digest of `text`, the cache key for its embedding.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Cache-fronted embedding adapter.
///
/// Concurrent misses for the same text may each reach the provider; the
/// cache write is atomic, so the later write replaces an equivalent vector.
pub struct EmbeddingService<P> {
    provider: Option<P>,
    cache: Arc<TtlCache<Embedding>>,
    dimensions: usize,
}

impl<P: EmbeddingProvider> EmbeddingService<P> {
    /// `provider` is `None` when no credential is configured. A `dimensions`
    /// of zero disables the length check on provider responses.
    pub const fn new(provider: Option<P>, cache: Arc<TtlCache<Embedding>>, dimensions: usize) -> Self {
        Self {
            provider,
            cache,
            dimensions,
        }
    }

    /// Whether a provider is configured.
    pub const fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    pub fn cache(&self) -> &Arc<TtlCache<Embedding>> {
        &self.cache
    }

    pub const fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed one text, or `None` when no embedding is available.
    pub async fn embed(&self, text: &str) -> Option<Embedding> {
        self.resolve(text).await.into_embedding()
    }

    /// Embed one text, reporting how the lookup was resolved.
    pub async fn resolve(&self, text: &str) -> EmbeddingLookup {
        let key = content_hash(text);
        if let Some(vector) = self.cache.get(&key) {
            debug!(hash = %&key[..12], "embedding cache hit");
            return EmbeddingLookup::Cached(vector);
        }

        let Some(provider) = &self.provider else {
            debug!("no embedding provider configured");
            return EmbeddingLookup::Unavailable;
        };

        match self.fetch(provider, &[text.to_string()]).await {
            Ok(mut vectors) => match vectors.pop() {
                Some(vector) => {
                    self.cache.set(key, Arc::clone(&vector));
                    EmbeddingLookup::Fetched(vector)
                }
                None => EmbeddingLookup::Failed("provider returned no vectors".to_string()),
            },
            Err(err) => {
                warn!(error = %err, "embedding request failed");
                EmbeddingLookup::Failed(err.to_string())
            }
        }
    }

    /// Embed many texts, returning one slot per input in input order.
    ///
    /// Cached texts are resolved locally; the distinct uncached texts go to
    /// the provider in a single request. If that request fails only the
    /// unresolved slots stay `None`.
    pub async fn embed_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Option<Embedding>> {
        let mut slots: Vec<Option<Embedding>> = vec![None; texts.len()];
        let mut uncached: Vec<(String, String)> = Vec::new();
        let mut waiting: HashMap<String, Vec<usize>> = HashMap::new();

        for (index, text) in texts.iter().enumerate() {
            let text = text.as_ref();
            let key = content_hash(text);
            if let Some(vector) = self.cache.get(&key) {
                slots[index] = Some(vector);
                continue;
            }
            let positions = waiting.entry(key.clone()).or_default();
            if positions.is_empty() {
                uncached.push((key, text.to_string()));
            }
            positions.push(index);
        }

        debug!(
            total = texts.len(),
            cached = texts.len() - waiting.values().map(Vec::len).sum::<usize>(),
            requested = uncached.len(),
            "embedding batch partitioned"
        );

        if uncached.is_empty() {
            return slots;
        }
        let Some(provider) = &self.provider else {
            debug!("no embedding provider configured");
            return slots;
        };

        let inputs: Vec<String> = uncached.iter().map(|(_, text)| text.clone()).collect();
        match self.fetch(provider, &inputs).await {
            Ok(vectors) => {
                for ((key, _), vector) in uncached.into_iter().zip(vectors) {
                    if let Some(positions) = waiting.get(&key) {
                        for &index in positions {
                            slots[index] = Some(Arc::clone(&vector));
                        }
                    }
                    self.cache.set(key, vector);
                }
            }
            Err(err) => {
                warn!(error = %err, inputs = inputs.len(), "batch embedding request failed");
            }
        }

        slots
    }

    async fn fetch(&self, provider: &P, inputs: &[String]) -> Result<Vec<Embedding>> {
        let vectors = provider.embed_many(inputs).await?;
        if vectors.len() != inputs.len() {
            return Err(TrendError::Provider(format!(
                "expected {} vectors, provider returned {}",
                inputs.len(),
                vectors.len()
            )));
        }
        if self.dimensions > 0 {
            if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimensions) {
                return Err(TrendError::Provider(format!(
                    "expected {}-dimensional vectors, provider returned {}",
                    self.dimensions,
                    bad.len()
                )));
            }
        }
        Ok(vectors.into_iter().map(Embedding::from).collect())
    }
}
