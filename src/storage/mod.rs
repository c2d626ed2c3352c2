//! Storage layer for trendlens
//!
//! The search core only needs a vector-capable store: a nullable vector per
//! record, a nearest-neighbour primitive that reports `1 - cosine distance`,
//! equality filtering on the owner, and a plain substring match. The
//! bundled implementation is SQLite with a registered `cosine_distance`
//! scalar function.

use std::future::Future;

use crate::error::Result;
use crate::records::{Collection, Record};
use crate::search::SimilarityResult;

pub mod migrations;
pub mod sqlite;
pub mod vector;

pub use sqlite::SqliteStore;

/// A store that can rank records of a collection by vector similarity.
pub trait VectorStore: Send + Sync {
    /// Records of `collection` that have a stored vector, nearest first.
    ///
    /// `similarity` is `1 - cosine_distance` and is not clamped. When
    /// `owner` is given only that owner's records are eligible.
    fn nearest(
        &self,
        collection: Collection,
        query: &[f32],
        limit: usize,
        owner: Option<&str>,
    ) -> impl Future<Output = Result<Vec<SimilarityResult>>> + Send;

    /// Records whose display field contains `pattern`, case-insensitively,
    /// in the store's default order.
    fn substring(
        &self,
        collection: Collection,
        pattern: &str,
        limit: usize,
        owner: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Record>>> + Send;

    /// Records without a stored vector, ordered by id, starting after
    /// `after` when given.
    fn pending_embeddings(
        &self,
        collection: Collection,
        after: Option<&str>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Record>>> + Send;

    /// Attach a vector to a record.
    fn store_embedding(
        &self,
        collection: Collection,
        id: &str,
        vector: &[f32],
    ) -> impl Future<Output = Result<()>> + Send;
}
