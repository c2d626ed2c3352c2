//! trendlens - semantic search over trends, creators and content assets.
//!
//! Text is embedded through a cache-fronted provider and ranked against
//! vectors stored in SQLite; without an embedding, queries degrade to a
//! substring match.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod records;
pub mod search;
pub mod storage;
pub mod test_utils;

pub use error::{Result, TrendError};
