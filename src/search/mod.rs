//! Semantic search over trends, creators and content assets.
//!
//! [`SimilaritySearch`] ranks one collection against a query vector;
//! [`QueryOrchestrator`] turns free text into per-collection results,
//! semantically when an embedding is available and by substring otherwise.

use serde::Serialize;

use crate::records::{Collection, Record};

pub mod orchestrator;
pub mod similarity;

pub use orchestrator::{QueryOrchestrator, SearchMode, SearchOutcome};
pub use similarity::SimilaritySearch;

/// Default per-collection result cap for orchestrated queries
pub const DEFAULT_RESULT_LIMIT: usize = 10;

/// A record ranked against a query vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityResult {
    pub record: Record,
    /// `1 - cosine_distance`; negative for anti-correlated vectors
    pub similarity: f32,
}

/// One entry of an orchestrated result list.
///
/// `similarity` is set on the semantic path and absent on the substring
/// fallback, whose lists keep the store's order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    #[serde(flatten)]
    pub record: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
}

impl Hit {
    pub fn id(&self) -> &str {
        self.record.id()
    }

    pub fn display(&self) -> &str {
        self.record.display()
    }
}

impl From<SimilarityResult> for Hit {
    fn from(result: SimilarityResult) -> Self {
        Self {
            record: result.record,
            similarity: Some(result.similarity),
        }
    }
}

impl From<Record> for Hit {
    fn from(record: Record) -> Self {
        Self {
            record,
            similarity: None,
        }
    }
}

/// Results of one orchestrated query, grouped by collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub trends: Vec<Hit>,
    pub creators: Vec<Hit>,
    pub assets: Vec<Hit>,
}

impl SearchResults {
    pub fn get(&self, collection: Collection) -> &[Hit] {
        match collection {
            Collection::Trends => &self.trends,
            Collection::Creators => &self.creators,
            Collection::ContentAssets => &self.assets,
        }
    }

    pub fn total(&self) -> usize {
        self.trends.len() + self.creators.len() + self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
