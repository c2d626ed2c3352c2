//! Entity records the search core reads from the store.
//!
//! Three collections, each with a closed record shape. Everything the
//! orchestrator needs from a record goes through the shared projection
//! (`id`, `owner_id`, `display`).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrendError;

/// Which entity collection a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Trends,
    Creators,
    #[value(alias = "assets")]
    ContentAssets,
}

impl Collection {
    /// Every collection, in result order.
    pub const ALL: [Self; 3] = [Self::Trends, Self::Creators, Self::ContentAssets];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trends => "trends",
            Self::Creators => "creators",
            Self::ContentAssets => "content_assets",
        }
    }

    /// Backing table name.
    pub const fn table(self) -> &'static str {
        self.as_str()
    }

    /// Column matched by the substring fallback.
    pub const fn display_column(self) -> &'static str {
        match self {
            Self::Trends => "label",
            Self::Creators | Self::ContentAssets => "name",
        }
    }

    /// The two optional detail columns, in storage order.
    pub const fn detail_columns(self) -> [&'static str; 2] {
        match self {
            Self::Trends => ["description", "category"],
            Self::Creators => ["handle", "platform"],
            Self::ContentAssets => ["kind", "url"],
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = TrendError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "trends" | "trend" => Ok(Self::Trends),
            "creators" | "creator" => Ok(Self::Creators),
            "content_assets" | "content-assets" | "assets" | "asset" => Ok(Self::ContentAssets),
            other => Err(TrendError::ValidationFailed(format!(
                "unknown collection {other} (expected trends|creators|content_assets)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub id: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    pub id: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAsset {
    pub id: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A record from any collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Record {
    Trend(Trend),
    Creator(Creator),
    ContentAsset(ContentAsset),
}

/// Column values of a record in the order the store writes them.
pub(crate) struct RecordColumns<'a> {
    pub id: &'a str,
    pub owner_id: Option<&'a str>,
    pub display: &'a str,
    pub details: [Option<&'a str>; 2],
    pub created_at: DateTime<Utc>,
}

impl Record {
    /// Build a record for `collection` from its generic column values.
    pub fn from_parts(
        collection: Collection,
        id: String,
        owner_id: Option<String>,
        display: String,
        details: [Option<String>; 2],
        created_at: DateTime<Utc>,
    ) -> Self {
        let [first, second] = details;
        match collection {
            Collection::Trends => Self::Trend(Trend {
                id,
                owner_id,
                label: display,
                description: first,
                category: second,
                created_at,
            }),
            Collection::Creators => Self::Creator(Creator {
                id,
                owner_id,
                name: display,
                handle: first,
                platform: second,
                created_at,
            }),
            Collection::ContentAssets => Self::ContentAsset(ContentAsset {
                id,
                owner_id,
                name: display,
                kind: first,
                url: second,
                created_at,
            }),
        }
    }

    pub const fn collection(&self) -> Collection {
        match self {
            Self::Trend(_) => Collection::Trends,
            Self::Creator(_) => Collection::Creators,
            Self::ContentAsset(_) => Collection::ContentAssets,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Trend(t) => &t.id,
            Self::Creator(c) => &c.id,
            Self::ContentAsset(a) => &a.id,
        }
    }

    pub fn owner_id(&self) -> Option<&str> {
        match self {
            Self::Trend(t) => t.owner_id.as_deref(),
            Self::Creator(c) => c.owner_id.as_deref(),
            Self::ContentAsset(a) => a.owner_id.as_deref(),
        }
    }

    /// The label/name shown in results and matched by the substring fallback.
    pub fn display(&self) -> &str {
        match self {
            Self::Trend(t) => &t.label,
            Self::Creator(c) => &c.name,
            Self::ContentAsset(a) => &a.name,
        }
    }

    /// Text sent to the embedding provider when backfilling this record.
    pub fn embedding_text(&self) -> String {
        let columns = self.columns();
        let mut parts = vec![columns.display];
        parts.extend(columns.details.into_iter().flatten());
        parts
            .into_iter()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub(crate) fn columns(&self) -> RecordColumns<'_> {
        match self {
            Self::Trend(t) => RecordColumns {
                id: &t.id,
                owner_id: t.owner_id.as_deref(),
                display: &t.label,
                details: [t.description.as_deref(), t.category.as_deref()],
                created_at: t.created_at,
            },
            Self::Creator(c) => RecordColumns {
                id: &c.id,
                owner_id: c.owner_id.as_deref(),
                display: &c.name,
                details: [c.handle.as_deref(), c.platform.as_deref()],
                created_at: c.created_at,
            },
            Self::ContentAsset(a) => RecordColumns {
                id: &a.id,
                owner_id: a.owner_id.as_deref(),
                display: &a.name,
                details: [a.kind.as_deref(), a.url.as_deref()],
                created_at: a.created_at,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_parse_aliases() {
        assert_eq!("assets".parse::<Collection>().unwrap(), Collection::ContentAssets);
        assert_eq!("Trend".parse::<Collection>().unwrap(), Collection::Trends);
        assert!("videos".parse::<Collection>().is_err());
    }

    #[test]
    fn test_from_parts_maps_detail_columns() {
        let record = Record::from_parts(
            Collection::Creators,
            "c1".to_string(),
            Some("u1".to_string()),
            "Ada".to_string(),
            [Some("@ada".to_string()), Some("tiktok".to_string())],
            Utc::now(),
        );
        let Record::Creator(creator) = &record else {
            panic!("expected creator");
        };
        assert_eq!(creator.handle.as_deref(), Some("@ada"));
        assert_eq!(creator.platform.as_deref(), Some("tiktok"));
        assert_eq!(record.display(), "Ada");
        assert_eq!(record.owner_id(), Some("u1"));
        assert_eq!(record.collection(), Collection::Creators);
    }

    #[test]
    fn test_embedding_text_skips_empty_details() {
        let record = Record::from_parts(
            Collection::Trends,
            "t1".to_string(),
            None,
            "Dance challenge".to_string(),
            [None, Some("  music ".to_string())],
            Utc::now(),
        );
        assert_eq!(record.embedding_text(), "Dance challenge\nmusic");
    }

    #[test]
    fn test_record_serializes_with_type_tag() {
        let record = Record::from_parts(
            Collection::ContentAssets,
            "a1".to_string(),
            None,
            "Clip".to_string(),
            [Some("video".to_string()), None],
            Utc::now(),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "content_asset");
        assert_eq!(json["name"], "Clip");
    }
}
