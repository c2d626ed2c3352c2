//! Embedding backfill for records stored without a vector.

use serde::Serialize;
use tracing::{info, warn};

use crate::embeddings::{EmbeddingProvider, EmbeddingService};
use crate::error::{Result, TrendError};
use crate::records::{Collection, Record};
use crate::storage::VectorStore;

/// Outcome of one backfill run over a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub collection: Option<Collection>,
    /// Records without a vector that were looked at
    pub scanned: usize,
    /// Records that received a vector
    pub embedded: usize,
    /// Records left without a vector (provider returned nothing for them)
    pub skipped: usize,
}

/// Embed records of `collection` that have no vector yet.
///
/// Works in `batch_size` chunks (one provider request each) walking the
/// collection by id, so records the provider keeps failing on are skipped
/// rather than retried forever. Stops after `max_records` when given.
pub async fn backfill<P, S>(
    service: &EmbeddingService<P>,
    store: &S,
    collection: Collection,
    batch_size: usize,
    max_records: Option<usize>,
) -> Result<BackfillReport>
where
    P: EmbeddingProvider,
    S: VectorStore,
{
    if !service.is_available() {
        return Err(TrendError::MissingConfig(
            "embedding api key not configured; set [embedding].api_key or OPENAI_API_KEY"
                .to_string(),
        ));
    }

    let batch_size = batch_size.max(1);
    let mut report = BackfillReport {
        collection: Some(collection),
        ..BackfillReport::default()
    };
    let mut cursor: Option<String> = None;

    loop {
        let budget = max_records.map_or(batch_size, |max| batch_size.min(max - report.scanned));
        if budget == 0 {
            break;
        }

        let records = store
            .pending_embeddings(collection, cursor.as_deref(), budget)
            .await?;
        let Some(last) = records.last() else {
            break;
        };
        cursor = Some(last.id().to_string());

        let texts: Vec<String> = records.iter().map(Record::embedding_text).collect();
        let vectors = service.embed_batch(&texts).await;

        for (record, vector) in records.iter().zip(vectors) {
            report.scanned += 1;
            match vector {
                Some(vector) => {
                    store.store_embedding(collection, record.id(), &vector).await?;
                    report.embedded += 1;
                }
                None => {
                    warn!(%collection, id = record.id(), "no embedding produced; skipping record");
                    report.skipped += 1;
                }
            }
        }

        info!(
            %collection,
            scanned = report.scanned,
            embedded = report.embedded,
            skipped = report.skipped,
            "backfill progress"
        );

        if records.len() < budget {
            break;
        }
    }

    Ok(report)
}
