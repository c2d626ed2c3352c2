//! trendlens index - Embed records that have no vector yet

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::embeddings::{BackfillReport, backfill};
use crate::error::Result;
use crate::records::Collection;
use crate::storage::sqlite::CollectionCounts;

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Only index this collection (all collections when omitted)
    #[arg(long, value_enum)]
    pub collection: Option<Collection>,

    /// Maximum records to embed per collection
    #[arg(long)]
    pub limit: Option<usize>,

    /// Records per provider request (overrides [embedding].batch_size)
    #[arg(long)]
    pub batch_size: Option<usize>,
}

pub async fn run(ctx: &AppContext, args: &IndexArgs) -> Result<()> {
    let batch_size = args.batch_size.unwrap_or(ctx.config.embedding.batch_size);
    let collections = args
        .collection
        .map_or_else(|| Collection::ALL.to_vec(), |collection| vec![collection]);

    let mut reports: Vec<BackfillReport> = Vec::with_capacity(collections.len());
    let mut coverage: Vec<(Collection, CollectionCounts)> = Vec::with_capacity(collections.len());
    for collection in collections {
        let report = backfill(
            ctx.embeddings.as_ref(),
            ctx.store.as_ref(),
            collection,
            batch_size,
            args.limit,
        )
        .await?;
        reports.push(report);
        coverage.push((collection, ctx.store.counts(collection)?));
    }

    if ctx.robot_mode {
        let coverage: serde_json::Map<String, serde_json::Value> = coverage
            .iter()
            .map(|(collection, counts)| (collection.to_string(), serde_json::json!(counts)))
            .collect();
        return emit_json(&robot_ok(serde_json::json!({
            "reports": reports,
            "coverage": coverage,
        })));
    }

    let mut layout = HumanLayout::new();
    layout.title("Index");
    for (report, (_, counts)) in reports.iter().zip(&coverage) {
        let name = report
            .collection
            .map_or_else(|| "-".to_string(), |collection| collection.to_string());
        let skipped = if report.skipped > 0 {
            format!("{} skipped", report.skipped).as_str().yellow().to_string()
        } else {
            "0 skipped".to_string()
        };
        layout.kv(
            &name,
            &format!(
                "{} scanned, {} embedded, {skipped} ({}/{} with vectors)",
                report.scanned,
                report.embedded.to_string().as_str().green(),
                counts.embedded,
                counts.total
            ),
        );
    }
    emit_human(layout);
    Ok(())
}
