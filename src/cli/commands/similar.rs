//! trendlens similar - Rank one collection against a free-text query

use std::sync::Arc;

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::embeddings::EmbeddingLookup;
use crate::error::{Result, TrendError};
use crate::records::Collection;
use crate::search::SimilaritySearch;

#[derive(Args, Debug)]
pub struct SimilarArgs {
    /// Collection to rank
    #[arg(value_enum)]
    pub collection: Collection,

    /// Text to embed and compare against stored vectors
    pub text: String,

    /// Maximum number of results
    #[arg(long, short, default_value = "10")]
    pub limit: usize,

    /// Only return records owned by this user
    #[arg(long)]
    pub owner: Option<String>,
}

/// Unlike `search`, there is no substring fallback: a missing embedding is
/// reported as an error.
pub async fn run(ctx: &AppContext, args: &SimilarArgs) -> Result<()> {
    let text = args.text.trim();
    if text.is_empty() {
        return Err(TrendError::ValidationFailed("text must not be blank".to_string()));
    }

    let vector = match ctx.embeddings.resolve(text).await {
        EmbeddingLookup::Cached(vector) | EmbeddingLookup::Fetched(vector) => vector,
        EmbeddingLookup::Unavailable => {
            return Err(TrendError::MissingConfig(
                "embedding api key not configured; set [embedding].api_key or OPENAI_API_KEY"
                    .to_string(),
            ));
        }
        EmbeddingLookup::Failed(reason) => return Err(TrendError::Provider(reason)),
    };

    let engine = SimilaritySearch::new(Arc::clone(&ctx.store));
    let results = engine
        .search(args.collection, &vector, args.limit, args.owner.as_deref())
        .await;

    if ctx.robot_mode {
        return emit_json(&robot_ok(serde_json::json!({
            "collection": args.collection,
            "results": results,
        })));
    }

    if results.is_empty() {
        println!("No {} with stored vectors", args.collection);
        return Ok(());
    }
    for result in &results {
        println!(
            "{} {} {}",
            format!("{:.3}", result.similarity).as_str().cyan(),
            result.record.display(),
            result.record.id().dimmed()
        );
    }
    Ok(())
}
