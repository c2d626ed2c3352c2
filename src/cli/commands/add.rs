//! trendlens add - Insert a trend, creator or content asset

use chrono::Utc;
use clap::Args;
use colored::Colorize;
use tracing::warn;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::error::{Result, TrendError};
use crate::records::{Collection, Record};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Target collection: trends, creators or content-assets
    #[arg(value_enum)]
    pub collection: Collection,

    /// Label (trends) or name (creators, content assets)
    pub display: String,

    /// Record id (random UUID when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Owning user id
    #[arg(long)]
    pub owner: Option<String>,

    /// Detail field as key=value (e.g. description=..., handle=..., url=...)
    #[arg(long = "field", value_name = "KEY=VALUE")]
    pub fields: Vec<String>,

    /// Store without computing an embedding
    #[arg(long)]
    pub no_embed: bool,
}

pub async fn run(ctx: &AppContext, args: &AddArgs) -> Result<()> {
    let details = parse_fields(args.collection, &args.fields)?;
    let record = Record::from_parts(
        args.collection,
        args.id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        args.owner.clone(),
        args.display.clone(),
        details,
        Utc::now(),
    );

    let embedding = if args.no_embed {
        None
    } else {
        let embedding = ctx.embeddings.embed(&record.embedding_text()).await;
        if embedding.is_none() && ctx.embeddings.is_available() {
            warn!(id = record.id(), "embedding failed; storing record without a vector");
        }
        embedding
    };

    ctx.store.insert(&record, embedding.as_deref())?;

    if ctx.robot_mode {
        let payload = serde_json::json!({
            "record": record,
            "embedded": embedding.is_some(),
        });
        return emit_json(&robot_ok(payload));
    }

    println!(
        "{} {} {} ({})",
        "Added".green().bold(),
        args.collection,
        record.display().bold(),
        record.id().dimmed()
    );
    if embedding.is_none() {
        println!(
            "{}",
            "No embedding stored; run `trendlens index` once a provider is configured.".yellow()
        );
    }
    Ok(())
}

/// Map `key=value` pairs onto the collection's two detail columns.
fn parse_fields(collection: Collection, fields: &[String]) -> Result<[Option<String>; 2]> {
    let columns = collection.detail_columns();
    let mut details: [Option<String>; 2] = [None, None];

    for field in fields {
        let (key, value) = field.split_once('=').ok_or_else(|| {
            TrendError::ValidationFailed(format!("field must be KEY=VALUE, got {field:?}"))
        })?;
        let key = key.trim();
        let slot = columns
            .iter()
            .position(|column| *column == key)
            .ok_or_else(|| {
                TrendError::ValidationFailed(format!(
                    "unknown field {key:?} for {collection}; expected one of {}",
                    columns.join(", ")
                ))
            })?;
        details[slot] = Some(value.to_string());
    }

    Ok(details)
}
