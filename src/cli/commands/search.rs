//! trendlens search - Search every collection for a free-text query

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::error::Result;
use crate::records::Collection;
use crate::search::{Hit, SearchResults};

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Maximum results per collection (overrides [search].per_collection_limit)
    #[arg(long, short)]
    pub limit: Option<usize>,

    /// Only return records owned by this user
    #[arg(long)]
    pub owner: Option<String>,
}

pub async fn run(ctx: &AppContext, args: &SearchArgs) -> Result<()> {
    let orchestrator = ctx.orchestrator(args.limit);
    let outcome = orchestrator
        .search_detailed(&args.query, args.owner.as_deref())
        .await;
    let fallback = outcome.mode.fallback_reason();

    if ctx.robot_mode {
        let mut response = robot_ok(&outcome.results);
        if let Some(reason) = fallback {
            response = response.with_warning(reason);
        }
        return emit_json(&response);
    }

    if let Some(reason) = fallback {
        eprintln!("{}", reason.as_str().yellow());
    }
    print_results(&args.query, &outcome.results);
    Ok(())
}

fn print_results(query: &str, results: &SearchResults) {
    if results.is_empty() {
        println!("No results for {}", query.trim().bold());
        return;
    }

    for collection in Collection::ALL {
        let hits = results.get(collection);
        if hits.is_empty() {
            continue;
        }
        println!("{} ({})", collection.to_string().as_str().bold(), hits.len());
        for hit in hits {
            println!("  {}", format_hit(hit));
        }
        println!();
    }
}

fn format_hit(hit: &Hit) -> String {
    let score = hit
        .similarity
        .map_or_else(|| "  -  ".to_string(), |similarity| format!("{similarity:.3}"));
    format!("{} {} {}", score.as_str().cyan(), hit.display(), hit.id().dimmed())
}
