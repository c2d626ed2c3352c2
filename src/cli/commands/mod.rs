//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use clap::Subcommand;

pub mod add;
pub mod config;
pub mod index;
pub mod init;
pub mod search;
pub mod similar;

use crate::app::AppContext;
use crate::cli::Cli;
use crate::error::Result;

/// Dispatch the parsed command. Init runs before a context exists since
/// the data root may not be there yet.
pub async fn run(cli: &Cli) -> Result<()> {
    let ctx = || AppContext::from_cli(cli);
    match &cli.command {
        Commands::Init(args) => init::run(cli.robot, args),
        Commands::Add(args) => add::run(&ctx()?, args).await,
        Commands::Index(args) => index::run(&ctx()?, args).await,
        Commands::Search(args) => search::run(&ctx()?, args).await,
        Commands::Similar(args) => similar::run(&ctx()?, args).await,
        Commands::Config(args) => config::run(&ctx()?, args),
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data root, default config and database
    Init(init::InitArgs),

    /// Insert a trend, creator or content asset
    Add(add::AddArgs),

    /// Embed records that have no vector yet
    Index(index::IndexArgs),

    /// Search every collection for a free-text query
    Search(search::SearchArgs),

    /// Rank one collection against a free-text query
    Similar(similar::SimilarArgs),

    /// Show the effective configuration
    Config(config::ConfigArgs),
}
