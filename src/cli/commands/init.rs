//! trendlens init - Create the data root, default config and database

use std::path::{Path, PathBuf};

use clap::Args;
use colored::Colorize;
use serde::Serialize;

use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::config::Config;
use crate::error::{Result, TrendError};
use crate::storage::SqliteStore;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Initialize globally (platform data dir) instead of locally (.trendlens/)
    #[arg(long)]
    pub global: bool,

    /// Overwrite an existing config file with defaults
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct InitReport {
    root: PathBuf,
    config_path: PathBuf,
    config_written: bool,
    database: PathBuf,
    schema_version: u32,
}

/// Re-running init on an initialized root only re-opens the store.
pub fn run(robot: bool, args: &InitArgs) -> Result<()> {
    let root = if let Ok(root) = std::env::var("TRENDLENS_ROOT") {
        PathBuf::from(root)
    } else if args.global {
        dirs::data_dir()
            .ok_or_else(|| TrendError::MissingConfig("data directory not found".to_string()))?
            .join("trendlens")
    } else {
        std::env::current_dir()?.join(".trendlens")
    };

    let report = initialize(&root, args.force)?;
    print_report(robot, &report)
}

fn initialize(root: &Path, force: bool) -> Result<InitReport> {
    std::fs::create_dir_all(root)?;

    let config_path = root.join("config.toml");
    let config_written = force || !config_path.exists();
    if config_written {
        let defaults = toml::to_string_pretty(&Config::default())
            .map_err(|err| TrendError::Serialization(format!("serialize config: {err}")))?;
        std::fs::write(&config_path, defaults)?;
    }

    let config = Config::load(Some(&config_path), root)?;
    let database = config.storage.database_path(root);
    let store = SqliteStore::open(&database)?;

    Ok(InitReport {
        root: root.to_path_buf(),
        config_path,
        config_written,
        database,
        schema_version: store.schema_version(),
    })
}

fn print_report(robot: bool, report: &InitReport) -> Result<()> {
    if robot {
        return emit_json(&robot_ok(report));
    }

    let mut layout = HumanLayout::new();
    layout
        .title("Initialized trendlens")
        .kv("Root", &report.root.display().to_string())
        .kv(
            "Config",
            &format!(
                "{} ({})",
                report.config_path.display(),
                if report.config_written { "written" } else { "kept" }
            ),
        )
        .kv("Database", &report.database.display().to_string())
        .kv("Schema version", &report.schema_version.to_string())
        .blank()
        .push_line(format!(
            "Set {} or [embedding].api_key to enable semantic search.",
            "OPENAI_API_KEY".bold()
        ));
    emit_human(layout);
    Ok(())
}
