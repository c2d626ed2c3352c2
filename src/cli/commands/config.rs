//! trendlens config - Show the effective configuration

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::error::{Result, TrendError};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Only print the config file path
    #[arg(long)]
    pub path: bool,
}

pub fn run(ctx: &AppContext, args: &ConfigArgs) -> Result<()> {
    let redacted = ctx.config.redacted();

    if ctx.robot_mode {
        return emit_json(&robot_ok(serde_json::json!({
            "root": ctx.root,
            "config_path": ctx.config_path,
            "config": redacted,
        })));
    }

    if args.path {
        println!("{}", ctx.config_path.display());
        return Ok(());
    }

    let rendered = toml::to_string_pretty(&redacted)
        .map_err(|err| TrendError::Serialization(format!("serialize config: {err}")))?;
    println!("{} {}", "# root:".dimmed(), ctx.root.display());
    println!("{} {}", "# file:".dimmed(), ctx.config_path.display());
    println!();
    print!("{rendered}");
    Ok(())
}
