//! Sentencify - field version history tool.
//!
//! This is the main entry point for the sentencify CLI.

mod commands;
mod config;

use anyhow::Context;
use clap::Parser;
use commands::{handle_history, init_logging, HistoryCommands};
use config::Config;
use sentencify_history::VersionStore;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "sentencify")]
#[command(author, version, about = "Inspect and manage Sentencify field version history", long_about = None)]
struct Cli {
    /// Directory of the version history (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: HistoryCommands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    let (config, sources) = Config::load(Some(cwd.as_path())).await?;
    init_logging(cli.verbose, config.log_level);
    for source in &sources {
        debug!(path = %source.display(), "Loaded config");
    }

    let data_dir = match cli.data_dir {
        Some(dir) => sentencify_util::path::resolve(&cwd, &dir),
        None => config
            .history_dir()
            .map(|dir| sentencify_util::path::resolve(&cwd, &dir))
            .context("Could not determine the history directory; pass --data-dir")?,
    };
    debug!(path = %data_dir.display(), "Opening version history");

    let store = VersionStore::open(&data_dir, config.history_config())
        .await
        .with_context(|| format!("Failed to open history at {}", data_dir.display()))?;

    let mut stdout = std::io::stdout().lock();
    handle_history(cli.command, &store, &cwd, &mut stdout).await
}
