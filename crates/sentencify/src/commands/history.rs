//! Version history command handlers.
//!
//! Handles saving, listing, showing, restoring and diffing topic versions.

use anyhow::{bail, Context};
use clap::Subcommand;
use sentencify_history::{preview, VersionId, VersionStore};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// Column width of the preview in `list` output.
const LIST_PREVIEW_WIDTH: usize = 60;

/// History subcommands.
#[derive(Subcommand)]
pub enum HistoryCommands {
    /// Save content as the newest version of a topic
    Save {
        /// Topic key
        topic: String,
        /// Read content from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// List versions of a topic, newest first
    List {
        /// Topic key
        topic: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the content of a version
    Show {
        /// Version ID
        id: VersionId,
    },
    /// Restore a version, saving the current content first
    Restore {
        /// Version ID
        id: VersionId,
        /// Topic the current content belongs to
        #[arg(short, long)]
        topic: String,
        /// File holding the current content
        #[arg(short, long)]
        current_file: Option<PathBuf>,
    },
    /// Diff a version against the current content
    Diff {
        /// Version ID
        id: VersionId,
        /// File holding the current content
        #[arg(short, long)]
        current_file: Option<PathBuf>,
    },
    /// List topics that have history
    Topics,
}

/// Handle history commands, writing command output to `out`.
pub async fn handle_history<W: Write>(
    command: HistoryCommands,
    store: &VersionStore,
    cwd: &Path,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        HistoryCommands::Save { topic, file } => {
            let content = match file {
                Some(file) => read_file(cwd, &file).await?,
                None => read_stdin().await?,
            };

            match store.try_save_version(&topic, &content).await? {
                Some(record) => writeln!(out, "Saved version {} of {}", record.id, topic)?,
                None => writeln!(out, "Nothing saved (empty or unchanged content)")?,
            }
        }
        HistoryCommands::List { topic, json } => {
            let versions = store.try_get_versions(&topic).await?;

            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&versions)?)?;
            } else if versions.is_empty() {
                writeln!(out, "No versions found for {topic}.")?;
            } else {
                writeln!(out, "{:<8} {:<20} {}", "ID", "SAVED", "PREVIEW")?;
                writeln!(out, "{}", "-".repeat(90))?;

                for version in versions {
                    let saved = version
                        .created_at()
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_default();
                    let flat = version.preview.replace(['\n', '\r'], " ");
                    let shown = preview::truncate_chars(&flat, LIST_PREVIEW_WIDTH);
                    let ellipsis = if shown.len() < flat.len() { "..." } else { "" };
                    writeln!(out, "{:<8} {:<20} {}{}", version.id, saved, shown, ellipsis)?;
                }
            }
        }
        HistoryCommands::Show { id } => match store.get_version(id).await {
            Some(version) => write!(out, "{}", version.content)?,
            None => bail!("Version not found: {id}"),
        },
        HistoryCommands::Restore {
            id,
            topic,
            current_file,
        } => {
            let current = match current_file {
                Some(file) => read_file(cwd, &file).await?,
                None => String::new(),
            };

            match store.try_restore_version(id, &current, &topic).await? {
                Some(content) => write!(out, "{content}")?,
                None => bail!("Version not found: {id}"),
            }
        }
        HistoryCommands::Diff { id, current_file } => {
            let current = match current_file {
                Some(file) => read_file(cwd, &file).await?,
                None => String::new(),
            };

            match store.diff(id, &current).await {
                Some(diff) => write!(out, "{diff}")?,
                None => bail!("Version not found: {id}"),
            }
        }
        HistoryCommands::Topics => {
            let topics = store.topics().await;
            if topics.is_empty() {
                writeln!(out, "No topics with history.")?;
            }
            for topic in topics {
                writeln!(out, "{topic}")?;
            }
        }
    }

    Ok(())
}

async fn read_file(cwd: &Path, file: &Path) -> anyhow::Result<String> {
    let path = sentencify_util::path::resolve(cwd, file);
    tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn read_stdin() -> anyhow::Result<String> {
    let mut content = String::new();
    tokio::io::stdin()
        .read_to_string(&mut content)
        .await
        .context("Failed to read content from stdin")?;
    Ok(content)
}
