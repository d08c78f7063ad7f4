//! Layered configuration for the sentencify CLI.
//!
//! Sources, later ones winning field by field:
//! 1. `<config_dir>/sentencify/sentencify.json[c]`
//! 2. `SENTENCIFY_CONFIG_CONTENT` (raw JSONC)
//! 3. `sentencify.jsonc` / `sentencify.json` in the project directory

use anyhow::Context;
use sentencify_history::HistoryConfig;
use sentencify_util::{jsonc, path, LogLevel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_CONFIG_CONTENT: &str = "SENTENCIFY_CONFIG_CONTENT";
const CONFIG_FILE_NAMES: [&str; 2] = ["sentencify.jsonc", "sentencify.json"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Version history directory. Relative paths resolve against the file
    /// that set them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<HistoryConfig>,
}

impl Config {
    /// Load and merge every config source. Returns the files that were read.
    pub async fn load(project_dir: Option<&Path>) -> anyhow::Result<(Self, Vec<PathBuf>)> {
        let env_content = std::env::var(ENV_CONFIG_CONTENT).ok();
        Self::load_from(
            path::config_dir().as_deref(),
            env_content.as_deref(),
            project_dir,
        )
        .await
    }

    async fn load_from(
        global_dir: Option<&Path>,
        env_content: Option<&str>,
        project_dir: Option<&Path>,
    ) -> anyhow::Result<(Self, Vec<PathBuf>)> {
        let mut config = Config::default();
        let mut sources = Vec::new();

        if let Some(dir) = global_dir {
            if let Some(path) = Self::find_file(dir) {
                config = config.merge(Self::load_file(&path).await?);
                sources.push(path);
            }
        }

        if let Some(content) = env_content {
            config = config.merge(Self::parse_jsonc(content, "<env>")?);
        }

        if let Some(dir) = project_dir {
            if let Some(path) = Self::find_file(dir) {
                config = config.merge(Self::load_file(&path).await?);
                sources.push(path);
            }
        }

        Ok((config, sources))
    }

    fn find_file(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Load a single config file.
    pub async fn load_file(file: &Path) -> anyhow::Result<Self> {
        let content = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let mut config = Self::parse_jsonc(&content, &file.display().to_string())?;

        if let Some(dir) = config.data_dir.take() {
            config.data_dir = Some(match file.parent() {
                Some(base) => path::resolve(base, &dir),
                None => dir,
            });
        }
        Ok(config)
    }

    fn parse_jsonc(content: &str, source: &str) -> anyhow::Result<Self> {
        serde_json::from_str(&jsonc::strip_comments(content))
            .with_context(|| format!("Invalid config in {source}"))
    }

    /// Overlay `other` onto `self`.
    pub fn merge(mut self, other: Self) -> Self {
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        if other.history.is_some() {
            self.history = other.history;
        }
        self
    }

    /// Directory of the version store.
    pub fn history_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(path::history_dir)
    }

    pub fn history_config(&self) -> HistoryConfig {
        self.history.clone().unwrap_or_default()
    }
}
