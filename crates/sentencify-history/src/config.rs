//! Version history configuration.

use serde::{Deserialize, Serialize};

/// Default number of versions retained per topic.
pub const DEFAULT_MAX_VERSIONS: usize = 10;

/// Default preview length, in characters.
pub const DEFAULT_PREVIEW_LENGTH: usize = 100;

/// Configuration for a [`VersionStore`](crate::VersionStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryConfig {
    /// Maximum number of versions kept per topic.
    pub max_versions: usize,

    /// Maximum preview length in characters.
    pub preview_length: usize,

    /// Serialize saves and restores per topic.
    pub serialize_writes: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_versions: DEFAULT_MAX_VERSIONS,
            preview_length: DEFAULT_PREVIEW_LENGTH,
            serialize_writes: true,
        }
    }
}

impl HistoryConfig {
    /// Effective per-topic cap. Never below one, so the newest save survives.
    pub fn cap(&self) -> usize {
        self.max_versions.max(1)
    }
}
