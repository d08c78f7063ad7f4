//! Version store implementation.

use crate::locks::TopicLocks;
use crate::preview::derive_preview;
use crate::{diff, HistoryConfig, HistoryResult};
use sentencify_storage::{
    JsonBackend, MemoryBackend, NewVersion, VersionBackend, VersionId, VersionRecord,
};
use std::cmp::Reverse;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

/// Bounded, per-topic history of editor content.
///
/// `save_version`, `get_versions` and `restore_version` never fail: storage
/// errors are logged and the call degrades to a no-op, an empty list or
/// `None`. The `try_*` variants return the error instead.
pub struct VersionStore {
    backend: Arc<dyn VersionBackend>,
    config: HistoryConfig,
    locks: TopicLocks,
}

impl VersionStore {
    /// Create a store over an existing backend.
    pub fn new(backend: Arc<dyn VersionBackend>, config: HistoryConfig) -> Self {
        Self {
            backend,
            config,
            locks: TopicLocks::new(),
        }
    }

    /// Create a non-persistent store with the default configuration.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()), HistoryConfig::default())
    }

    /// Open a durable store in `dir`, creating it if needed.
    pub async fn open(dir: impl Into<PathBuf>, config: HistoryConfig) -> HistoryResult<Self> {
        let backend = JsonBackend::open(dir).await?;
        Ok(Self::new(Arc::new(backend), config))
    }

    /// The active configuration.
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Record `content` as the newest version of `topic_key`.
    ///
    /// Empty keys or content, and content identical to the latest version,
    /// are ignored.
    pub async fn save_version(&self, topic_key: &str, content: &str) {
        if let Err(e) = self.try_save_version(topic_key, content).await {
            warn!(topic = %topic_key, error = %e, "Failed to save version");
        }
    }

    /// Like [`save_version`](Self::save_version), but reports storage errors.
    ///
    /// Returns the new record, or `None` when nothing was stored.
    pub async fn try_save_version(
        &self,
        topic_key: &str,
        content: &str,
    ) -> HistoryResult<Option<VersionRecord>> {
        if topic_key.is_empty() || content.is_empty() {
            return Ok(None);
        }

        let _guard = self.lock_topic(topic_key).await?;
        self.save_locked(topic_key, content).await
    }

    /// All versions of `topic_key`, newest first.
    pub async fn get_versions(&self, topic_key: &str) -> Vec<VersionRecord> {
        match self.try_get_versions(topic_key).await {
            Ok(versions) => versions,
            Err(e) => {
                warn!(topic = %topic_key, error = %e, "Failed to load versions");
                Vec::new()
            }
        }
    }

    /// Like [`get_versions`](Self::get_versions), but reports storage errors.
    pub async fn try_get_versions(&self, topic_key: &str) -> HistoryResult<Vec<VersionRecord>> {
        if topic_key.is_empty() {
            return Ok(Vec::new());
        }

        let mut versions = self.backend.list_topic(topic_key).await?;
        versions.sort_by_key(|record| Reverse(record.order_key()));
        Ok(versions)
    }

    /// Fetch the content of version `version_id`, first saving
    /// `current_content` as a version of `topic_key`.
    ///
    /// Returns `None` if the version does not exist. The caller applies the
    /// returned content to the editor.
    pub async fn restore_version(
        &self,
        version_id: VersionId,
        current_content: &str,
        topic_key: &str,
    ) -> Option<String> {
        let record = match self.backend.get(version_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(id = %version_id, "Nothing to restore");
                return None;
            }
            Err(e) => {
                warn!(id = %version_id, error = %e, "Failed to load version for restore");
                return None;
            }
        };

        if let Err(e) = self.try_save_version(topic_key, current_content).await {
            warn!(
                topic = %topic_key,
                error = %e,
                "Failed to save current content before restore"
            );
        }

        self.log_restore(&record, topic_key);
        Some(record.content)
    }

    /// Like [`restore_version`](Self::restore_version), but reports storage
    /// errors, including a failure to save the current content.
    pub async fn try_restore_version(
        &self,
        version_id: VersionId,
        current_content: &str,
        topic_key: &str,
    ) -> HistoryResult<Option<String>> {
        let Some(record) = self.backend.get(version_id).await? else {
            return Ok(None);
        };

        self.try_save_version(topic_key, current_content).await?;

        self.log_restore(&record, topic_key);
        Ok(Some(record.content))
    }

    /// Look up a single version.
    pub async fn get_version(&self, version_id: VersionId) -> Option<VersionRecord> {
        match self.backend.get(version_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!(id = %version_id, error = %e, "Failed to load version");
                None
            }
        }
    }

    /// Topics that have at least one version.
    pub async fn topics(&self) -> Vec<String> {
        match self.backend.topics().await {
            Ok(topics) => topics,
            Err(e) => {
                warn!(error = %e, "Failed to list topics");
                Vec::new()
            }
        }
    }

    /// Unified diff from version `version_id` to `current_content`.
    pub async fn diff(&self, version_id: VersionId, current_content: &str) -> Option<String> {
        let record = self.get_version(version_id).await?;
        Some(diff::unified(&record, current_content))
    }

    async fn lock_topic(&self, topic_key: &str) -> HistoryResult<Option<OwnedMutexGuard<()>>> {
        if !self.config.serialize_writes {
            return Ok(None);
        }
        self.locks.acquire(topic_key).await.map(Some)
    }

    async fn save_locked(
        &self,
        topic_key: &str,
        content: &str,
    ) -> HistoryResult<Option<VersionRecord>> {
        if let Some(latest) = self.backend.latest(topic_key).await? {
            if latest.content == content {
                debug!(topic = %topic_key, id = %latest.id, "Content unchanged, skipping version");
                return Ok(None);
            }
        }

        let preview = derive_preview(content, self.config.preview_length);
        let record = self
            .backend
            .insert(NewVersion::new(topic_key, content, preview))
            .await?;
        info!(topic = %topic_key, id = %record.id, "Saved version");

        // The version is stored; a failed eviction is retried on the next save
        if let Err(e) = self.enforce_cap(topic_key).await {
            warn!(topic = %topic_key, error = %e, "Failed to trim version history");
        }
        Ok(Some(record))
    }

    /// Evict the oldest versions of `topic_key` beyond the cap.
    async fn enforce_cap(&self, topic_key: &str) -> HistoryResult<usize> {
        let cap = self.config.cap();
        if self.backend.count(topic_key).await? <= cap {
            return Ok(0);
        }

        let mut versions = self.backend.list_topic(topic_key).await?;
        versions.sort_by_key(VersionRecord::order_key);

        let excess = versions.len().saturating_sub(cap);
        for record in versions.iter().take(excess) {
            self.backend.delete(record.id).await?;
            debug!(topic = %topic_key, id = %record.id, "Evicted version");
        }

        if excess > 0 {
            info!(topic = %topic_key, evicted = excess, "Trimmed version history");
        }
        Ok(excess)
    }

    fn log_restore(&self, record: &VersionRecord, topic_key: &str) {
        if record.topic_key != topic_key {
            debug!(
                id = %record.id,
                from = %record.topic_key,
                into = %topic_key,
                "Restoring a version from another topic"
            );
        }
        info!(topic = %topic_key, id = %record.id, "Restored version");
    }
}
