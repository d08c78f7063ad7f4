//! JSON file-based backend.
//!
//! Each record is stored as its own JSON file, grouped by topic:
//! ```text
//! base_dir/
//!   meta.json                          # id/timestamp allocator
//!   topics/<sha256(topic)>/<id>.json   # records, one per file
//!   ids/<id>.json                      # id -> topic directory
//! ```
//! Topic keys are hashed so any label maps to a safe directory name. Ids are
//! zero-padded in file names.

use crate::record::{now_millis, Sequence};
use crate::{NewVersion, StorageError, StorageResult, VersionBackend, VersionId, VersionRecord};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const META_FILE: &str = "meta.json";
const TOPICS_DIR: &str = "topics";
const IDS_DIR: &str = "ids";

#[derive(Debug, Serialize, Deserialize)]
struct IdIndexEntry {
    topic: String,
}

/// JSON file-based version storage.
///
/// Clones share the allocation lock. Two backends opened separately on the
/// same directory must not insert concurrently.
#[derive(Clone)]
pub struct JsonBackend {
    base_dir: PathBuf,
    sequence_lock: Arc<Mutex<()>>,
}

impl JsonBackend {
    /// Open (or create) a store rooted at `base_dir`.
    pub async fn open(base_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_dir = base_dir.into();

        match fs::metadata(&base_dir).await {
            Ok(meta) if !meta.is_dir() => {
                return Err(StorageError::unavailable(format!(
                    "{} is not a directory",
                    base_dir.display()
                )));
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::Io(e)),
        }

        fs::create_dir_all(base_dir.join(TOPICS_DIR)).await?;
        fs::create_dir_all(base_dir.join(IDS_DIR)).await?;
        debug!(path = %base_dir.display(), "Opened version storage");

        Ok(Self {
            base_dir,
            sequence_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Root directory of this store.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn topic_digest(topic_key: &str) -> String {
        format!("{:x}", Sha256::digest(topic_key.as_bytes()))
    }

    fn topic_dir(&self, digest: &str) -> PathBuf {
        self.base_dir.join(TOPICS_DIR).join(digest)
    }

    fn record_path(&self, digest: &str, id: VersionId) -> PathBuf {
        self.topic_dir(digest)
            .join(format!("{}.json", id.file_stem()))
    }

    fn id_index_path(&self, id: VersionId) -> PathBuf {
        self.base_dir
            .join(IDS_DIR)
            .join(format!("{}.json", id.file_stem()))
    }

    fn meta_path(&self) -> PathBuf {
        self.base_dir.join(META_FILE)
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Write atomically (temp file, then rename).
    async fn write_json<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
        let content = serde_json::to_string_pretty(value)?;
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content).await?;
        fs::rename(&temp_path, path).await?;
        Ok(())
    }

    async fn remove_if_exists(path: &Path) -> StorageResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Search every topic directory for a record whose id index is missing.
    async fn find_unindexed(&self, id: VersionId) -> StorageResult<Option<PathBuf>> {
        let file_name = format!("{}.json", id.file_stem());
        let mut entries = fs::read_dir(self.base_dir.join(TOPICS_DIR)).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let candidate = entry.path().join(&file_name);
            if fs::try_exists(&candidate).await? {
                warn!(id = %id, path = %candidate.display(), "Version file has no id index");
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Record files in a topic directory, in id order.
    async fn record_files(dir: &Path) -> StorageResult<Vec<PathBuf>> {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::Io(e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            // `.json.tmp` leftovers have a `tmp` extension and are skipped
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl VersionBackend for JsonBackend {
    async fn insert(&self, version: NewVersion) -> StorageResult<VersionRecord> {
        let digest = Self::topic_digest(&version.topic_key);
        let _guard = self.sequence_lock.lock().await;

        let mut sequence: Sequence = Self::read_json(&self.meta_path())
            .await?
            .unwrap_or_default();
        let (id, timestamp) = sequence.allocate(now_millis());

        // Persist the allocator first so a crash never hands out an id twice
        Self::write_json(&self.meta_path(), &sequence).await?;

        let record = VersionRecord {
            id,
            topic_key: version.topic_key,
            content: version.content,
            preview: version.preview,
            timestamp,
        };

        // Index before record: a dangling index reads as "no such version",
        // while a record without an index could never be deleted by id
        let index_path = self.id_index_path(id);
        let path = self.record_path(&digest, id);
        Self::write_json(&index_path, &IdIndexEntry { topic: digest.clone() }).await?;

        debug!(path = %path.display(), id = %id, "Writing version");
        let written = match fs::create_dir_all(self.topic_dir(&digest)).await {
            Ok(()) => Self::write_json(&path, &record).await,
            Err(e) => Err(StorageError::Io(e)),
        };
        if let Err(e) = written {
            if let Err(cleanup) = Self::remove_if_exists(&index_path).await {
                warn!(id = %id, error = %cleanup, "Failed to roll back id index");
            }
            return Err(e);
        }

        Ok(record)
    }

    async fn get(&self, id: VersionId) -> StorageResult<Option<VersionRecord>> {
        let Some(entry) = Self::read_json::<IdIndexEntry>(&self.id_index_path(id)).await? else {
            return Ok(None);
        };

        let path = self.record_path(&entry.topic, id);
        debug!(path = %path.display(), id = %id, "Reading version");

        match Self::read_json::<VersionRecord>(&path).await {
            Ok(Some(record)) => Ok(Some(record)),
            Ok(None) => {
                warn!(id = %id, "Id index points at a missing version file");
                Ok(None)
            }
            Err(StorageError::Json(e)) => Err(StorageError::corrupted(format!(
                "{}: {}",
                path.display(),
                e
            ))),
            Err(e) => Err(e),
        }
    }

    async fn list_topic(&self, topic_key: &str) -> StorageResult<Vec<VersionRecord>> {
        let dir = self.topic_dir(&Self::topic_digest(topic_key));
        debug!(path = %dir.display(), topic = %topic_key, "Listing versions");

        let mut records = Vec::new();
        for path in Self::record_files(&dir).await? {
            match Self::read_json::<VersionRecord>(&path).await {
                Ok(Some(record)) if record.topic_key == topic_key => records.push(record),
                Ok(Some(_)) => {
                    warn!(path = %path.display(), "Version file filed under the wrong topic");
                }
                // Evicted between listing and reading
                Ok(None) => {}
                Err(StorageError::Json(e)) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable version file");
                }
                Err(e) => return Err(e),
            }
        }

        records.sort_by_key(VersionRecord::order_key);
        Ok(records)
    }

    async fn delete(&self, id: VersionId) -> StorageResult<()> {
        let index_path = self.id_index_path(id);
        let record_path = match Self::read_json::<IdIndexEntry>(&index_path).await? {
            Some(entry) => Some(self.record_path(&entry.topic, id)),
            None => self.find_unindexed(id).await?,
        };
        let Some(record_path) = record_path else {
            return Ok(());
        };

        // Index first, so lookups by id never see a half-deleted record
        Self::remove_if_exists(&index_path).await?;
        Self::remove_if_exists(&record_path).await?;

        debug!(id = %id, "Deleted version");
        Ok(())
    }

    async fn topics(&self) -> StorageResult<Vec<String>> {
        let mut entries = fs::read_dir(self.base_dir.join(TOPICS_DIR)).await?;
        let mut topics = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }

            // Every record carries its topic key; the first readable one names the topic
            for path in Self::record_files(&entry.path()).await? {
                match Self::read_json::<VersionRecord>(&path).await {
                    Ok(Some(record)) => {
                        topics.push(record.topic_key);
                        break;
                    }
                    Ok(None) => {}
                    Err(e) => warn!(path = %path.display(), error = %e, "Skipping version file"),
                }
            }
        }

        topics.sort();
        Ok(topics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn version(topic: &str, content: &str) -> NewVersion {
        NewVersion::new(topic, content, content)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let dir = tempdir().unwrap();
        let backend = JsonBackend::open(dir.path()).await.unwrap();

        let record = backend
            .insert(version("fundamentação", "<p>Texto</p>"))
            .await
            .unwrap();
        assert_eq!(record.id, VersionId(1));

        let read = backend.get(record.id).await.unwrap();
        assert_eq!(read, Some(record));
    }

    #[tokio::test]
    async fn test_get_unknown_id() {
        let dir = tempdir().unwrap();
        let backend = JsonBackend::open(dir.path()).await.unwrap();

        assert!(backend.get(VersionId(99999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_topic_keys_with_separators_are_safe() {
        let dir = tempdir().unwrap();
        let backend = JsonBackend::open(dir.path()).await.unwrap();

        backend.insert(version("../etc/passwd", "a")).await.unwrap();
        backend.insert(version("a/b\\c", "b")).await.unwrap();

        assert_eq!(backend.list_topic("../etc/passwd").await.unwrap().len(), 1);
        assert_eq!(backend.list_topic("a/b\\c").await.unwrap().len(), 1);
        assert!(!dir.path().join("etc").exists());
    }

    #[tokio::test]
    async fn test_list_topic_ordered_oldest_first() {
        let dir = tempdir().unwrap();
        let backend = JsonBackend::open(dir.path()).await.unwrap();

        for content in ["um", "dois", "três"] {
            backend.insert(version("merito", content)).await.unwrap();
        }
        backend.insert(version("outro", "x")).await.unwrap();

        let contents: Vec<String> = backend
            .list_topic("merito")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.content)
            .collect();
        assert_eq!(contents, vec!["um", "dois", "três"]);
        assert_eq!(backend.latest("merito").await.unwrap().unwrap().content, "três");
        assert_eq!(backend.count("outro").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_index() {
        let dir = tempdir().unwrap();
        let backend = JsonBackend::open(dir.path()).await.unwrap();

        let record = backend.insert(version("merito", "a")).await.unwrap();
        backend.delete(record.id).await.unwrap();

        assert!(backend.get(record.id).await.unwrap().is_none());
        assert!(backend.list_topic("merito").await.unwrap().is_empty());
        assert!(backend.topics().await.unwrap().is_empty());

        backend.delete(record.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_reopen_keeps_records_and_sequence() {
        let dir = tempdir().unwrap();

        {
            let backend = JsonBackend::open(dir.path()).await.unwrap();
            backend.insert(version("merito", "a")).await.unwrap();
            backend.insert(version("merito", "b")).await.unwrap();
        }

        let backend = JsonBackend::open(dir.path()).await.unwrap();
        assert_eq!(backend.count("merito").await.unwrap(), 2);

        let next = backend.insert(version("merito", "c")).await.unwrap();
        assert_eq!(next.id, VersionId(3));
    }

    #[tokio::test]
    async fn test_unreadable_record_is_skipped_in_listing() {
        let dir = tempdir().unwrap();
        let backend = JsonBackend::open(dir.path()).await.unwrap();

        let good = backend.insert(version("merito", "a")).await.unwrap();
        let bad = backend.insert(version("merito", "b")).await.unwrap();

        let digest = JsonBackend::topic_digest("merito");
        fs::write(backend.record_path(&digest, bad.id), "{ not json")
            .await
            .unwrap();

        let records = backend.list_topic("merito").await.unwrap();
        assert_eq!(records, vec![good]);

        let err = backend.get(bad.id).await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupted(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_record_without_id_index() {
        let dir = tempdir().unwrap();
        let backend = JsonBackend::open(dir.path()).await.unwrap();

        let stray = backend.insert(version("merito", "a")).await.unwrap();
        backend.insert(version("merito", "b")).await.unwrap();
        fs::remove_file(backend.id_index_path(stray.id)).await.unwrap();

        backend.delete(stray.id).await.unwrap();

        let contents: Vec<String> = backend
            .list_topic("merito")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.content)
            .collect();
        assert_eq!(contents, vec!["b"]);
    }

    #[tokio::test]
    async fn test_failed_record_write_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let backend = JsonBackend::open(dir.path()).await.unwrap();

        // A plain file where the topic directory should go makes the record write fail
        let digest = JsonBackend::topic_digest("merito");
        fs::write(backend.topic_dir(&digest), "x").await.unwrap();

        assert!(backend.insert(version("merito", "a")).await.is_err());
        assert!(backend.get(VersionId(1)).await.unwrap().is_none());
        assert!(!backend.id_index_path(VersionId(1)).exists());
    }

    #[tokio::test]
    async fn test_topics_lists_original_keys() {
        let dir = tempdir().unwrap();
        let backend = JsonBackend::open(dir.path()).await.unwrap();

        backend.insert(version("RELATÓRIO", "a")).await.unwrap();
        backend.insert(version("DISPOSITIVO", "b")).await.unwrap();
        backend.insert(version("DISPOSITIVO", "c")).await.unwrap();

        assert_eq!(
            backend.topics().await.unwrap(),
            vec!["DISPOSITIVO".to_string(), "RELATÓRIO".to_string()]
        );
    }

    #[tokio::test]
    async fn test_open_on_file_is_unavailable() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        fs::write(&file, "x").await.unwrap();

        let result = JsonBackend::open(&file).await;
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
    }
}
