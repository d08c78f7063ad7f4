//! In-memory backend.

use crate::record::{now_millis, Sequence};
use crate::{NewVersion, StorageError, StorageResult, VersionBackend, VersionId, VersionRecord};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

#[derive(Default)]
struct Tables {
    records: HashMap<VersionId, VersionRecord>,
    /// topic key -> (timestamp, id), oldest first
    by_topic: HashMap<String, BTreeSet<(i64, VersionId)>>,
    sequence: Sequence,
}

/// In-memory version storage.
///
/// Keeps the same indexes as the on-disk backend but is not persistent.
pub struct MemoryBackend {
    tables: RwLock<Tables>,
}

impl MemoryBackend {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    fn read_tables(&self) -> StorageResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))
    }

    fn write_tables(&self) -> StorageResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VersionBackend for MemoryBackend {
    async fn insert(&self, version: NewVersion) -> StorageResult<VersionRecord> {
        let mut tables = self.write_tables()?;
        let (id, timestamp) = tables.sequence.allocate(now_millis());

        let record = VersionRecord {
            id,
            topic_key: version.topic_key,
            content: version.content,
            preview: version.preview,
            timestamp,
        };

        tables
            .by_topic
            .entry(record.topic_key.clone())
            .or_default()
            .insert(record.order_key());
        tables.records.insert(id, record.clone());

        debug!(topic = %record.topic_key, id = %id, "Inserted version in memory");
        Ok(record)
    }

    async fn get(&self, id: VersionId) -> StorageResult<Option<VersionRecord>> {
        let tables = self.read_tables()?;
        Ok(tables.records.get(&id).cloned())
    }

    async fn list_topic(&self, topic_key: &str) -> StorageResult<Vec<VersionRecord>> {
        let tables = self.read_tables()?;
        let records = tables
            .by_topic
            .get(topic_key)
            .map(|index| {
                index
                    .iter()
                    .filter_map(|(_, id)| tables.records.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(records)
    }

    async fn latest(&self, topic_key: &str) -> StorageResult<Option<VersionRecord>> {
        let tables = self.read_tables()?;
        Ok(tables
            .by_topic
            .get(topic_key)
            .and_then(|index| index.iter().next_back())
            .and_then(|(_, id)| tables.records.get(id).cloned()))
    }

    async fn count(&self, topic_key: &str) -> StorageResult<usize> {
        let tables = self.read_tables()?;
        Ok(tables.by_topic.get(topic_key).map_or(0, BTreeSet::len))
    }

    async fn delete(&self, id: VersionId) -> StorageResult<()> {
        let mut tables = self.write_tables()?;
        let Some(record) = tables.records.remove(&id) else {
            return Ok(());
        };

        if let Some(index) = tables.by_topic.get_mut(&record.topic_key) {
            index.remove(&record.order_key());
            if index.is_empty() {
                tables.by_topic.remove(&record.topic_key);
            }
        }

        debug!(topic = %record.topic_key, id = %id, "Deleted version from memory");
        Ok(())
    }

    async fn topics(&self) -> StorageResult<Vec<String>> {
        let tables = self.read_tables()?;
        let mut topics: Vec<String> = tables.by_topic.keys().cloned().collect();
        topics.sort();
        Ok(topics)
    }
}
