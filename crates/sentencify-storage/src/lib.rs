//! Version record storage for sentencify.
//!
//! This crate provides the durable table behind the version history:
//! - JSON file storage with topic and id indexes (default)
//! - In-memory storage (for testing and embedding)
//!
//! Backends own record identity: ids and timestamps are assigned on insert
//! and are never supplied by callers.

pub mod error;
pub mod json;
pub mod memory;
pub mod record;

pub use error::{StorageError, StorageResult};
pub use json::JsonBackend;
pub use memory::MemoryBackend;
pub use record::{NewVersion, VersionId, VersionRecord};

use async_trait::async_trait;

/// A trait for version record backends.
///
/// Records are grouped by topic key. Every query is scoped to one topic
/// except [`VersionBackend::get`], which looks a record up by id.
#[async_trait]
pub trait VersionBackend: Send + Sync {
    /// Insert a new record, assigning its id and timestamp.
    async fn insert(&self, version: NewVersion) -> StorageResult<VersionRecord>;

    /// Look up a record by id.
    ///
    /// Returns `None` if no such record exists (or it was evicted).
    async fn get(&self, id: VersionId) -> StorageResult<Option<VersionRecord>>;

    /// All records for a topic, oldest first.
    async fn list_topic(&self, topic_key: &str) -> StorageResult<Vec<VersionRecord>>;

    /// The most recent record for a topic.
    async fn latest(&self, topic_key: &str) -> StorageResult<Option<VersionRecord>> {
        Ok(self.list_topic(topic_key).await?.pop())
    }

    /// Number of records stored for a topic.
    async fn count(&self, topic_key: &str) -> StorageResult<usize> {
        Ok(self.list_topic(topic_key).await?.len())
    }

    /// Remove a record. Removing a missing record is not an error.
    async fn delete(&self, id: VersionId) -> StorageResult<()>;

    /// Topic keys that currently have at least one record, sorted.
    async fn topics(&self) -> StorageResult<Vec<String>>;
}
