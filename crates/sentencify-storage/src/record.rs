//! Version record data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store-assigned identifier of a version record.
///
/// Ids are allocated from a per-store counter starting at 1 and are never
/// reused, even after the record they named has been evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(pub u64);

impl VersionId {
    /// Get the raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }

    /// Zero-padded form used in file names so they sort by id.
    pub fn file_stem(self) -> String {
        format!("{:020}", self.0)
    }
}

impl From<u64> for VersionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for VersionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A version about to be inserted. The backend assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVersion {
    pub topic_key: String,
    pub content: String,
    pub preview: String,
}

impl NewVersion {
    pub fn new(
        topic_key: impl Into<String>,
        content: impl Into<String>,
        preview: impl Into<String>,
    ) -> Self {
        Self {
            topic_key: topic_key.into(),
            content: content.into(),
            preview: preview.into(),
        }
    }
}

/// One immutable snapshot of a topic's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    /// Unique identifier, assigned on insert.
    pub id: VersionId,

    /// Topic (editor field) this snapshot belongs to.
    pub topic_key: String,

    /// Full captured payload, usually HTML.
    pub content: String,

    /// Plain-text excerpt of `content`.
    pub preview: String,

    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl VersionRecord {
    /// Creation time as a UTC datetime.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Key that orders records oldest first.
    pub fn order_key(&self) -> (i64, VersionId) {
        (self.timestamp, self.id)
    }
}

/// Id and timestamp allocator persisted alongside the records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Sequence {
    pub next_id: u64,
    pub last_timestamp: i64,
}

impl Sequence {
    /// Allocate the next id and a timestamp strictly after the previous one.
    pub fn allocate(&mut self, now: i64) -> (VersionId, i64) {
        let id = VersionId(self.next_id.max(1));
        self.next_id = id.0 + 1;

        let timestamp = if now > self.last_timestamp {
            now
        } else {
            self.last_timestamp + 1
        };
        self.last_timestamp = timestamp;

        (id, timestamp)
    }
}

/// Current wall clock in milliseconds.
pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_starts_at_one() {
        let mut sequence = Sequence::default();
        let (id, _) = sequence.allocate(1_000);
        assert_eq!(id, VersionId(1));
        assert_eq!(sequence.next_id, 2);
    }

    #[test]
    fn test_sequence_timestamps_strictly_increase() {
        let mut sequence = Sequence::default();
        let (_, t1) = sequence.allocate(5_000);
        let (_, t2) = sequence.allocate(5_000);
        let (_, t3) = sequence.allocate(4_000);
        let (_, t4) = sequence.allocate(9_000);
        assert_eq!((t1, t2, t3, t4), (5_000, 5_001, 5_002, 9_000));
    }

    #[test]
    fn test_version_id_parse_and_display() {
        let id: VersionId = " 42 ".parse().unwrap();
        assert_eq!(id, VersionId(42));
        assert_eq!(id.to_string(), "42");
        assert_eq!(id.file_stem(), "00000000000000000042");
        assert!("abc".parse::<VersionId>().is_err());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = VersionRecord {
            id: VersionId(3),
            topic_key: "RELATÓRIO".to_string(),
            content: "<p>Texto</p>".to_string(),
            preview: "Texto".to_string(),
            timestamp: 1_700_000_000_000,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["topicKey"], "RELATÓRIO");
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);

        let back: VersionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_created_at() {
        let record = VersionRecord {
            id: VersionId(1),
            topic_key: "t".to_string(),
            content: "c".to_string(),
            preview: "c".to_string(),
            timestamp: 0,
        };
        assert_eq!(record.created_at().unwrap().timestamp(), 0);
    }
}
