//! Per-topic write serialization.

use crate::{HistoryError, HistoryResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Lazily creates one async lock per topic key.
///
/// Saves on the same topic queue behind each other; different topics never
/// contend.
#[derive(Default)]
pub(crate) struct TopicLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl TopicLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `topic_key`.
    pub async fn acquire(&self, topic_key: &str) -> HistoryResult<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|e| HistoryError::LockPoisoned(e.to_string()))?;

            // Holders and waiters keep a clone; entries with no other owner are idle
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);

            locks
                .entry(topic_key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        Ok(lock.lock_owned().await)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }
}
