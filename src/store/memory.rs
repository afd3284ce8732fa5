use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use super::{entities::StudyRecord, RemoteStore, StoreError};

/// Process-local realization of [RemoteStore]. Follows the same contract as the remote table,
/// which makes it useful for driving the application without a network.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<StudyRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = StudyRecord>) -> Self {
        Self {
            rows: Mutex::new(records.into_iter().collect()),
        }
    }

    /// Snapshot of the stored rows in insertion order.
    pub fn records(&self) -> Result<Vec<StudyRecord>, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<StudyRecord>>, StoreError> {
        self.rows
            .lock()
            .map_err(|e| StoreError::Rejected(format!("memory store is poisoned: {e}")))
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<StudyRecord>, StoreError> {
        self.records()
    }

    async fn insert(&self, record: StudyRecord) -> Result<(), StoreError> {
        self.lock()?.push(record);
        Ok(())
    }

    async fn delete_matching(&self, target: StudyRecord) -> Result<(), StoreError> {
        let mut rows = self.lock()?;
        let before = rows.len();
        rows.retain(|v| !v.matches(&target.title, target.time));
        debug!("Deleted {} rows matching {:?}", before - rows.len(), target);
        Ok(())
    }
}
