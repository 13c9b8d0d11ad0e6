//! In-memory mirror store.
//!
//! The engine only needs ids/delete/upsert, so the store trait is the seam
//! where a relational backend would plug in. This implementation keeps the
//! mirror in a [`DashMap`], which is all the read paths of the services
//! need.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::engine::MirrorStore;
use crate::error::SyncError;
use crate::records::MirrorRecord;

/// Concurrent in-memory mirror of one collection, keyed by record id.
pub struct MemoryMirror<R> {
    records: DashMap<i64, R>,
}

impl<R: MirrorRecord> MemoryMirror<R> {
    /// Creates an empty mirror.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Looks up one record by id.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<R> {
        self.records.get(&id).map(|entry| entry.clone())
    }

    /// All mirrored records, in no particular order.
    #[must_use]
    pub fn all(&self) -> Vec<R> {
        self.records.iter().map(|entry| entry.clone()).collect()
    }

    /// Number of mirrored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` if the mirror holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Synchronous upsert, for seeding in tests and startup paths.
    pub fn upsert_sync(&self, record: R) {
        self.records.insert(record.id(), record);
    }
}

impl<R: MirrorRecord> Default for MemoryMirror<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: MirrorRecord> MirrorStore<R> for MemoryMirror<R> {
    async fn ids(&self) -> Result<Vec<i64>, SyncError> {
        Ok(self.records.iter().map(|entry| *entry.key()).collect())
    }

    async fn delete(&self, id: i64) -> Result<(), SyncError> {
        self.records.remove(&id);
        Ok(())
    }

    async fn upsert(&self, record: R) -> Result<(), SyncError> {
        self.records.insert(record.id(), record);
        Ok(())
    }
}
