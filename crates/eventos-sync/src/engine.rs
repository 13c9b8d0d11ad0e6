//! Full-replace reconciliation engine.
//!
//! One engine instance reconciles one collection: fetch everything from the
//! remote, delete local rows the remote no longer has, then upsert every
//! remote record. The pass is idempotent — running it twice against an
//! unchanged remote deletes nothing the second time and leaves the mirror
//! byte-for-byte identical.
//!
//! An empty remote answer is ambiguous: a genuinely empty catalog looks
//! exactly like a half-broken one. By default the engine refuses to act on
//! it and reports a skipped pass; `allow_empty_remote` opts into treating
//! empty as authoritative (wiping the mirror).

use std::sync::Arc;

use async_trait::async_trait;

use crate::diff::orphaned_ids;
use crate::error::SyncError;
use crate::records::MirrorRecord;

/// Source of the authoritative collection.
#[async_trait]
pub trait RemoteSource<R>: Send + Sync {
    /// Fetches the complete remote collection.
    async fn fetch_all(&self) -> Result<Vec<R>, SyncError>;
}

/// Local mirror of one collection.
#[async_trait]
pub trait MirrorStore<R>: Send + Sync {
    /// Ids of every record currently mirrored.
    async fn ids(&self) -> Result<Vec<i64>, SyncError>;

    /// Removes one record. Removing an absent id is not an error.
    async fn delete(&self, id: i64) -> Result<(), SyncError>;

    /// Inserts or fully replaces one record.
    async fn upsert(&self, record: R) -> Result<(), SyncError>;
}

/// What one reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Records received from the remote.
    pub fetched: usize,
    /// Orphaned local rows removed.
    pub deleted: usize,
    /// Remote records written to the mirror.
    pub upserted: usize,
    /// `true` if the pass declined to act on an empty remote answer.
    pub skipped_empty: bool,
}

/// Reconciles one mirrored collection against its remote source.
pub struct ReconciliationEngine<R> {
    kind: &'static str,
    remote: Arc<dyn RemoteSource<R>>,
    store: Arc<dyn MirrorStore<R>>,
    allow_empty_remote: bool,
}

impl<R: MirrorRecord> ReconciliationEngine<R> {
    /// Creates an engine for one collection.
    ///
    /// The `kind` names the collection in log output.
    pub fn new(
        kind: &'static str,
        remote: Arc<dyn RemoteSource<R>>,
        store: Arc<dyn MirrorStore<R>>,
    ) -> Self {
        Self {
            kind,
            remote,
            store,
            allow_empty_remote: false,
        }
    }

    /// Treat an empty remote collection as authoritative instead of
    /// skipping the pass.
    #[must_use]
    pub fn with_allow_empty_remote(mut self, allow: bool) -> Self {
        self.allow_empty_remote = allow;
        self
    }

    /// Runs one full reconciliation pass.
    ///
    /// # Errors
    /// Propagates remote fetch failures and store failures; the mirror is
    /// left as far as the pass got.
    pub async fn run(&self) -> Result<ReconcileOutcome, SyncError> {
        let remote_records = self.remote.fetch_all().await?;

        if remote_records.is_empty() && !self.allow_empty_remote {
            tracing::warn!(
                collection = self.kind,
                "remote returned no records, leaving mirror untouched"
            );
            return Ok(ReconcileOutcome {
                skipped_empty: true,
                ..ReconcileOutcome::default()
            });
        }

        let fetched = remote_records.len();
        let remote_ids: Vec<i64> = remote_records.iter().map(MirrorRecord::id).collect();
        let local_ids = self.store.ids().await?;

        let orphans = orphaned_ids(&local_ids, &remote_ids);
        for id in &orphans {
            self.store.delete(*id).await?;
            tracing::debug!(collection = self.kind, id, "removed orphaned record");
        }

        for record in remote_records {
            self.store.upsert(record).await?;
        }

        let outcome = ReconcileOutcome {
            fetched,
            deleted: orphans.len(),
            upserted: fetched,
            skipped_empty: false,
        };
        tracing::info!(
            collection = self.kind,
            fetched = outcome.fetched,
            deleted = outcome.deleted,
            upserted = outcome.upserted,
            "reconciliation pass complete"
        );
        Ok(outcome)
    }
}
