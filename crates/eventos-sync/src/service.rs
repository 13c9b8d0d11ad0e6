//! The full sync cycle.
//!
//! [`CatalogSyncService`] sequences the three reconciliation engines —
//! condensed events, full events, sales — behind a single entry point, which
//! both the internal HTTP trigger and the change-notification bridge call.
//!
//! Triggers are single-flighted per instance: a trigger that arrives while a
//! pass is running waits for that pass and reports a coalesced result
//! instead of starting another one. The guard is a generation counter read
//! before taking the gate; if the generation advanced while we waited,
//! somebody else completed a full pass after our trigger arrived, which is
//! all a notification asks for.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

use eventos_auth::AuthenticatingClient;

use crate::engine::{ReconcileOutcome, ReconciliationEngine};
use crate::error::SyncError;
use crate::records::{EventRecord, EventSummaryRecord, SaleRecord};
use crate::remote::HttpSource;
use crate::store::MemoryMirror;

/// Catalog endpoint for condensed events.
pub const SUMMARIES_PATH: &str = "/api/endpoints/v1/eventos-resumidos";
/// Catalog endpoint for full events.
pub const EVENTS_PATH: &str = "/api/endpoints/v1/eventos";
/// Catalog endpoint for sales.
pub const SALES_PATH: &str = "/api/endpoints/v1/listar-ventas";

/// Result of one sync trigger.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncReport {
    /// `true` if this trigger rode on a pass another trigger completed.
    pub coalesced: bool,
    pub summaries: ReconcileOutcome,
    pub events: ReconcileOutcome,
    pub sales: ReconcileOutcome,
}

impl SyncReport {
    fn coalesced() -> Self {
        Self {
            coalesced: true,
            ..Self::default()
        }
    }

    /// One-line human-readable summary for the trigger endpoint.
    #[must_use]
    pub fn status_line(&self) -> String {
        if self.coalesced {
            return "sync already in flight, rode on the completed pass".to_string();
        }
        format!(
            "sync complete: {} summaries, {} events, {} sales ({} rows removed)",
            self.summaries.upserted,
            self.events.upserted,
            self.sales.upserted,
            self.summaries.deleted + self.events.deleted + self.sales.deleted,
        )
    }
}

/// The local mirrors the sync cycle maintains.
pub struct CatalogMirrors {
    pub summaries: Arc<MemoryMirror<EventSummaryRecord>>,
    pub events: Arc<MemoryMirror<EventRecord>>,
    pub sales: Arc<MemoryMirror<SaleRecord>>,
}

impl CatalogMirrors {
    /// Creates three empty mirrors.
    #[must_use]
    pub fn new() -> Self {
        Self {
            summaries: Arc::new(MemoryMirror::new()),
            events: Arc::new(MemoryMirror::new()),
            sales: Arc::new(MemoryMirror::new()),
        }
    }
}

impl Default for CatalogMirrors {
    fn default() -> Self {
        Self::new()
    }
}

/// Sequences the three reconciliation engines behind one single-flighted
/// entry point.
pub struct CatalogSyncService {
    summaries: ReconciliationEngine<EventSummaryRecord>,
    events: ReconciliationEngine<EventRecord>,
    sales: ReconciliationEngine<SaleRecord>,
    generation: AtomicU64,
    gate: Mutex<()>,
}

impl CatalogSyncService {
    /// Assembles a service from pre-built engines.
    pub fn new(
        summaries: ReconciliationEngine<EventSummaryRecord>,
        events: ReconciliationEngine<EventRecord>,
        sales: ReconciliationEngine<SaleRecord>,
    ) -> Self {
        Self {
            summaries,
            events,
            sales,
            generation: AtomicU64::new(0),
            gate: Mutex::new(()),
        }
    }

    /// Wires the standard setup: HTTP sources on the catalog's endpoints
    /// feeding the given mirrors.
    pub fn over_http(
        client: AuthenticatingClient,
        base_url: &str,
        mirrors: &CatalogMirrors,
        allow_empty_remote: bool,
    ) -> Self {
        let summaries = ReconciliationEngine::new(
            "summaries",
            Arc::new(HttpSource::new(client.clone(), base_url, SUMMARIES_PATH)),
            mirrors.summaries.clone(),
        )
        .with_allow_empty_remote(allow_empty_remote);

        let events = ReconciliationEngine::new(
            "events",
            Arc::new(HttpSource::new(client.clone(), base_url, EVENTS_PATH)),
            mirrors.events.clone(),
        )
        .with_allow_empty_remote(allow_empty_remote);

        let sales = ReconciliationEngine::new(
            "sales",
            Arc::new(HttpSource::new(client, base_url, SALES_PATH)),
            mirrors.sales.clone(),
        )
        .with_allow_empty_remote(allow_empty_remote);

        Self::new(summaries, events, sales)
    }

    /// Runs (or coalesces into) one full sync cycle.
    ///
    /// The cycle runs summaries, then full events, then sales, and stops at
    /// the first engine failure; the next trigger retries all three.
    ///
    /// # Errors
    /// Propagates the first engine failure of the pass.
    pub async fn sync_all(&self) -> Result<SyncReport, SyncError> {
        let observed = self.generation.load(Ordering::Acquire);
        let _guard = self.gate.lock().await;

        if self.generation.load(Ordering::Acquire) != observed {
            tracing::debug!("sync trigger coalesced into a pass that just completed");
            return Ok(SyncReport::coalesced());
        }

        tracing::info!("starting full catalog sync");
        let summaries = self.summaries.run().await?;
        let events = self.events.run().await?;
        let sales = self.sales.run().await?;

        // Advance only after a complete pass, so waiters coalesce onto
        // finished work, never onto a failed attempt.
        self.generation.fetch_add(1, Ordering::Release);

        Ok(SyncReport {
            coalesced: false,
            summaries,
            events,
            sales,
        })
    }
}
