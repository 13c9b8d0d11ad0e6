//! # eventos-sync
//!
//! Catalog reconciliation: keeps local mirrors of the external catalog's
//! condensed events, full events and sales, via idempotent full-replace
//! passes.
//!
//! ## Modules
//!
//! - [`diff`] - Pure orphan computation
//! - [`records`] - Mirrored wire records
//! - [`engine`] - The per-collection reconciliation engine
//! - [`remote`] - HTTP remote source over the authenticated client
//! - [`store`] - In-memory mirror store
//! - [`service`] - The sequenced, single-flighted sync cycle

pub mod diff;
pub mod engine;
pub mod error;
pub mod records;
pub mod remote;
pub mod service;
pub mod store;

pub use engine::{MirrorStore, ReconcileOutcome, ReconciliationEngine, RemoteSource};
pub use error::SyncError;
pub use records::{EventKind, EventRecord, EventSummaryRecord, MirrorRecord, Performer, SaleRecord};
pub use remote::HttpSource;
pub use service::{CatalogMirrors, CatalogSyncService, SyncReport};
pub use store::MemoryMirror;
