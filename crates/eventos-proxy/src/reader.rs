//! Seat cache read path.
//!
//! The backend owns the cache contents; this side only reads. A missing key
//! is a normal outcome (`Ok(None)`, the event simply has no snapshot), a
//! present-but-unparseable record is an error.

use std::sync::Arc;

use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use time::OffsetDateTime;

use crate::error::ProxyError;
use crate::seats::{EventSeats, project};

/// Raw snapshot storage, keyed by event id.
#[async_trait]
pub trait SeatStore: Send + Sync {
    /// Returns the stored snapshot for the event, if any.
    async fn fetch(&self, event_id: &str) -> Result<Option<String>, ProxyError>;
}

/// Redis-backed snapshot storage under `evento_{id}` keys.
pub struct RedisSeatStore {
    pool: Pool,
}

impl RedisSeatStore {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    fn key(event_id: &str) -> String {
        format!("evento_{event_id}")
    }
}

#[async_trait]
impl SeatStore for RedisSeatStore {
    async fn fetch(&self, event_id: &str) -> Result<Option<String>, ProxyError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| ProxyError::store(format!("redis pool: {e}")))?;

        conn.get(Self::key(event_id))
            .await
            .map_err(|e| ProxyError::store(format!("redis get: {e}")))
    }
}

/// Reads seat snapshots and applies the expiry projection.
pub struct SeatCacheReader {
    store: Arc<dyn SeatStore>,
}

impl SeatCacheReader {
    /// Creates a reader over any snapshot store.
    pub fn new(store: Arc<dyn SeatStore>) -> Self {
        Self { store }
    }

    /// Looks up the event's snapshot and projects it to the present moment.
    ///
    /// # Errors
    /// Returns [`ProxyError::Store`] if the backend fails and
    /// [`ProxyError::Malformed`] if a stored record does not decode. A
    /// missing key is `Ok(None)`.
    pub async fn seats(&self, event_id: &str) -> Result<Option<EventSeats>, ProxyError> {
        let Some(raw) = self.store.fetch(event_id).await? else {
            return Ok(None);
        };

        let snapshot: EventSeats = serde_json::from_str(&raw)
            .map_err(|e| ProxyError::malformed(format!("event {event_id}: {e}")))?;

        Ok(Some(project(snapshot, OffsetDateTime::now_utc())))
    }
}
