//! Shared application state.

use std::sync::Arc;

use eventos_auth::{TokenIssuer, TokenValidator};
use eventos_proxy::SeatCacheReader;
use eventos_sync::CatalogSyncService;

/// Everything the handlers need, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    /// Issues API tokens for callers that present the shared secret.
    pub issuer: Arc<TokenIssuer>,
    /// Validates bearer tokens on protected routes.
    pub validator: Arc<TokenValidator>,
    /// The secret the token endpoint requires.
    pub api_secret: Arc<str>,
    /// The single-flighted sync cycle.
    pub sync: Arc<CatalogSyncService>,
    /// Seat snapshot read path.
    pub seats: Arc<SeatCacheReader>,
}
