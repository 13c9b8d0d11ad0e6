//! # eventos-server
//!
//! HTTP surface and wiring: token issuance, the internal sync trigger and
//! the bearer-protected seat projection route, assembled over the
//! credential, reconciliation and occupancy crates.

pub mod config;
pub mod observability;
pub mod routes;
pub mod server;
pub mod state;

pub use config::AppConfig;
pub use routes::router;
pub use state::AppState;
