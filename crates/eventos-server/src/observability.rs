//! Tracing initialization with a configurable log level.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initializes the global subscriber.
///
/// `RUST_LOG` wins if set; otherwise the configured level applies to the
/// whole tree. Calling twice is harmless (the second init is ignored).
pub fn init_tracing(level: &str) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}
