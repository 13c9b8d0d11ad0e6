//! Error types for the occupancy tier.

use thiserror::Error;

/// Errors produced by the seat cache read path.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The cache backend failed (connection, pool, command).
    #[error("Store failure: {0}")]
    Store(String),

    /// A cached record exists but could not be parsed.
    #[error("Malformed record: {0}")]
    Malformed(String),
}

impl ProxyError {
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}
