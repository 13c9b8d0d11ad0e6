//! Error types for catalog reconciliation.

use thiserror::Error;

use eventos_auth::AuthError;

/// Errors produced by a reconciliation pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote could not be reached or answered with a non-2xx status.
    #[error("Fetch failure: {0}")]
    Fetch(String),

    /// The remote rejected our credential even after a refresh.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The remote answered 2xx but the body did not decode.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The local mirror store failed.
    #[error("Store failure: {0}")]
    Store(String),
}

impl SyncError {
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }
}

impl From<AuthError> for SyncError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized(msg) => Self::Unauthorized(msg),
            other => Self::Fetch(other.to_string()),
        }
    }
}
