//! Error types for the credential lifecycle subsystem.

use thiserror::Error;

/// Errors that can occur while obtaining, validating or using credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Network failure, timeout or non-2xx status on an outbound call.
    #[error("Fetch failure: {0}")]
    FetchFailure(String),

    /// A downstream call was rejected with 401 even after a retry.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The response was readable but missing an expected field.
    #[error("Malformed response: missing field `{field}`")]
    MalformedResponse {
        /// Name of the missing field.
        field: String,
    },

    /// Failed to encode a token.
    #[error("Failed to encode token: {0}")]
    Encoding(String),

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token could not be decoded.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The shared signing key is not valid base64 or otherwise unusable.
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

impl AuthError {
    pub fn fetch_failure(message: impl Into<String>) -> Self {
        Self::FetchFailure(message.into())
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MalformedResponse {
            field: field.into(),
        }
    }

    /// Returns `true` for failures of an outbound fetch.
    ///
    /// A malformed response counts: the caller asked for a token and did not
    /// get one, so the recovery (retry later) is the same as for a network
    /// error.
    #[must_use]
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::FetchFailure(_) | Self::MalformedResponse { .. }
        )
    }

    /// Returns `true` if this is a token validation error.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Expired | Self::InvalidSignature | Self::InvalidToken(_)
        )
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidKeyFormat => Self::InvalidKey(err.to_string()),
            _ => Self::InvalidToken(err.to_string()),
        }
    }
}
