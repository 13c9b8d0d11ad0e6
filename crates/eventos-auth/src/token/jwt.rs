//! Token issuance and validation.
//!
//! Both services share one base64-encoded HMAC secret: the backend mints
//! HS256 tokens with a fixed subject and a configurable time-to-live, the
//! proxy tier only verifies them. Verification checks the signature and the
//! `exp` claim; authorization policy beyond "valid signed token, not
//! expired" is out of scope.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::AuthError;

/// Subject claim carried by every token issued for API access.
pub const TOKEN_SUBJECT: &str = "api-access";

/// Claims carried by an issued API token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiClaims {
    /// Subject (always [`TOKEN_SUBJECT`]).
    pub sub: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

/// Mints signed API tokens.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// Creates an issuer from a base64-encoded HMAC secret.
    ///
    /// # Errors
    /// Returns an error if the secret is not valid base64.
    pub fn new(secret_base64: &str, ttl: Duration) -> Result<Self, AuthError> {
        let key_bytes = decode_secret(secret_base64)?;
        Ok(Self {
            encoding_key: EncodingKey::from_secret(&key_bytes),
            ttl,
        })
    }

    /// Issues a new signed token valid for the configured time-to-live.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn issue(&self) -> Result<String, AuthError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = ApiClaims {
            sub: TOKEN_SUBJECT.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    /// Returns the configured token time-to-live.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Verifies token signature and expiry against the shared secret.
pub struct TokenValidator {
    decoding_key: DecodingKey,
}

impl TokenValidator {
    /// Creates a validator from a base64-encoded HMAC secret.
    ///
    /// # Errors
    /// Returns an error if the secret is not valid base64.
    pub fn new(secret_base64: &str) -> Result<Self, AuthError> {
        let key_bytes = decode_secret(secret_base64)?;
        Ok(Self {
            decoding_key: DecodingKey::from_secret(&key_bytes),
        })
    }

    /// Decodes and validates a token, returning its claims.
    ///
    /// # Errors
    /// Returns [`AuthError::Expired`], [`AuthError::InvalidSignature`] or
    /// [`AuthError::InvalidToken`] depending on what failed.
    pub fn validate(&self, token: &str) -> Result<ApiClaims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<ApiClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    /// Returns `true` if the token has a valid signature and is not expired.
    #[must_use]
    pub fn is_valid(&self, token: &str) -> bool {
        self.validate(token).is_ok()
    }
}

fn decode_secret(secret_base64: &str) -> Result<Vec<u8>, AuthError> {
    STANDARD
        .decode(secret_base64)
        .map_err(|e| AuthError::InvalidKey(format!("signing key is not valid base64: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> String {
        STANDARD.encode(b"0123456789abcdef0123456789abcdef")
    }

    #[test]
    fn issue_and_validate() {
        let key = test_key();
        let issuer = TokenIssuer::new(&key, Duration::from_secs(86_400)).unwrap();
        let validator = TokenValidator::new(&key).unwrap();

        let token = issuer.issue().unwrap();
        let claims = validator.validate(&token).unwrap();

        assert_eq!(claims.sub, TOKEN_SUBJECT);
        assert_eq!(claims.exp - claims.iat, 86_400);
        assert!(validator.is_valid(&token));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let issuer = TokenIssuer::new(&test_key(), Duration::from_secs(3600)).unwrap();
        let other_key = STANDARD.encode(b"ffffffffffffffffffffffffffffffff");
        let validator = TokenValidator::new(&other_key).unwrap();

        let token = issuer.issue().unwrap();
        let result = validator.validate(&token);

        assert!(matches!(result, Err(AuthError::InvalidSignature)));
        assert!(!validator.is_valid(&token));
    }

    #[test]
    fn expired_token_is_rejected() {
        let key = test_key();
        let validator = TokenValidator::new(&key).unwrap();

        // Mint claims that expired an hour ago, signing them directly.
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = ApiClaims {
            sub: TOKEN_SUBJECT.to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let key_bytes = STANDARD.decode(&key).unwrap();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&key_bytes),
        )
        .unwrap();

        assert!(matches!(validator.validate(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let validator = TokenValidator::new(&test_key()).unwrap();
        assert!(matches!(
            validator.validate("not-a-token"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn non_base64_secret_is_rejected() {
        assert!(matches!(
            TokenIssuer::new("%%not-base64%%", Duration::from_secs(1)),
            Err(AuthError::InvalidKey(_))
        ));
        assert!(matches!(
            TokenValidator::new("%%not-base64%%"),
            Err(AuthError::InvalidKey(_))
        ));
    }
}
