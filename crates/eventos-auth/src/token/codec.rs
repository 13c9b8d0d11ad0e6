//! Signature-free JWT payload introspection.
//!
//! The token cache needs the `iat`/`exp` claims of a token it just received
//! to compute a renewal schedule. It does not need to trust the token — the
//! issuer is the party we authenticated against — so the payload is decoded
//! without verifying the signature. Anything that fails to decode simply
//! yields `None` and the caller falls back to a configured default lifetime.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use time::OffsetDateTime;

/// Decodes the payload segment of a JWT into a JSON value.
///
/// Returns `None` if the token does not have at least two segments or the
/// payload is not valid base64url-encoded JSON.
#[must_use]
pub fn decode_payload(token: &str) -> Option<serde_json::Value> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Extracts the `iat` claim as a timestamp.
#[must_use]
pub fn issued_at(token: &str) -> Option<OffsetDateTime> {
    claim_timestamp(token, "iat")
}

/// Extracts the `exp` claim as a timestamp.
#[must_use]
pub fn expires_at(token: &str) -> Option<OffsetDateTime> {
    claim_timestamp(token, "exp")
}

/// Extracts the decoded lifetime of a token: `(issued_at, expires_at)`.
///
/// Returns `None` unless both claims are present and `exp` is after `iat`.
#[must_use]
pub fn lifetime(token: &str) -> Option<(OffsetDateTime, OffsetDateTime)> {
    let payload = decode_payload(token)?;
    let iat = timestamp_field(&payload, "iat")?;
    let exp = timestamp_field(&payload, "exp")?;
    (exp > iat).then_some((iat, exp))
}

fn claim_timestamp(token: &str, claim: &str) -> Option<OffsetDateTime> {
    timestamp_field(&decode_payload(token)?, claim)
}

fn timestamp_field(payload: &serde_json::Value, claim: &str) -> Option<OffsetDateTime> {
    let secs = payload.get(claim)?.as_i64()?;
    OffsetDateTime::from_unix_timestamp(secs).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds an unsigned token with the given payload, the way a test
    /// issuer would: `base64url(header).base64url(payload).sig`.
    fn fake_token(payload: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
        format!("{header}.{body}.sig")
    }

    #[test]
    fn decodes_iat_and_exp() {
        let token = fake_token(serde_json::json!({"sub": "api-access", "iat": 1_700_000_000, "exp": 1_700_086_400}));

        assert_eq!(
            issued_at(&token).map(OffsetDateTime::unix_timestamp),
            Some(1_700_000_000)
        );
        assert_eq!(
            expires_at(&token).map(OffsetDateTime::unix_timestamp),
            Some(1_700_086_400)
        );

        let (iat, exp) = lifetime(&token).unwrap();
        assert_eq!((exp - iat).whole_seconds(), 86_400);
    }

    #[test]
    fn missing_claims_yield_none() {
        let token = fake_token(serde_json::json!({"sub": "api-access"}));
        assert!(issued_at(&token).is_none());
        assert!(expires_at(&token).is_none());
        assert!(lifetime(&token).is_none());
    }

    #[test]
    fn lifetime_requires_exp_after_iat() {
        let token = fake_token(serde_json::json!({"iat": 1_700_000_000, "exp": 1_700_000_000}));
        assert!(lifetime(&token).is_none());
    }

    #[test]
    fn garbage_is_none_not_panic() {
        assert!(decode_payload("not-a-jwt").is_none());
        assert!(decode_payload("a.%%%.c").is_none());
        assert!(lifetime("").is_none());
    }

    #[test]
    fn real_issued_token_roundtrips() {
        use crate::token::jwt::TokenIssuer;
        use base64::engine::general_purpose::STANDARD;

        let key = STANDARD.encode(b"0123456789abcdef0123456789abcdef");
        let issuer = TokenIssuer::new(&key, std::time::Duration::from_secs(3600)).unwrap();
        let token = issuer.issue().unwrap();

        let (iat, exp) = lifetime(&token).unwrap();
        assert_eq!((exp - iat).whole_seconds(), 3600);
    }
}
