//! Concrete credential fetchers.
//!
//! Two upstreams hand out bearer tokens:
//!
//! - the external catalog's `POST /login` endpoint, which takes a username
//!   and password and answers `{ "id_token": ... }`;
//! - the backend's own `POST /api/auth/token` endpoint, which takes a shared
//!   secret and answers `{ "token": ... }`.
//!
//! Both are thin [`CredentialFetcher`] implementations meant to sit behind a
//! [`TokenCache`](crate::cache::TokenCache). A non-2xx status or a network
//! error maps to [`AuthError::FetchFailure`]; a 2xx body missing the token
//! field maps to [`AuthError::MalformedResponse`], which callers treat the
//! same way.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cache::CredentialFetcher;
use crate::error::AuthError;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    id_token: Option<String>,
}

/// Fetches catalog tokens by logging in with a username and password.
pub struct LoginCredentialFetcher {
    client: reqwest::Client,
    login_url: String,
    username: String,
    password: String,
}

impl LoginCredentialFetcher {
    /// Creates a fetcher against `{base_url}/login`. Every fetch is bounded
    /// by `timeout`; a timeout surfaces as a fetch failure.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            client: build_client(timeout)?,
            login_url: format!("{}/login", base_url.trim_end_matches('/')),
            username: username.into(),
            password: password.into(),
        })
    }
}

#[async_trait]
impl CredentialFetcher for LoginCredentialFetcher {
    async fn fetch(&self) -> Result<String, AuthError> {
        tracing::debug!(url = %self.login_url, "logging in to catalog");

        let response = self
            .client
            .post(&self.login_url)
            .json(&LoginRequest {
                username: &self.username,
                password: &self.password,
            })
            .send()
            .await
            .map_err(|e| AuthError::fetch_failure(format!("login request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::fetch_failure(format!(
                "login rejected with status {status}"
            )));
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| AuthError::fetch_failure(format!("unreadable login response: {e}")))?;

        body.id_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::missing_field("id_token"))
    }
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
}

/// Fetches inter-service tokens from the backend's token endpoint using a
/// shared secret.
///
/// This is the client half of `POST /api/auth/token`, for peer services
/// that call the backend from another process. The backend itself validates
/// tokens in-process and never uses this fetcher.
pub struct ServiceTokenFetcher {
    client: reqwest::Client,
    token_url: String,
    secret: String,
}

impl ServiceTokenFetcher {
    /// Creates a fetcher against `{base_url}/api/auth/token`. Every fetch is
    /// bounded by `timeout`; a timeout surfaces as a fetch failure.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        base_url: &str,
        secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            client: build_client(timeout)?,
            token_url: format!("{}/api/auth/token", base_url.trim_end_matches('/')),
            secret: secret.into(),
        })
    }
}

#[async_trait]
impl CredentialFetcher for ServiceTokenFetcher {
    async fn fetch(&self) -> Result<String, AuthError> {
        tracing::debug!(url = %self.token_url, "requesting service token");

        let response = self
            .client
            .post(&self.token_url)
            .json(&TokenRequest {
                secret: &self.secret,
            })
            .send()
            .await
            .map_err(|e| AuthError::fetch_failure(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::fetch_failure(format!(
                "token request rejected with status {status}"
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::fetch_failure(format!("unreadable token response: {e}")))?;

        body.token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::missing_field("token"))
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, AuthError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AuthError::fetch_failure(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn login_fetcher_extracts_id_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(serde_json::json!({
                "username": "svc",
                "password": "hunter2",
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id_token": "abc.def.ghi"})),
            )
            .mount(&server)
            .await;

        let fetcher = LoginCredentialFetcher::new(&server.uri(), "svc", "hunter2", TIMEOUT).unwrap();
        assert_eq!(fetcher.fetch().await.unwrap(), "abc.def.ghi");
    }

    #[tokio::test]
    async fn login_rejection_is_fetch_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let fetcher = LoginCredentialFetcher::new(&server.uri(), "svc", "wrong", TIMEOUT).unwrap();
        let err = fetcher.fetch().await.unwrap_err();
        assert!(err.is_fetch_failure(), "got {err:?}");
    }

    #[tokio::test]
    async fn login_response_without_token_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})),
            )
            .mount(&server)
            .await;

        let fetcher = LoginCredentialFetcher::new(&server.uri(), "svc", "hunter2", TIMEOUT).unwrap();
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, AuthError::MalformedResponse { ref field } if field == "id_token"));
        assert!(err.is_fetch_failure());
    }

    #[tokio::test]
    async fn service_fetcher_extracts_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/token"))
            .and(body_json(serde_json::json!({"secret": "s3cr3t"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "tok"})),
            )
            .mount(&server)
            .await;

        let fetcher = ServiceTokenFetcher::new(&server.uri(), "s3cr3t", TIMEOUT).unwrap();
        assert_eq!(fetcher.fetch().await.unwrap(), "tok");
    }

    #[tokio::test]
    async fn empty_token_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": ""})),
            )
            .mount(&server)
            .await;

        let fetcher = ServiceTokenFetcher::new(&server.uri(), "s3cr3t", TIMEOUT).unwrap();
        assert!(matches!(
            fetcher.fetch().await,
            Err(AuthError::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_tolerated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id_token": "t"})),
            )
            .mount(&server)
            .await;

        let base = format!("{}/", server.uri());
        let fetcher = LoginCredentialFetcher::new(&base, "u", "p", TIMEOUT).unwrap();
        assert_eq!(fetcher.fetch().await.unwrap(), "t");
    }
}
