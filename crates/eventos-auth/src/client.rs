//! Outbound HTTP client that manages its own bearer credential.
//!
//! [`AuthenticatingClient`] wraps a [`reqwest::Client`] and a [`TokenCache`].
//! Every request gets the cached bearer token attached. A 401 response is
//! handled exactly once per request: the cached token is invalidated, a fresh
//! one is fetched, and the identical request is resent. The second response
//! is returned as-is, whatever its status; deciding that a second 401 is
//! fatal belongs to the caller.

use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode};

use crate::cache::TokenCache;
use crate::error::AuthError;

/// HTTP client with automatic bearer attachment and one-shot 401 recovery.
#[derive(Clone)]
pub struct AuthenticatingClient {
    http: reqwest::Client,
    tokens: Arc<TokenCache>,
}

impl AuthenticatingClient {
    /// Creates a client around an existing HTTP client and token cache.
    pub fn new(http: reqwest::Client, tokens: Arc<TokenCache>) -> Self {
        Self { http, tokens }
    }

    /// Starts a GET request to `url`.
    #[must_use]
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url)
    }

    /// Starts a POST request to `url`.
    #[must_use]
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.http.post(url)
    }

    /// Sends the request with the cached bearer token attached.
    ///
    /// On a 401 the cached token is invalidated and the request is retried
    /// once with a freshly fetched token. The retry requires a cloneable
    /// request (no streaming body); a request that cannot be cloned is sent
    /// once, without the recovery path.
    ///
    /// # Errors
    /// Returns [`AuthError::FetchFailure`] for transport errors or a failed
    /// token fetch. Non-2xx statuses are not errors here.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, AuthError> {
        let retry = request.try_clone();

        let token = self.tokens.get().await?;
        let response = request
            .bearer_auth(&token.token)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(retry) = retry else {
            return Ok(response);
        };

        tracing::info!(
            status = %response.status(),
            "request rejected, invalidating cached token and retrying once"
        );
        self.tokens.invalidate().await;
        let fresh = self.tokens.get().await?;

        retry
            .bearer_auth(&fresh.token)
            .send()
            .await
            .map_err(transport_error)
    }

    /// The token cache backing this client.
    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenCache> {
        &self.tokens
    }
}

fn transport_error(err: reqwest::Error) -> AuthError {
    AuthError::fetch_failure(format!("request failed: {err}"))
}
