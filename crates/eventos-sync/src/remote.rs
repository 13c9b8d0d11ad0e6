//! HTTP remote source.
//!
//! Generic GET-and-decode over the [`AuthenticatingClient`], so every
//! collection endpoint shares the bearer handling and the 401 recovery. The
//! client retries a 401 once; a 401 surfacing here means the refreshed
//! credential was also rejected.

use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use eventos_auth::AuthenticatingClient;

use crate::engine::RemoteSource;
use crate::error::SyncError;

/// Fetches one collection from a catalog endpoint as a JSON array.
pub struct HttpSource<R> {
    client: AuthenticatingClient,
    url: String,
    _record: PhantomData<fn() -> R>,
}

impl<R> HttpSource<R> {
    /// Creates a source for `{base_url}{path}`.
    pub fn new(client: AuthenticatingClient, base_url: &str, path: &str) -> Self {
        Self {
            client,
            url: format!("{}{path}", base_url.trim_end_matches('/')),
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<R> RemoteSource<R> for HttpSource<R>
where
    R: DeserializeOwned + Send + Sync + 'static,
{
    async fn fetch_all(&self) -> Result<Vec<R>, SyncError> {
        let response = self.client.send(self.client.get(&self.url)).await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(SyncError::Unauthorized(format!(
                "{} rejected our credential after a refresh",
                self.url
            )));
        }
        if !status.is_success() {
            return Err(SyncError::fetch(format!(
                "{} answered with status {status}",
                self.url
            )));
        }

        response
            .json::<Vec<R>>()
            .await
            .map_err(|e| SyncError::malformed(format!("{}: {e}", self.url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use eventos_auth::{AuthError, CredentialFetcher, TokenCache, TokenCacheConfig};

    use crate::records::EventSummaryRecord;

    struct StaticFetcher(&'static str);

    #[async_trait]
    impl CredentialFetcher for StaticFetcher {
        async fn fetch(&self) -> Result<String, AuthError> {
            Ok(self.0.to_string())
        }
    }

    fn client(token: &'static str) -> AuthenticatingClient {
        let cache = TokenCache::new(
            Arc::new(StaticFetcher(token)),
            TokenCacheConfig::default(),
            "test",
        );
        AuthenticatingClient::new(reqwest::Client::new(), Arc::new(cache))
    }

    #[tokio::test]
    async fn decodes_a_json_array_with_bearer_attached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/endpoints/v1/eventos-resumidos"))
            .and(header("authorization", "Bearer cat-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 1, "titulo": "uno"},
                {"id": 2, "titulo": "dos"}
            ])))
            .mount(&server)
            .await;

        let source: HttpSource<EventSummaryRecord> = HttpSource::new(
            client("cat-token"),
            &server.uri(),
            "/api/endpoints/v1/eventos-resumidos",
        );

        let records = source.fetch_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
    }

    #[tokio::test]
    async fn persistent_401_maps_to_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let source: HttpSource<EventSummaryRecord> =
            HttpSource::new(client("t"), &server.uri(), "/api/endpoints/v1/eventos");

        let err = source.fetch_all().await.unwrap_err();
        assert!(matches!(err, SyncError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn server_error_maps_to_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let source: HttpSource<EventSummaryRecord> =
            HttpSource::new(client("t"), &server.uri(), "/api/endpoints/v1/eventos");

        assert!(matches!(
            source.fetch_all().await,
            Err(SyncError::Fetch(_))
        ));
    }

    #[tokio::test]
    async fn undecodable_body_maps_to_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let source: HttpSource<EventSummaryRecord> =
            HttpSource::new(client("t"), &server.uri(), "/api/endpoints/v1/eventos");

        assert!(matches!(
            source.fetch_all().await,
            Err(SyncError::Malformed(_))
        ));
    }
}
