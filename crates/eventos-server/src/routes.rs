//! HTTP routes and handlers.

use axum::extract::{Path, Request, State};
use axum::http::header;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use eventos_api::ApiError;
use eventos_proxy::EventSeats;

use crate::state::AppState;

/// Body of `POST /api/auth/token`.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub secret: String,
}

/// Successful answer of `POST /api/auth/token`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/proxy/redis/seats/{event_id}", get(seats))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    Router::new()
        .route("/api/auth/token", post(issue_token))
        .route("/internal/events/sync", post(trigger_sync))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Rejects requests without a valid bearer token.
async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token {
        Some(token) if state.validator.is_valid(token) => Ok(next.run(request).await),
        Some(_) => Err(ApiError::unauthorized("Invalid or expired token")),
        None => Err(ApiError::unauthorized("Missing bearer token")),
    }
}

/// `POST /api/auth/token`: trades the shared secret for a signed token.
async fn issue_token(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    if request.secret != *state.api_secret {
        tracing::warn!("token request with invalid secret");
        return Err(ApiError::unauthorized("Invalid secret"));
    }

    let token = state
        .issuer
        .issue()
        .map_err(|e| ApiError::internal(format!("failed to issue token: {e}")))?;

    Ok(Json(TokenResponse { token }))
}

/// `POST /internal/events/sync`: runs (or coalesces into) one full sync.
async fn trigger_sync(State(state): State<AppState>) -> Result<String, ApiError> {
    match state.sync.sync_all().await {
        Ok(report) => Ok(report.status_line()),
        Err(e) => {
            tracing::error!(error = %e, "sync trigger failed");
            Err(ApiError::internal(format!("sync failed: {e}")))
        }
    }
}

/// `GET /proxy/redis/seats/{event_id}`: projected occupancy snapshot.
async fn seats(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<EventSeats>, ApiError> {
    match state.seats.seats(&event_id).await {
        Ok(Some(snapshot)) => Ok(Json(snapshot)),
        Ok(None) => Err(ApiError::not_found(format!(
            "no seats cached for event {event_id}"
        ))),
        Err(e) => {
            tracing::error!(event_id, error = %e, "seat lookup failed");
            Err(ApiError::internal(format!("seat lookup failed: {e}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use eventos_api::ApiErrorBody;
    use eventos_auth::{TokenIssuer, TokenValidator};
    use eventos_proxy::{ProxyError, SeatCacheReader, SeatStore};
    use eventos_sync::{
        CatalogSyncService, EventRecord, EventSummaryRecord, MemoryMirror, ReconciliationEngine,
        RemoteSource, SaleRecord, SyncError,
    };

    const TEST_KEY: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";
    const TEST_SECRET: &str = "shared-secret";

    struct FixedRemote<R>(Vec<R>, bool);

    #[async_trait]
    impl<R: Clone + Send + Sync + 'static> RemoteSource<R> for FixedRemote<R> {
        async fn fetch_all(&self) -> Result<Vec<R>, SyncError> {
            if self.1 {
                return Err(SyncError::fetch("catalog unreachable"));
            }
            Ok(self.0.clone())
        }
    }

    struct MapSeatStore(HashMap<String, String>);

    #[async_trait]
    impl SeatStore for MapSeatStore {
        async fn fetch(&self, event_id: &str) -> Result<Option<String>, ProxyError> {
            Ok(self.0.get(event_id).cloned())
        }
    }

    fn sync_service(fail: bool) -> Arc<CatalogSyncService> {
        let summaries = ReconciliationEngine::new(
            "summaries",
            Arc::new(FixedRemote::<EventSummaryRecord>(
                vec![serde_json::from_str(r#"{"id": 1}"#).unwrap()],
                fail,
            )),
            Arc::new(MemoryMirror::new()),
        );
        let events = ReconciliationEngine::new(
            "events",
            Arc::new(FixedRemote::<EventRecord>(
                vec![serde_json::from_str(r#"{"id": 1}"#).unwrap()],
                false,
            )),
            Arc::new(MemoryMirror::new()),
        );
        let sales = ReconciliationEngine::new(
            "sales",
            Arc::new(FixedRemote::<SaleRecord>(
                vec![
                    serde_json::from_str(r#"{"ventaId": 5, "eventoId": 1, "resultado": true}"#)
                        .unwrap(),
                ],
                false,
            )),
            Arc::new(MemoryMirror::new()),
        );
        Arc::new(CatalogSyncService::new(summaries, events, sales))
    }

    fn app(fail_sync: bool, seats: &[(&str, &str)]) -> Router {
        let store = MapSeatStore(
            seats
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        let state = AppState {
            issuer: Arc::new(TokenIssuer::new(TEST_KEY, Duration::from_secs(3600)).unwrap()),
            validator: Arc::new(TokenValidator::new(TEST_KEY).unwrap()),
            api_secret: Arc::from(TEST_SECRET),
            sync: sync_service(fail_sync),
            seats: Arc::new(SeatCacheReader::new(Arc::new(store))),
        };
        router(state)
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn token_request(secret: &str) -> HttpRequest<Body> {
        HttpRequest::post("/api/auth/token")
            .header("content-type", "application/json")
            .body(Body::from(format!(r#"{{"secret":"{secret}"}}"#)))
            .unwrap()
    }

    #[tokio::test]
    async fn token_endpoint_issues_a_valid_token() {
        let app = app(false, &[]);
        let response = app.oneshot(token_request(TEST_SECRET)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: TokenResponse = body_json(response).await;

        let validator = TokenValidator::new(TEST_KEY).unwrap();
        assert!(validator.is_valid(&body.token));
    }

    #[tokio::test]
    async fn token_endpoint_rejects_wrong_secret() {
        let app = app(false, &[]);
        let response = app.oneshot(token_request("wrong")).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: ApiErrorBody = body_json(response).await;
        assert_eq!(body.status, 401);
        assert_eq!(body.message, "Invalid secret");
        assert!(!body.timestamp.is_empty());
    }

    #[tokio::test]
    async fn sync_endpoint_reports_the_pass() {
        let app = app(false, &[]);
        let response = app
            .oneshot(
                HttpRequest::post("/internal/events/sync")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("sync complete"), "got: {text}");
    }

    #[tokio::test]
    async fn sync_failure_is_a_500() {
        let app = app(true, &[]);
        let response = app
            .oneshot(
                HttpRequest::post("/internal/events/sync")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ApiErrorBody = body_json(response).await;
        assert!(body.message.contains("sync failed"));
    }

    #[tokio::test]
    async fn seats_route_requires_a_bearer_token() {
        let app = app(false, &[("7", r#"{"eventoId":7,"asientos":[]}"#)]);
        let response = app
            .oneshot(
                HttpRequest::get("/proxy/redis/seats/7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn seats_route_rejects_a_garbage_token() {
        let app = app(false, &[("7", r#"{"eventoId":7,"asientos":[]}"#)]);
        let response = app
            .oneshot(
                HttpRequest::get("/proxy/redis/seats/7")
                    .header("authorization", "Bearer not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn issued_token_opens_the_seats_route() {
        let raw = r#"{"eventoId":7,"asientos":[{"fila":1,"columna":2,"estado":"vendido"}]}"#;
        let app = app(false, &[("7", raw)]);

        let response = app
            .clone()
            .oneshot(token_request(TEST_SECRET))
            .await
            .unwrap();
        let TokenResponse { token } = body_json(response).await;

        let response = app
            .oneshot(
                HttpRequest::get("/proxy/redis/seats/7")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let seats: EventSeats = body_json(response).await;
        assert_eq!(seats.evento_id, Some(7));
        assert_eq!(seats.asientos[0].estado.as_deref(), Some("vendido"));
    }

    #[tokio::test]
    async fn unknown_event_is_a_404() {
        let app = app(false, &[]);

        let response = app
            .clone()
            .oneshot(token_request(TEST_SECRET))
            .await
            .unwrap();
        let TokenResponse { token } = body_json(response).await;

        let response = app
            .oneshot(
                HttpRequest::get("/proxy/redis/seats/99")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ApiErrorBody = body_json(response).await;
        assert!(body.message.contains("99"));
    }
}
