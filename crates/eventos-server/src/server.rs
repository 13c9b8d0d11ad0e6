//! Wiring and the server loop.

use std::sync::Arc;

use anyhow::Context;

use eventos_auth::{
    AuthenticatingClient, LoginCredentialFetcher, TokenCache, TokenIssuer, TokenValidator,
};
use eventos_proxy::{ChangeNotificationBridge, RedisSeatStore, SeatCacheReader};
use eventos_sync::{CatalogMirrors, CatalogSyncService};

use crate::config::AppConfig;
use crate::routes::router;
use crate::state::AppState;

/// Builds the application state from validated configuration.
///
/// # Errors
/// Fails if a secret does not decode or the Redis pool cannot be created.
pub fn build_state(config: &AppConfig) -> anyhow::Result<(AppState, CatalogMirrors)> {
    let issuer = TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_ttl())
        .context("invalid jwt secret")?;
    let validator = TokenValidator::new(&config.auth.jwt_secret).context("invalid jwt secret")?;

    let request_timeout = config.auth.external.request_timeout();
    let fetcher = LoginCredentialFetcher::new(
        &config.auth.external.base_url,
        config.auth.external.username.clone(),
        config.auth.external.password.clone(),
        request_timeout,
    )
    .context("failed to build catalog login client")?;
    let catalog_tokens = Arc::new(TokenCache::new(
        Arc::new(fetcher),
        config.auth.cache.to_cache_config(),
        "catalog",
    ));
    let outbound = reqwest::Client::builder()
        .timeout(request_timeout)
        .build()
        .context("failed to build outbound HTTP client")?;
    let catalog_client = AuthenticatingClient::new(outbound, catalog_tokens);

    let mirrors = CatalogMirrors::new();
    let sync = Arc::new(CatalogSyncService::over_http(
        catalog_client,
        &config.sync.catalog_base_url,
        &mirrors,
        config.sync.allow_empty_remote,
    ));

    let redis_pool = deadpool_redis::Config::from_url(&config.redis.url)
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .context("failed to create redis pool")?;
    let seats = Arc::new(SeatCacheReader::new(Arc::new(RedisSeatStore::new(
        redis_pool,
    ))));

    let state = AppState {
        issuer: Arc::new(issuer),
        validator: Arc::new(validator),
        api_secret: Arc::from(config.auth.api_secret.as_str()),
        sync,
        seats,
    };
    Ok((state, mirrors))
}

/// Runs the server until a shutdown signal arrives.
///
/// # Errors
/// Fails if the listener cannot bind or the server loop errors.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let (state, _mirrors) = build_state(&config)?;

    // Best-effort initial fill: the app must come up even when the catalog
    // is down, the bridge and manual triggers catch it up later.
    if config.sync.startup_sync {
        let sync = state.sync.clone();
        tokio::spawn(async move {
            match sync.sync_all().await {
                Ok(report) => tracing::info!(status = %report.status_line(), "startup sync done"),
                Err(e) => tracing::warn!(error = %e, "startup sync failed, continuing"),
            }
        });
    }

    if config.bridge.enabled {
        let sync_url = format!(
            "http://127.0.0.1:{}/internal/events/sync",
            config.server.port
        );
        ChangeNotificationBridge::new(config.redis.url.clone(), sync_url).start();
    }

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received ctrl-c"),
        () = terminate => tracing::info!("received terminate signal"),
    }
}
