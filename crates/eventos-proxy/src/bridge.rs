//! Change-notification bridge.
//!
//! Subscribes to the catalog's change channel and pokes the backend's
//! internal sync endpoint on every message. The message payload is carried
//! through for logging only; the sync endpoint re-reads everything, so a
//! lost or duplicated notification costs at most one extra pass.
//!
//! The subscriber loop never gives up: a dropped connection is re-dialed
//! with capped exponential backoff, and a failed notification is logged
//! and dropped.

use std::time::Duration;

use futures_util::StreamExt;

/// Channel the catalog publishes change notifications on.
pub const CHANGE_CHANNEL: &str = "eventos-actualizacion";

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(300);
const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Forwards change notifications to the internal sync endpoint.
pub struct ChangeNotificationBridge {
    redis_url: String,
    channel: String,
    sync_url: String,
    http: reqwest::Client,
}

impl ChangeNotificationBridge {
    /// Creates a bridge from the notification channel to `sync_url`.
    pub fn new(redis_url: impl Into<String>, sync_url: impl Into<String>) -> Self {
        Self {
            redis_url: redis_url.into(),
            channel: CHANGE_CHANNEL.to_string(),
            sync_url: sync_url.into(),
            http: notify_client(DEFAULT_NOTIFY_TIMEOUT),
        }
    }

    /// Overrides the subscription channel.
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    /// Overrides the bound on each sync trigger. A slow sync endpoint must
    /// not stall the subscriber loop; a timed-out trigger is logged and the
    /// next notification tries again.
    #[must_use]
    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.http = notify_client(timeout);
        self
    }

    /// Spawns the subscriber loop as a background task.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut backoff = INITIAL_BACKOFF;
            loop {
                match self.run().await {
                    Ok(()) => {
                        backoff = INITIAL_BACKOFF;
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            backoff_secs = backoff.as_secs(),
                            "change-notification subscriber lost, reconnecting"
                        );
                        tokio::time::sleep(backoff).await;
                        backoff = next_backoff(backoff);
                    }
                }
            }
        })
    }

    async fn run(&self) -> Result<(), String> {
        let client = redis::Client::open(self.redis_url.as_str())
            .map_err(|e| format!("failed to create redis client: {e}"))?;

        let mut pubsub = client
            .get_async_pubsub()
            .await
            .map_err(|e| format!("failed to open pub/sub connection: {e}"))?;

        pubsub
            .subscribe(&self.channel)
            .await
            .map_err(|e| format!("failed to subscribe: {e}"))?;

        tracing::info!(channel = %self.channel, "subscribed to change notifications");

        let mut stream = pubsub.on_message();
        loop {
            match stream.next().await {
                Some(msg) => {
                    let payload = msg.get_payload::<String>().unwrap_or_default();
                    self.notify(&payload).await;
                }
                None => return Err("pub/sub connection closed".to_string()),
            }
        }
    }

    /// Tells the backend to run a sync pass. Failures are logged, not
    /// propagated; the next notification tries again.
    pub async fn notify(&self, payload: &str) {
        tracing::info!(payload, "change notification received, triggering sync");

        match self.http.post(&self.sync_url).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(status = %response.status(), "sync trigger accepted");
            }
            Ok(response) => {
                tracing::warn!(status = %response.status(), "sync trigger rejected");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to reach sync endpoint");
            }
        }
    }
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

fn notify_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
