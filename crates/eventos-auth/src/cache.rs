//! Self-renewing token cache.
//!
//! One [`TokenCache`] instance owns one cached credential for one upstream
//! credential domain (external catalog login, inter-service token). Several
//! outbound clients share the instance concurrently:
//!
//! - [`TokenCache::get`] returns a token with at least the configured safety
//!   buffer of lifetime left, refreshing synchronously if needed. The check
//!   is double-checked: a fast read outside the refresh lock, re-checked
//!   inside it, so concurrent callers that all observe "stale" collapse into
//!   a single fetch.
//! - After every successful refresh a renewal task is scheduled for
//!   `max(ttl - buffer, min_renew_interval)` in the future. Scheduling
//!   cancels any previously pending task, so at most one renewal is ever
//!   outstanding. Scheduled renewals that fail are retried after a fixed
//!   backoff and never propagate; on-demand refresh failures propagate to
//!   the caller.
//! - [`TokenCache::invalidate`] clears the slot and cancels the pending
//!   renewal. Idempotent.
//!
//! The renewal task holds only a `Weak` reference to the cache internals, so
//! dropping the cache lets the task die on its next wakeup.

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::error::AuthError;
use crate::token::codec;

/// Source of raw bearer tokens, e.g. an HTTP login or token endpoint.
///
/// Implementations must be safe to call concurrently; the cache serializes
/// calls itself but a fetcher may be shared across caches in tests.
#[async_trait]
pub trait CredentialFetcher: Send + Sync {
    /// Obtains a fresh raw token from the upstream.
    async fn fetch(&self) -> Result<String, AuthError>;
}

/// A cached bearer credential with its derived lifetime.
#[derive(Debug, Clone)]
pub struct Credential {
    /// The opaque signed token.
    pub token: String,
    /// When the token was issued (decoded claim, or fetch time).
    pub issued_at: OffsetDateTime,
    /// When the token expires. Derived once at fetch time, never recomputed.
    pub expires_at: OffsetDateTime,
}

impl Credential {
    /// Remaining lifetime, zero if already expired.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        let left = self.expires_at - OffsetDateTime::now_utc();
        if left.is_positive() {
            Duration::from_secs_f64(left.as_seconds_f64())
        } else {
            Duration::ZERO
        }
    }
}

/// Configuration for a [`TokenCache`].
#[derive(Debug, Clone)]
pub struct TokenCacheConfig {
    /// Safety buffer: a token with less than this much lifetime left is
    /// treated as stale (default: 30 seconds).
    pub buffer: Duration,

    /// Lower bound on the renewal delay, so a short-lived token cannot
    /// schedule a tight renewal loop (default: 10 seconds).
    pub min_renew_interval: Duration,

    /// Delay before retrying a failed scheduled renewal (default: 60 seconds).
    pub retry_backoff: Duration,

    /// Assumed lifetime for tokens that carry no usable `iat`/`exp` claims
    /// (default: 24 hours).
    pub default_ttl: Duration,
}

impl Default for TokenCacheConfig {
    fn default() -> Self {
        Self {
            buffer: Duration::from_secs(30),
            min_renew_interval: Duration::from_secs(10),
            retry_backoff: Duration::from_secs(60),
            default_ttl: Duration::from_secs(86_400),
        }
    }
}

impl TokenCacheConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the staleness buffer.
    #[must_use]
    pub fn with_buffer(mut self, buffer: Duration) -> Self {
        self.buffer = buffer;
        self
    }

    /// Sets the minimum renewal interval.
    #[must_use]
    pub fn with_min_renew_interval(mut self, interval: Duration) -> Self {
        self.min_renew_interval = interval;
        self
    }

    /// Sets the retry backoff for failed scheduled renewals.
    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Sets the fallback lifetime for tokens without lifetime claims.
    #[must_use]
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

/// Single-slot, self-renewing token cache for one credential domain.
pub struct TokenCache {
    inner: Arc<Inner>,
    label: &'static str,
}

struct Inner {
    fetcher: Arc<dyn CredentialFetcher>,
    config: TokenCacheConfig,
    label: &'static str,
    /// The cached credential. Read on every `get`, written by refresh only.
    current: RwLock<Option<Credential>>,
    /// Serializes refreshes; the slow path of the double-checked get.
    refresh_lock: Mutex<()>,
    /// At most one outstanding renewal task per cache.
    renewal: Mutex<Option<JoinHandle<()>>>,
}

impl TokenCache {
    /// Creates a cache around the given fetcher.
    ///
    /// The `label` names the credential domain in log output.
    pub fn new(
        fetcher: Arc<dyn CredentialFetcher>,
        config: TokenCacheConfig,
        label: &'static str,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                config,
                label,
                current: RwLock::new(None),
                refresh_lock: Mutex::new(()),
                renewal: Mutex::new(None),
            }),
            label,
        }
    }

    /// Returns a credential guaranteed to have at least the configured
    /// buffer of lifetime left, fetching a fresh one if needed.
    ///
    /// # Errors
    /// Propagates the fetch failure when a synchronous refresh is required
    /// and the fetcher fails.
    pub async fn get(&self) -> Result<Credential, AuthError> {
        if let Some(cred) = self.inner.fresh().await {
            return Ok(cred);
        }
        Inner::refresh_if_stale(&self.inner).await
    }

    /// Clears the cached credential and cancels any pending renewal.
    ///
    /// Idempotent; the next `get` performs a fresh fetch.
    pub async fn invalidate(&self) {
        if let Some(handle) = self.inner.renewal.lock().await.take() {
            handle.abort();
        }
        *self.inner.current.write().await = None;
        tracing::debug!(domain = self.label, "cached token invalidated");
    }

    /// Returns the currently cached credential, if any, without refreshing.
    pub async fn current(&self) -> Option<Credential> {
        self.inner.current.read().await.clone()
    }
}

impl Inner {
    /// Fast-path read: the cached credential if it is still comfortably alive.
    async fn fresh(&self) -> Option<Credential> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|cred| cred.remaining() > self.config.buffer)
            .cloned()
    }

    /// On-demand refresh: re-checks freshness inside the lock so concurrent
    /// callers that raced past the fast path share one fetch.
    async fn refresh_if_stale(inner: &Arc<Self>) -> Result<Credential, AuthError> {
        let _guard = inner.refresh_lock.lock().await;
        if let Some(cred) = inner.fresh().await {
            return Ok(cred);
        }
        let (credential, renew_in) = inner.fetch_and_store().await?;
        inner.schedule_renewal(renew_in).await;
        Ok(credential)
    }

    /// Proactive refresh driven by the renewal loop: always fetches, never
    /// propagates. Returns the delay until the loop's next wakeup.
    async fn refresh_forced(inner: &Arc<Self>) -> Duration {
        let _guard = inner.refresh_lock.lock().await;
        match inner.fetch_and_store().await {
            Ok((_, renew_in)) => renew_in,
            Err(err) => {
                tracing::warn!(
                    domain = inner.label,
                    error = %err,
                    retry_in_secs = inner.config.retry_backoff.as_secs(),
                    "scheduled token renewal failed, will retry"
                );
                inner.config.retry_backoff
            }
        }
    }

    /// Fetches and stores a credential, returning it together with the
    /// delay until the next proactive renewal. Caller must hold
    /// `refresh_lock`.
    async fn fetch_and_store(&self) -> Result<(Credential, Duration), AuthError> {
        let token = self.fetcher.fetch().await?;
        let now = OffsetDateTime::now_utc();

        let (issued_at, ttl) = match codec::lifetime(&token) {
            Some((iat, exp)) => {
                let ttl = Duration::from_secs_f64((exp - iat).as_seconds_f64());
                (iat, ttl)
            }
            None => {
                tracing::debug!(
                    domain = self.label,
                    default_ttl_secs = self.config.default_ttl.as_secs(),
                    "token carries no usable lifetime claims, assuming default"
                );
                (now, self.config.default_ttl)
            }
        };

        let credential = Credential {
            token,
            issued_at,
            expires_at: now + ttl,
        };
        *self.current.write().await = Some(credential.clone());

        let renew_in = renew_delay(ttl, self.config.buffer, self.config.min_renew_interval);
        tracing::info!(
            domain = self.label,
            ttl_secs = ttl.as_secs(),
            renew_in_secs = renew_in.as_secs(),
            "token refreshed"
        );
        Ok((credential, renew_in))
    }

    /// Cancel-then-replace scheduling of the renewal loop.
    async fn schedule_renewal(self: &Arc<Self>, delay: Duration) {
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(renewal_loop(weak, delay));

        let mut slot = self.renewal.lock().await;
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }
}

/// Body of the renewal task: one loop per schedule, so retries after a
/// failed refresh never spawn further tasks. A flapping upstream keeps the
/// loop alive at the retry cadence; an on-demand refresh replaces the whole
/// loop via `schedule_renewal`.
async fn renewal_loop(weak: Weak<Inner>, initial_delay: Duration) {
    let mut delay = initial_delay;
    loop {
        tokio::time::sleep(delay).await;
        let Some(inner) = weak.upgrade() else {
            return;
        };
        delay = Inner::refresh_forced(&inner).await;
    }
}

/// Delay until the next proactive renewal: `max(ttl - buffer, min_interval)`.
fn renew_delay(ttl: Duration, buffer: Duration, min_interval: Duration) -> Duration {
    ttl.saturating_sub(buffer).max(min_interval)
}
