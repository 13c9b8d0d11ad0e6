//! Auth configuration sections.
//!
//! Deserialized as part of the application config; every section has serde
//! defaults so a minimal config file works out of the box.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::TokenCacheConfig;

/// Authentication settings for both credential domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base64-encoded HMAC secret shared by issuer and validator.
    #[serde(default)]
    pub jwt_secret: String,

    /// Lifetime of issued API tokens, in seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// Shared secret the token endpoint requires from callers.
    #[serde(default)]
    pub api_secret: String,

    /// External catalog login settings.
    #[serde(default)]
    pub external: ExternalAuthConfig,

    /// Token cache tuning, shared by both cache instances.
    #[serde(default)]
    pub cache: CacheTuning,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: default_token_ttl_secs(),
            api_secret: String::new(),
            external: ExternalAuthConfig::default(),
            cache: CacheTuning::default(),
        }
    }
}

impl AuthConfig {
    /// Checks the settings for internal consistency.
    ///
    /// # Errors
    /// Returns a human-readable description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret.is_empty() {
            return Err("auth.jwt_secret must be set".into());
        }
        if self.api_secret.is_empty() {
            return Err("auth.api_secret must be set".into());
        }
        if self.token_ttl_secs == 0 {
            return Err("auth.token_ttl_secs must be > 0".into());
        }
        if self.external.base_url.is_empty() {
            return Err("auth.external.base_url must be set".into());
        }
        if self.external.username.is_empty() {
            return Err("auth.external.username must be set".into());
        }
        if self.external.request_timeout_secs == 0 {
            return Err("auth.external.request_timeout_secs must be > 0".into());
        }
        self.cache.validate()
    }

    /// The configured token lifetime.
    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

/// Where and how to log in to the external catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalAuthConfig {
    /// Base URL of the catalog, without a trailing path.
    #[serde(default)]
    pub base_url: String,
    /// Login username.
    #[serde(default)]
    pub username: String,
    /// Login password.
    #[serde(default)]
    pub password: String,
    /// Upper bound on each outbound credential fetch, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ExternalAuthConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ExternalAuthConfig {
    /// The configured per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Token cache tuning knobs, all in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheTuning {
    /// Remaining lifetime below which a token counts as stale.
    #[serde(default = "default_buffer_secs")]
    pub buffer_secs: u64,
    /// Floor on the proactive renewal delay.
    #[serde(default = "default_min_renew_secs")]
    pub min_renew_interval_secs: u64,
    /// Delay before retrying a failed scheduled renewal.
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
    /// Assumed lifetime for tokens without usable claims.
    #[serde(default = "default_fallback_ttl_secs")]
    pub default_ttl_secs: u64,
}

impl Default for CacheTuning {
    fn default() -> Self {
        Self {
            buffer_secs: default_buffer_secs(),
            min_renew_interval_secs: default_min_renew_secs(),
            retry_backoff_secs: default_retry_backoff_secs(),
            default_ttl_secs: default_fallback_ttl_secs(),
        }
    }
}

impl CacheTuning {
    fn validate(&self) -> Result<(), String> {
        if self.min_renew_interval_secs == 0 {
            return Err("auth.cache.min_renew_interval_secs must be > 0".into());
        }
        if self.retry_backoff_secs == 0 {
            return Err("auth.cache.retry_backoff_secs must be > 0".into());
        }
        if self.default_ttl_secs == 0 {
            return Err("auth.cache.default_ttl_secs must be > 0".into());
        }
        Ok(())
    }

    /// Converts the tuning into a [`TokenCacheConfig`].
    #[must_use]
    pub fn to_cache_config(&self) -> TokenCacheConfig {
        TokenCacheConfig::new()
            .with_buffer(Duration::from_secs(self.buffer_secs))
            .with_min_renew_interval(Duration::from_secs(self.min_renew_interval_secs))
            .with_retry_backoff(Duration::from_secs(self.retry_backoff_secs))
            .with_default_ttl(Duration::from_secs(self.default_ttl_secs))
    }
}

fn default_token_ttl_secs() -> u64 {
    86_400
}

fn default_buffer_secs() -> u64 {
    30
}

fn default_min_renew_secs() -> u64 {
    10
}

fn default_retry_backoff_secs() -> u64 {
    60
}

fn default_fallback_ttl_secs() -> u64 {
    86_400
}

fn default_request_timeout_secs() -> u64 {
    10
}
