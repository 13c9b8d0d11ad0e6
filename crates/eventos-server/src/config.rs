//! Application configuration.
//!
//! Loaded from an optional TOML file plus `EVENTOS__`-prefixed environment
//! overrides (`EVENTOS__SERVER__PORT=9090`). Every section carries serde
//! defaults; `validate()` is called once at startup and failures abort the
//! process before anything binds.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

use eventos_auth::AuthConfig;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
}

impl AppConfig {
    /// Loads configuration from `path` (optional) and the environment.
    ///
    /// # Errors
    /// Returns an error if the file or an override fails to parse.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder
            .add_source(config::Environment::with_prefix("EVENTOS").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Checks the settings for internal consistency.
    ///
    /// # Errors
    /// Returns a human-readable description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.redis.url.is_empty() {
            return Err("redis.url must be set".into());
        }
        if self.sync.catalog_base_url.is_empty() {
            return Err("sync.catalog_base_url must be set".into());
        }
        self.auth
            .validate()
            .map_err(|e| format!("auth config error: {e}"))
    }

    /// Socket address to bind.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Reconciliation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the external catalog.
    #[serde(default)]
    pub catalog_base_url: String,
    /// Treat an empty remote collection as authoritative (wipe the mirror)
    /// instead of skipping the pass.
    #[serde(default)]
    pub allow_empty_remote: bool,
    /// Attempt one sync pass at startup. The app comes up either way.
    #[serde(default = "default_true")]
    pub startup_sync: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            catalog_base_url: String::new(),
            allow_empty_remote: false,
            startup_sync: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
        }
    }
}

/// Change-notification bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_true() -> bool {
    true
}
