//! Application configuration.

use crate::error::{AppError, AppResult};
use lifthub_http::HttpConfig;
use lifthub_ws::ConnectionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upstream scoring-engine connection settings (`[engine]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Scoring engine WebSocket URL.
    #[serde(default = "default_url")]
    pub url: String,
    /// Maximum reconnection attempts (0 = infinite).
    #[serde(default)]
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential backoff.
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,
    /// Maximum delay for exponential backoff.
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
    /// Heartbeat ping interval.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    /// Heartbeat pong timeout.
    #[serde(default = "default_heartbeat_timeout_ms")]
    pub heartbeat_timeout_ms: u64,
}

fn default_url() -> String {
    "ws://localhost:8095/engine".to_string()
}

fn default_reconnect_base_delay_ms() -> u64 {
    1000
}

fn default_reconnect_max_delay_ms() -> u64 {
    30_000
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

fn default_heartbeat_timeout_ms() -> u64 {
    10_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            max_reconnect_attempts: 0,
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            heartbeat_timeout_ms: default_heartbeat_timeout_ms(),
        }
    }
}

impl From<EngineConfig> for ConnectionConfig {
    fn from(value: EngineConfig) -> Self {
        Self {
            url: value.url,
            max_reconnect_attempts: value.max_reconnect_attempts,
            reconnect_base_delay_ms: value.reconnect_base_delay_ms,
            reconnect_max_delay_ms: value.reconnect_max_delay_ms,
            heartbeat_interval_ms: value.heartbeat_interval_ms,
            heartbeat_timeout_ms: value.heartbeat_timeout_ms,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub http: HttpConfig,
    /// Reduced-feature learning mode, surfaced to consumers untouched.
    #[serde(default)]
    pub learning_mode: bool,
}

impl AppConfig {
    /// Load configuration: file if present, defaults otherwise, then
    /// environment overrides.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var("LIFTHUB_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(&config_path)?
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from a specific file, then apply environment overrides.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        let mut config: Self = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// `LIFTHUB_`-prefixed environment variables beat the file.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("LIFTHUB_ENGINE_URL") {
            self.engine.url = url;
        }
        if let Ok(port) = std::env::var("LIFTHUB_HTTP_PORT") {
            match port.parse() {
                Ok(port) => self.http.port = port,
                Err(_) => tracing::warn!(%port, "Ignoring non-numeric LIFTHUB_HTTP_PORT"),
            }
        }
        if let Ok(flag) = std::env::var("LIFTHUB_LEARNING_MODE") {
            self.learning_mode = parse_bool_flag(&flag);
        }
    }
}

fn parse_bool_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
