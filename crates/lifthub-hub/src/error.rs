//! Hub error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] lifthub_ws::WsError),

    #[error("Config rejected: {0}")]
    Config(#[from] ConfigError),
}

/// Rejection of a pushed configuration bundle.
///
/// Surfaced to HTTP callers with the stable `config_error` code; committed
/// state is never mutated on rejection.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration payload must be a JSON object")]
    NotAnObject,

    #[error("Invalid translations block: {0}")]
    InvalidTranslations(String),
}

pub type HubResult<T> = Result<T, HubError>;
