//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<lifthub_ws::WsError>),

    #[error("HTTP error: {0}")]
    Http(#[from] lifthub_http::HttpError),

    #[error("Hub error: {0}")]
    Hub(#[from] lifthub_hub::HubError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] lifthub_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
