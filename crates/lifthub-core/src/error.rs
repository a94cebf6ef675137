//! Error types for lifthub-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
