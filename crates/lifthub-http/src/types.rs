//! JSON response types for the HTTP endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use lifthub_hub::FopSummary;
use lifthub_state::CacheClearOutcome;
use lifthub_telemetry::{HealthStatus, MemoryStats, MetricsSnapshot};
use serde::Serialize;

/// `GET /health` response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// Seconds since the server started.
    #[serde(rename = "uptime")]
    pub uptime_seconds: u64,
    pub memory: MemoryStats,
    pub competition: CompetitionHealth,
    pub translations: TranslationsHealth,
    pub metrics: MetricsSnapshot,
    /// Null when nothing is wrong.
    pub issues: Option<Vec<String>>,
    /// False only when the health check itself failed.
    pub alive: bool,
}

impl HealthResponse {
    /// HTTP status for this body. Degraded still signals 503 so load
    /// balancers stop routing, even though the process is alive.
    pub fn http_status(&self) -> StatusCode {
        match self.status {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Degraded | HealthStatus::Error => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Competition database block of the health body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionHealth {
    pub database_loaded: bool,
    pub athletes_count: usize,
    pub fops_count: usize,
    pub fops: Vec<String>,
}

/// Translations block of the health body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationsHealth {
    pub locales_count: usize,
    pub locales: Vec<String>,
}

/// `POST /refresh` response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub success: bool,
    pub caches_cleared: Vec<CacheClearOutcome>,
    /// Whether a live upstream connection was actually closed.
    pub connection_closed: bool,
    pub timestamp: String,
}

/// `GET /refresh` response body: the hub state summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSummary {
    pub connected: bool,
    pub learning_mode: bool,
    pub database_loaded: bool,
    pub athletes_count: usize,
    pub fops: Vec<FopSummary>,
    pub locales: Vec<String>,
    pub metrics: MetricsSnapshot,
}

/// Structured JSON error with a stable code. Never carries a stack trace.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub error: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn config_error(message: impl Into<String>) -> Self {
        Self {
            error: "config_error",
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            error: "internal_error",
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}
