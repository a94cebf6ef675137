//! Axum router and handlers.

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use lifthub_hub::CompetitionHub;
use lifthub_telemetry::{classify_health, memory_stats, HealthInputs};

use crate::config::HttpConfig;
use crate::error::{HttpError, HttpResult};
use crate::types::{
    ApiError, CompetitionHealth, HealthResponse, RefreshResponse, StateSummary, TranslationsHealth,
};

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    hub: Arc<CompetitionHub>,
    started_at: Instant,
}

impl AppState {
    pub fn new(hub: Arc<CompetitionHub>) -> Self {
        Self {
            hub,
            started_at: Instant::now(),
        }
    }
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/refresh", get(get_state_summary).post(post_refresh))
        .route("/config", post(post_config))
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// Convert a handler panic into the stable `internal_error` JSON body
/// instead of tearing down the connection with an empty 500.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    };
    error!(%message, "Handler panicked");
    ApiError::internal_error(message).into_response()
}

/// Health check: full JSON body, 200 only when healthy.
async fn get_health(State(state): State<AppState>) -> Response {
    let response = collect_health(&state, false);
    (response.http_status(), Json(response)).into_response()
}

fn collect_health(state: &AppState, check_failed: bool) -> HealthResponse {
    let hub = &state.hub;
    let memory = memory_stats();

    let snapshot = hub.database_state();
    let athletes_count = snapshot.as_ref().map(|s| s.athletes_count()).unwrap_or(0);
    let fops = hub.available_fops();
    let locales = hub.available_locales();

    let report = classify_health(&HealthInputs {
        memory,
        database_loaded: hub.database_loaded(),
        locales_count: locales.len(),
        prior_issues: Vec::new(),
        check_failed,
    });

    HealthResponse {
        status: report.status,
        uptime_seconds: state.started_at.elapsed().as_secs(),
        memory,
        competition: CompetitionHealth {
            database_loaded: hub.database_loaded(),
            athletes_count,
            fops_count: fops.len(),
            fops,
        },
        translations: TranslationsHealth {
            locales_count: locales.len(),
            locales,
        },
        metrics: hub.metrics(),
        issues: if report.issues.is_empty() {
            None
        } else {
            Some(report.issues)
        },
        alive: report.status != lifthub_telemetry::HealthStatus::Error,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RefreshParams {
    full_refresh: bool,
}

/// Clear plugin caches; with `fullRefresh` also force the upstream
/// connection closed so the engine resends everything.
async fn post_refresh(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
    body: Bytes,
) -> Json<RefreshResponse> {
    // The flag is accepted from the query string or a JSON body.
    let mut full = params.full_refresh;
    if !body.is_empty() {
        match serde_json::from_slice::<RefreshParams>(&body) {
            Ok(parsed) => full = full || parsed.full_refresh,
            Err(e) => warn!(error = %e, "Ignoring malformed refresh body"),
        }
    }

    let outcome = state.hub.refresh(full);
    Json(RefreshResponse {
        success: true,
        caches_cleared: outcome.caches_cleared,
        connection_closed: outcome.connection_closed,
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Hub state summary and metrics.
async fn get_state_summary(State(state): State<AppState>) -> Json<StateSummary> {
    let hub = &state.hub;
    let athletes_count = hub
        .database_state()
        .map(|s| s.athletes_count())
        .unwrap_or(0);

    Json(StateSummary {
        connected: hub.is_connected(),
        learning_mode: hub.learning_mode(),
        database_loaded: hub.database_loaded(),
        athletes_count,
        fops: hub.fop_summaries(),
        locales: hub.available_locales(),
        metrics: hub.metrics(),
    })
}

/// Accept a pushed configuration bundle.
async fn post_config(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return ApiError::config_error(format!("request body is not valid JSON: {e}"))
                .into_response()
        }
    };

    match state.hub.handle_config(payload) {
        Ok(ack) => Json(ack).into_response(),
        Err(e) => {
            warn!(error = %e, "Config bundle rejected");
            ApiError::config_error(e.to_string()).into_response()
        }
    }
}

/// Run the HTTP server until the shutdown token fires.
pub async fn run_server(
    hub: Arc<CompetitionHub>,
    config: HttpConfig,
    shutdown: CancellationToken,
) -> HttpResult<()> {
    let app = create_router(AppState::new(hub));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|_| HttpError::InvalidAddr(format!("{}:{}", config.host, config.port)))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| HttpError::Bind { addr, source })?;

    info!(%addr, "HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use lifthub_core::{Athlete, CompetitionSnapshot};
    use lifthub_state::{CacheRegistry, StateStore};
    use lifthub_ws::{ConnectionConfig, ConnectionManager, EngineEvent, EngineMessage};
    use serde_json::{json, Value};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    fn test_hub(learning_mode: bool) -> Arc<CompetitionHub> {
        let (event_tx, _event_rx) = mpsc::channel(16);
        let connection = Arc::new(ConnectionManager::new(
            ConnectionConfig::default(),
            event_tx,
        ));
        Arc::new(CompetitionHub::new(
            Arc::new(StateStore::new()),
            Arc::new(CacheRegistry::new()),
            connection,
            learning_mode,
        ))
    }

    fn loaded_hub() -> Arc<CompetitionHub> {
        let hub = test_hub(false);
        let mut snapshot = CompetitionSnapshot::default();
        snapshot.athletes = vec![Athlete::default(); 40];
        hub.handle_event(EngineEvent::Message(EngineMessage::Snapshot(snapshot)));
        hub.handle_config(json!({"translations": {"en": {}}}))
            .unwrap();
        hub
    }

    fn router(hub: Arc<CompetitionHub>) -> Router {
        create_router(AppState::new(hub))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_degraded_without_database() {
        let response = router(test_hub(false))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["alive"], true);
        assert_eq!(body["competition"]["databaseLoaded"], false);
        assert!(body["issues"].as_array().is_some_and(|i| !i.is_empty()));
    }

    #[tokio::test]
    async fn test_health_ok_with_database_and_locales() {
        let response = router(loaded_hub())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert!(body["uptime"].is_u64());
        assert!(body.get("uptimeSeconds").is_none());
        assert_eq!(body["competition"]["athletesCount"], 40);
        assert_eq!(body["translations"]["locales"], json!(["en"]));
        assert!(body["issues"].is_null());
    }

    #[tokio::test]
    async fn test_health_error_when_check_fails() {
        let hub = loaded_hub();
        let response = collect_health(&AppState::new(hub), true);
        assert_eq!(response.http_status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!response.alive);
    }

    #[tokio::test]
    async fn test_post_refresh_without_connection() {
        let response = router(test_hub(false))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/refresh?fullRefresh=true")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        // No live connection, so nothing got closed.
        assert_eq!(body["connectionClosed"], false);
    }

    #[tokio::test]
    async fn test_post_refresh_flag_via_body() {
        let response = router(test_hub(false))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/refresh")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"fullRefresh": true}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["connectionClosed"], false);
    }

    #[tokio::test]
    async fn test_state_summary() {
        let response = router(test_hub(true))
            .oneshot(Request::builder().uri("/refresh").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["connected"], false);
        assert_eq!(body["learningMode"], true);
        assert_eq!(body["fops"], json!([]));
    }

    #[tokio::test]
    async fn test_panicking_handler_maps_to_internal_error() {
        async fn boom() {
            panic!("boom")
        }
        let app = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(handle_panic));

        let response = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "internal_error");
        assert_eq!(body["message"], "boom");
    }

    #[tokio::test]
    async fn test_post_config_accept_and_reject() {
        let app = router(test_hub(false));

        let ok = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/config")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"translations": {"en": {}, "da": {}}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        let body = body_json(ok).await;
        assert_eq!(body["success"], true);

        let rejected = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/config")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#""not an object""#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(rejected.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(rejected).await;
        assert_eq!(body["error"], "config_error");
        assert!(body["message"].as_str().is_some());
    }
}
