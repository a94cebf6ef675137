//! HTTP surface of the hub.
//!
//! Four JSON endpoints for operators and scoreboard plugins: `GET /health`,
//! `GET /refresh`, `POST /refresh`, `POST /config`. CORS is wide open since
//! scoreboard plugins are browser pages served from arbitrary origins.

pub mod config;
pub mod error;
pub mod server;
pub mod types;

pub use config::HttpConfig;
pub use error::{HttpError, HttpResult};
pub use server::{create_router, run_server, AppState};
pub use types::{ApiError, HealthResponse, RefreshResponse, StateSummary};
