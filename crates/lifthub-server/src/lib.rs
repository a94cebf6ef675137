//! Competition hub server.
//!
//! Wires the upstream connection, state store, cache registry and HTTP
//! surface into one application with a defined start/stop lifecycle.

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::{AppConfig, EngineConfig};
pub use error::{AppError, AppResult};
