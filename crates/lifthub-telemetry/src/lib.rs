//! Metrics and structured logging for the lifthub competition hub.
//!
//! Provides:
//! - Prometheus counters for inbound/outbound messages and active consumers
//! - Pure health classification over memory/database/locale state
//! - Structured JSON logging with tracing

pub mod error;
pub mod health;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use health::{classify_health, memory_stats, HealthInputs, HealthReport, HealthStatus, MemoryStats};
pub use logging::init_logging;
pub use metrics::{Metrics, MetricsSnapshot};
