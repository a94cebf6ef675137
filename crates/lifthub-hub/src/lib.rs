//! The competition hub.
//!
//! Single process-wide authority over competition state: it owns the
//! upstream connection, applies snapshot and per-platform updates to the
//! state store, sweeps the plugin cache registry on resync and config
//! changes, and exposes the read API every plugin and HTTP handler uses.

pub mod config_bundle;
pub mod error;
pub mod hub;

pub use config_bundle::{ConfigAck, ConfigBundle};
pub use error::{ConfigError, HubError, HubResult};
pub use hub::{CompetitionHub, FopSummary, HubNotice, HubSubscription, RefreshOutcome};
