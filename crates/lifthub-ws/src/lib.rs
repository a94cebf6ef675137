//! WebSocket client for the scoring-engine connection.
//!
//! Provides the hub's single upstream link with:
//! - Automatic reconnection with bounded exponential backoff
//! - Bootstrap snapshot request before steady-state updates
//! - Heartbeat monitoring
//! - Frame decoding into the tagged engine message union
//! - Idempotent force-close to trigger a full resync

pub mod connection;
pub mod error;
pub mod heartbeat;
pub mod message;

pub use connection::{ConnectionConfig, ConnectionManager, ConnectionState, EngineEvent};
pub use error::{WsError, WsResult};
pub use heartbeat::{HeartbeatManager, HeartbeatStats};
pub use message::{decode_frame, EngineMessage, REQUEST_SNAPSHOT_FRAME};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any WebSocket connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
