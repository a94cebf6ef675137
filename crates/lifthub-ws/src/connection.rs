//! WebSocket connection manager.
//!
//! Owns the single logical upstream connection to the scoring engine.
//! Handles the connection lifecycle, automatic reconnection with bounded
//! exponential backoff, the bootstrap snapshot request, and decoding of
//! inbound frames into engine events.

use crate::error::{WsError, WsResult};
use crate::heartbeat::HeartbeatManager;
use crate::message::{decode_frame, EngineMessage, REQUEST_SNAPSHOT_FRAME};
use futures_util::{SinkExt, StreamExt};
use lifthub_telemetry::Metrics;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async_tls_with_config, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Scoring engine WebSocket URL.
    pub url: String,
    /// Maximum reconnection attempts (0 = infinite).
    ///
    /// The engine is the sole source of truth and may return at any time,
    /// so production deployments leave this at 0.
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential backoff.
    pub reconnect_base_delay_ms: u64,
    /// Maximum delay for exponential backoff.
    pub reconnect_max_delay_ms: u64,
    /// Heartbeat interval.
    pub heartbeat_interval_ms: u64,
    /// Heartbeat timeout (pong must arrive within this).
    pub heartbeat_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_reconnect_attempts: 0, // Infinite
            reconnect_base_delay_ms: 1000,
            reconnect_max_delay_ms: 30_000,
            heartbeat_interval_ms: 30_000,
            heartbeat_timeout_ms: 10_000,
        }
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Event forwarded from the connection to the hub.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Transport established; a bootstrap snapshot request has been sent.
    Connected,
    /// Transport lost; the manager will retry on its own.
    Disconnected,
    /// A successfully decoded engine message.
    Message(EngineMessage),
}

/// Upstream connection manager.
pub struct ConnectionManager {
    config: ConnectionConfig,
    state: Arc<RwLock<ConnectionState>>,
    heartbeat: Arc<HeartbeatManager>,
    event_tx: mpsc::Sender<EngineEvent>,
    reconnect_count: Arc<RwLock<u32>>,
    /// Cancellation token scoped to the current connection; replaced on each
    /// reconnect. `force_close` cancels it without touching the retry loop.
    close_token: Arc<RwLock<Option<CancellationToken>>>,
    /// Cancellation token for process shutdown.
    shutdown_token: CancellationToken,
}

impl ConnectionManager {
    /// Create a new connection manager.
    pub fn new(config: ConnectionConfig, event_tx: mpsc::Sender<EngineEvent>) -> Self {
        let heartbeat = Arc::new(HeartbeatManager::new(
            config.heartbeat_interval_ms,
            config.heartbeat_timeout_ms,
        ));
        Self {
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            heartbeat,
            event_tx,
            reconnect_count: Arc::new(RwLock::new(0)),
            close_token: Arc::new(RwLock::new(None)),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Get current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Whether the transport is currently up.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Number of reconnect attempts since the last successful connection.
    pub fn reconnect_count(&self) -> u32 {
        *self.reconnect_count.read()
    }

    /// Force-close the current connection to trigger a reconnect-driven
    /// full resync.
    ///
    /// Idempotent: returns `false` when there is no connection to close,
    /// `true` when a live connection was asked to shut down. Never errors.
    pub fn force_close(&self) -> bool {
        let token = self.close_token.write().take();
        match token {
            Some(token) if self.is_connected() => {
                info!("Force-closing engine connection for full resync");
                token.cancel();
                true
            }
            _ => {
                info!("Force-close requested but no connection to close");
                false
            }
        }
    }

    /// Signal graceful shutdown. The message loop and any backoff sleep
    /// exit promptly.
    pub fn shutdown(&self) {
        info!("ConnectionManager shutdown requested");
        self.shutdown_token.cancel();
    }

    /// Check if shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Connect to the engine and run the message loop, reconnecting until
    /// shutdown (or until the attempt limit, when one is configured).
    pub async fn connect(&self) -> WsResult<()> {
        let mut attempt = 0u32;

        loop {
            if self.is_shutdown() {
                info!("Shutdown requested, exiting connect loop");
                *self.state.write() = ConnectionState::Disconnected;
                return Ok(());
            }

            *self.state.write() = ConnectionState::Connecting;

            match self.try_connect().await {
                Ok(()) => {
                    info!("Engine connection closed");
                    // Closed cooperatively (force-close or server close);
                    // resync from scratch without accumulated backoff.
                    attempt = 0;
                }
                Err(e) => {
                    error!(?e, "Engine connection error");
                }
            }

            Metrics::engine_disconnected();
            if self.event_tx.send(EngineEvent::Disconnected).await.is_err() {
                warn!("Event receiver dropped, stopping connection manager");
                *self.state.write() = ConnectionState::Disconnected;
                return Ok(());
            }

            if self.is_shutdown() {
                info!("Shutdown requested after disconnect, not reconnecting");
                *self.state.write() = ConnectionState::Disconnected;
                return Ok(());
            }

            attempt += 1;
            *self.reconnect_count.write() = attempt;
            Metrics::engine_reconnect("disconnect");

            if self.config.max_reconnect_attempts > 0
                && attempt >= self.config.max_reconnect_attempts
            {
                error!(attempt, "Max reconnection attempts reached");
                *self.state.write() = ConnectionState::Disconnected;
                return Err(WsError::ConnectionFailed(
                    "Max reconnection attempts reached".to_string(),
                ));
            }

            *self.state.write() = ConnectionState::Reconnecting;

            let delay = self.calculate_backoff_delay(attempt);
            warn!(attempt, delay_ms = delay.as_millis(), "Reconnecting to engine");

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown requested during backoff, exiting");
                    *self.state.write() = ConnectionState::Disconnected;
                    return Ok(());
                }
            }
        }
    }

    async fn try_connect(&self) -> WsResult<()> {
        info!(url = %self.config.url, "Connecting to scoring engine");

        let (ws_stream, _response) =
            connect_async_tls_with_config(&self.config.url, None, true, None).await?;
        let (mut write, mut read) = ws_stream.split();

        *self.state.write() = ConnectionState::Connected;
        *self.reconnect_count.write() = 0;
        Metrics::engine_connected();
        info!("Engine connected");

        // Fresh per-connection close token for force_close.
        let close_token = CancellationToken::new();
        *self.close_token.write() = Some(close_token.clone());

        // Bootstrap ordering: request the full snapshot before accepting
        // incremental updates.
        write
            .send(Message::Text(REQUEST_SNAPSHOT_FRAME.to_string().into()))
            .await?;
        debug!("Bootstrap snapshot request sent");

        self.heartbeat.reset();

        if self.event_tx.send(EngineEvent::Connected).await.is_err() {
            warn!("Event receiver dropped");
            *self.state.write() = ConnectionState::Disconnected;
            return Ok(());
        }

        // Message loop
        loop {
            tokio::select! {
                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received in message loop");
                    if let Err(e) = write.send(Message::Close(None)).await {
                        warn!(?e, "Failed to send Close frame during shutdown");
                    }
                    *self.state.write() = ConnectionState::Disconnected;
                    return Ok(());
                }

                () = close_token.cancelled() => {
                    info!("Force-close requested, closing engine connection");
                    if let Err(e) = write.send(Message::Close(None)).await {
                        warn!(?e, "Failed to send Close frame during force-close");
                    }
                    *self.state.write() = ConnectionState::Disconnected;
                    return Ok(());
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_text_frame(&text).await;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            debug!("Received ping, sending pong");
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            self.heartbeat.record_pong();
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (f.code.into(), f.reason.to_string()))
                                .unwrap_or((1000, "Normal close".to_string()));
                            warn!(code, %reason, "Engine closed the connection");
                            return Err(WsError::ConnectionClosed { code, reason });
                        }
                        Some(Err(e)) => {
                            error!(?e, "Engine read error");
                            return Err(e.into());
                        }
                        None => {
                            warn!("Engine stream ended");
                            return Ok(());
                        }
                        _ => {}
                    }
                }

                _ = self.heartbeat.wait_for_check() => {
                    if self.heartbeat.is_timed_out() {
                        error!("Engine heartbeat timeout");
                        return Err(WsError::HeartbeatTimeout);
                    }

                    if self.heartbeat.should_send_ping() {
                        write.send(Message::Ping(Vec::new().into())).await?;
                        self.heartbeat.record_ping();
                        debug!("Sent heartbeat ping");
                    }
                }
            }
        }
    }

    /// Decode one text frame and forward it. A frame that fails to decode
    /// is logged and dropped; it never crashes the connection.
    async fn handle_text_frame(&self, text: &str) {
        self.heartbeat.record_message();

        let message = match decode_frame(text) {
            Ok(message) => message,
            Err(e) => {
                Metrics::decode_failure();
                warn!(?e, frame = %truncate_for_log(text), "Dropping undecodable frame");
                return;
            }
        };

        Metrics::message_received(message.kind());

        if self
            .event_tx
            .send(EngineEvent::Message(message))
            .await
            .is_err()
        {
            warn!("Event receiver dropped");
        }
    }

    fn calculate_backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.config.reconnect_base_delay_ms;
        let max = self.config.reconnect_max_delay_ms;

        // Exponential backoff: base * 2^(attempt-1), capped at max.
        let exponent = attempt.saturating_sub(1).min(10);
        let delay = base.saturating_mul(1u64 << exponent);
        let delay = delay.min(max);

        // Add jitter (0-1000ms)
        Duration::from_millis(delay + rand_jitter())
    }
}

/// Generate random jitter (0-1000ms).
fn rand_jitter() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 1000) as u64
}

fn truncate_for_log(text: &str) -> &str {
    let max = 200;
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
