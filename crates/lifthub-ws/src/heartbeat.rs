//! Heartbeat monitoring for the engine connection.
//!
//! The engine link can sit idle for minutes during breaks, so liveness is
//! checked with protocol-level pings: send a ping when nothing has been
//! heard for the interval, and force a reconnect when the pong does not
//! arrive within the timeout.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::time::Duration;
use tracing::debug;

/// Heartbeat manager for the engine connection.
pub struct HeartbeatManager {
    /// How often to probe an idle connection.
    interval_ms: u64,
    /// How long to wait for a pong.
    timeout_ms: u64,
    last_ping: RwLock<Option<DateTime<Utc>>>,
    last_message: RwLock<DateTime<Utc>>,
    waiting_for_pong: RwLock<bool>,
}

impl HeartbeatManager {
    pub fn new(interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            interval_ms,
            timeout_ms,
            last_ping: RwLock::new(None),
            last_message: RwLock::new(Utc::now()),
            waiting_for_pong: RwLock::new(false),
        }
    }

    /// Reset state, called on every (re)connect.
    pub fn reset(&self) {
        *self.last_ping.write() = None;
        *self.last_message.write() = Utc::now();
        *self.waiting_for_pong.write() = false;
    }

    /// Record that a ping was sent.
    pub fn record_ping(&self) {
        *self.last_ping.write() = Some(Utc::now());
        *self.waiting_for_pong.write() = true;
    }

    /// Record that a pong was received.
    pub fn record_pong(&self) {
        *self.waiting_for_pong.write() = false;

        if let Some(ping_time) = *self.last_ping.read() {
            let rtt_ms = (Utc::now() - ping_time).num_milliseconds();
            debug!(rtt_ms, "Engine pong received");
        }
    }

    /// Record that any frame was received.
    pub fn record_message(&self) {
        *self.last_message.write() = Utc::now();
    }

    /// Whether the outstanding ping has timed out.
    pub fn is_timed_out(&self) -> bool {
        if !*self.waiting_for_pong.read() {
            return false;
        }

        match *self.last_ping.read() {
            Some(ping_time) => {
                (Utc::now() - ping_time).num_milliseconds() > self.timeout_ms as i64
            }
            None => false,
        }
    }

    /// Milliseconds since the last frame.
    pub fn time_since_last_message_ms(&self) -> i64 {
        (Utc::now() - *self.last_message.read()).num_milliseconds()
    }

    /// Whether a ping should be sent now. Never ping while a pong is pending.
    pub fn should_send_ping(&self) -> bool {
        if *self.waiting_for_pong.read() {
            return false;
        }
        self.time_since_last_message_ms() >= self.interval_ms as i64
    }

    /// Sleep until the next liveness check.
    pub async fn wait_for_check(&self) {
        tokio::time::sleep(Duration::from_millis(self.interval_ms / 2)).await;
    }

    /// Observable heartbeat state.
    pub fn stats(&self) -> HeartbeatStats {
        HeartbeatStats {
            waiting_for_pong: *self.waiting_for_pong.read(),
            time_since_last_message_ms: self.time_since_last_message_ms(),
        }
    }
}

/// Heartbeat statistics.
#[derive(Debug, Clone)]
pub struct HeartbeatStats {
    pub waiting_for_pong: bool,
    pub time_since_last_message_ms: i64,
}
