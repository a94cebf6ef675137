//! Prometheus metrics for the competition hub.
//!
//! Counts messages received from the engine, messages broadcast to
//! consumers, and currently-active consumer connections. Counters are
//! monotonic for the process lifetime; the only reset is a process restart.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent failure.
//! These panics only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter, IntCounterVec,
    IntGauge,
};
use serde::Serialize;

/// Known inbound message kinds, used to total the per-kind counter.
const MESSAGE_KINDS: [&str; 3] = ["snapshot", "update", "config"];

/// Total messages received from the scoring engine, by kind.
pub static MESSAGES_RECEIVED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "lifthub_messages_received_total",
        "Total messages received from the scoring engine",
        &["kind"]
    )
    .unwrap()
});

/// Total messages broadcast to consumers.
pub static MESSAGES_BROADCAST_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "lifthub_messages_broadcast_total",
        "Total messages broadcast to scoreboard consumers"
    )
    .unwrap()
});

/// Currently-active consumer connections.
pub static ACTIVE_CLIENTS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "lifthub_active_clients",
        "Currently-active scoreboard consumer connections"
    )
    .unwrap()
});

/// Engine connection state (1 = connected, 0 = disconnected).
pub static ENGINE_CONNECTED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "lifthub_engine_connected",
        "Scoring-engine connection state (1=connected)"
    )
    .unwrap()
});

/// Total reconnection attempts, by reason.
pub static ENGINE_RECONNECT_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "lifthub_engine_reconnect_total",
        "Total engine reconnection attempts",
        &["reason"]
    )
    .unwrap()
});

/// Total inbound frames dropped because they failed to decode.
pub static DECODE_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "lifthub_decode_failures_total",
        "Total inbound frames dropped at the decode boundary"
    )
    .unwrap()
});

/// Total cache invalidation sweeps.
pub static CACHE_INVALIDATIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "lifthub_cache_invalidations_total",
        "Total clear-all sweeps over registered plugin caches"
    )
    .unwrap()
});

/// Point-in-time counter values, served on the health/refresh endpoints.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub active_clients: i64,
    pub messages_received: u64,
    pub messages_broadcast: u64,
}

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record engine connected.
    pub fn engine_connected() {
        ENGINE_CONNECTED.set(1);
    }

    /// Record engine disconnected.
    pub fn engine_disconnected() {
        ENGINE_CONNECTED.set(0);
    }

    /// Record an engine reconnection attempt.
    pub fn engine_reconnect(reason: &str) {
        ENGINE_RECONNECT_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record a message received from the engine.
    pub fn message_received(kind: &str) {
        MESSAGES_RECEIVED_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record a message broadcast to consumers.
    pub fn message_broadcast() {
        MESSAGES_BROADCAST_TOTAL.inc();
    }

    /// Record an undecodable frame.
    pub fn decode_failure() {
        DECODE_FAILURES_TOTAL.inc();
    }

    /// Record a consumer connection opened.
    pub fn client_connected() {
        ACTIVE_CLIENTS.inc();
    }

    /// Record a consumer connection closed.
    pub fn client_disconnected() {
        ACTIVE_CLIENTS.dec();
    }

    /// Record a clear-all sweep over the cache registry.
    pub fn cache_invalidation() {
        CACHE_INVALIDATIONS_TOTAL.inc();
    }

    /// Read back the counters for the JSON health/metrics surface.
    pub fn snapshot() -> MetricsSnapshot {
        let messages_received = MESSAGE_KINDS
            .iter()
            .map(|kind| MESSAGES_RECEIVED_TOTAL.with_label_values(&[kind]).get())
            .sum();

        MetricsSnapshot {
            active_clients: ACTIVE_CLIENTS.get(),
            messages_received,
            messages_broadcast: MESSAGES_BROADCAST_TOTAL.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_monotonic() {
        let before = Metrics::snapshot();

        Metrics::message_received("snapshot");
        Metrics::message_received("update");
        Metrics::message_broadcast();

        let after = Metrics::snapshot();
        assert_eq!(after.messages_received, before.messages_received + 2);
        assert_eq!(after.messages_broadcast, before.messages_broadcast + 1);
    }

    #[test]
    fn test_active_clients_gauge() {
        let before = Metrics::snapshot().active_clients;

        Metrics::client_connected();
        Metrics::client_connected();
        assert_eq!(Metrics::snapshot().active_clients, before + 2);

        Metrics::client_disconnected();
        assert_eq!(Metrics::snapshot().active_clients, before + 1);

        Metrics::client_disconnected();
    }
}
