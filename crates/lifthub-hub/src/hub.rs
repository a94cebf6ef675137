//! The competition hub and its query API.
//!
//! One hub instance exists per process. All mutations flow through
//! `handle_event` (driven by the connection manager's event channel) or
//! through `refresh`/`handle_config`; no other component may touch the
//! store or the registry directly. Every read returns a value consistent
//! with some committed state and never blocks on network I/O.

use crate::config_bundle::{ConfigAck, ConfigBundle};
use crate::error::ConfigError;
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

use lifthub_core::{CompetitionSnapshot, FopUpdate, ScoreboardData, SessionStatus};
use lifthub_state::{CacheClearOutcome, CacheRegistry, Clearable, StateStore};
use lifthub_telemetry::{Metrics, MetricsSnapshot};
use lifthub_ws::{ConnectionManager, EngineEvent, EngineMessage};

/// Change notification pushed to subscribed consumers.
#[derive(Debug, Clone)]
pub enum HubNotice {
    /// A full resync replaced the snapshot (caches already invalidated).
    SnapshotReplaced,
    /// A platform got a fresh update.
    FopUpdated(String),
    /// An accepted configuration bundle changed hub-wide settings.
    ConfigChanged,
}

/// A consumer subscription to hub notifications.
///
/// Holding one counts toward the active-clients gauge; dropping it counts
/// back down.
pub struct HubSubscription {
    rx: broadcast::Receiver<HubNotice>,
    _guard: ClientGuard,
}

impl HubSubscription {
    /// Receive the next notice. Lagged consumers skip ahead rather than
    /// stall the hub.
    pub async fn recv(&mut self) -> Option<HubNotice> {
        loop {
            match self.rx.recv().await {
                Ok(notice) => return Some(notice),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Hub consumer lagged, catching up");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

struct ClientGuard;

impl ClientGuard {
    fn new() -> Self {
        Metrics::client_connected();
        Self
    }
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        Metrics::client_disconnected();
    }
}

/// Result of a refresh request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    /// Per-cache clear outcomes.
    pub caches_cleared: Vec<CacheClearOutcome>,
    /// Whether a live upstream connection was actually closed.
    pub connection_closed: bool,
}

/// Per-platform summary line for the state overview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FopSummary {
    pub name: String,
    pub fop_state: String,
    pub group: Option<String>,
    pub last_update_ms: i64,
    pub age_ms: i64,
}

/// The process-wide competition hub.
pub struct CompetitionHub {
    store: Arc<StateStore>,
    registry: Arc<CacheRegistry>,
    connection: Arc<ConnectionManager>,
    notice_tx: broadcast::Sender<HubNotice>,
    /// Set once a snapshot has been applied (and caches invalidated) on the
    /// current connection. The hub only reports itself connected after the
    /// resync completed, so no reader observes "reconnected" with stale
    /// cached projections.
    resynced: AtomicBool,
    learning_mode: bool,
}

impl CompetitionHub {
    /// Create a hub over its collaborators.
    pub fn new(
        store: Arc<StateStore>,
        registry: Arc<CacheRegistry>,
        connection: Arc<ConnectionManager>,
        learning_mode: bool,
    ) -> Self {
        let (notice_tx, _) = broadcast::channel(64);
        Self {
            store,
            registry,
            connection,
            notice_tx,
            resynced: AtomicBool::new(false),
            learning_mode,
        }
    }

    // ========================================================================
    // Query API
    // ========================================================================

    /// Latest competition snapshot, if one has loaded.
    pub fn database_state(&self) -> Option<Arc<CompetitionSnapshot>> {
        self.store.snapshot()
    }

    /// Latest update for a platform.
    pub fn fop_update(&self, fop: &str) -> Option<FopUpdate> {
        self.store.fop_update(fop)
    }

    /// Derived session status for a platform.
    pub fn session_status(&self, fop: &str) -> SessionStatus {
        let update = self.store.fop_update(fop);
        lifthub_core::session_status(update.as_ref())
    }

    /// Consumer-facing current-attempt projection for a platform.
    pub fn scoreboard_data(&self, fop: &str) -> ScoreboardData {
        let update = self.store.fop_update(fop);
        lifthub_core::current_attempt(update.as_ref())
    }

    /// Known platform names.
    pub fn available_fops(&self) -> Vec<String> {
        self.store.fop_names()
    }

    /// Available translation locales.
    pub fn available_locales(&self) -> Vec<String> {
        self.store.locales()
    }

    /// Current counter values.
    pub fn metrics(&self) -> MetricsSnapshot {
        Metrics::snapshot()
    }

    /// Whether the hub is connected *and* resynced against the current
    /// connection.
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected() && self.resynced.load(Ordering::Acquire)
    }

    /// Whether the reduced-feature learning mode is enabled.
    pub fn learning_mode(&self) -> bool {
        self.learning_mode
    }

    /// Whether a snapshot with data has ever loaded.
    pub fn database_loaded(&self) -> bool {
        self.store.database_loaded()
    }

    /// Number of registered plugin caches.
    pub fn registered_caches(&self) -> usize {
        self.registry.len()
    }

    /// Per-platform summary lines for the state overview.
    pub fn fop_summaries(&self) -> Vec<FopSummary> {
        let now_ms = Utc::now().timestamp_millis();
        self.store
            .fop_names()
            .into_iter()
            .filter_map(|name| self.store.fop_update(&name))
            .map(|u| FopSummary {
                name: u.fop.clone(),
                fop_state: u.fop_state.to_string(),
                group: u.group.clone(),
                last_update_ms: u.last_update_ms,
                age_ms: u.age_ms(now_ms),
            })
            .collect()
    }

    // ========================================================================
    // Coordination
    // ========================================================================

    /// Register a plugin cache for invalidation sweeps.
    pub fn register_cache(&self, cache: Arc<dyn Clearable>) {
        self.registry.register(cache);
    }

    /// Subscribe to hub change notices.
    pub fn subscribe(&self) -> HubSubscription {
        HubSubscription {
            rx: self.notice_tx.subscribe(),
            _guard: ClientGuard::new(),
        }
    }

    /// Clear plugin caches and optionally force a reconnect-driven full
    /// resync.
    pub fn refresh(&self, full: bool) -> RefreshOutcome {
        info!(full, "Refresh requested");
        let caches_cleared = self.invalidate_caches();

        let connection_closed = if full {
            // Closing the connection makes the engine resend everything on
            // reconnect; readers see `is_connected` false until the new
            // snapshot has been applied.
            self.resynced.store(false, Ordering::Release);
            self.connection.force_close()
        } else {
            false
        };

        RefreshOutcome {
            caches_cleared,
            connection_closed,
        }
    }

    /// Accept or reject a pushed configuration bundle.
    ///
    /// On accept: locales installed (when present), every plugin cache
    /// invalidated, consumers notified. On reject: committed state untouched.
    pub fn handle_config(&self, payload: serde_json::Value) -> Result<ConfigAck, ConfigError> {
        let bundle = ConfigBundle::parse(payload)?;

        if bundle.has_translations() {
            self.store.set_locales(bundle.locales.clone());
        }
        self.invalidate_caches();
        self.broadcast(HubNotice::ConfigChanged);

        let message = if bundle.has_translations() {
            format!("configuration accepted, {} locales installed", bundle.locales.len())
        } else {
            "configuration accepted".to_string()
        };
        info!(%message, "Config bundle applied");
        Ok(ConfigAck::accepted(message))
    }

    /// Drive the hub from the connection manager's event channel until it
    /// closes.
    pub async fn run(&self, mut events: mpsc::Receiver<EngineEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }
        info!("Engine event channel closed, hub loop exiting");
    }

    /// Apply one engine event. Each event is one atomic state transition.
    pub fn handle_event(&self, event: EngineEvent) {
        match event {
            EngineEvent::Connected => {
                // Not resynced until the bootstrap snapshot arrives.
                self.resynced.store(false, Ordering::Release);
            }
            EngineEvent::Disconnected => {
                self.resynced.store(false, Ordering::Release);
            }
            EngineEvent::Message(EngineMessage::Snapshot(snapshot)) => {
                self.store.apply_snapshot(snapshot);
                // Resync ordering: caches must be clean before the hub
                // reports the new epoch as connected.
                self.invalidate_caches();
                self.resynced.store(true, Ordering::Release);
                self.broadcast(HubNotice::SnapshotReplaced);
            }
            EngineEvent::Message(EngineMessage::Update(update)) => {
                let fop = update.fop.clone();
                self.store.apply_fop_update(update);
                self.broadcast(HubNotice::FopUpdated(fop));
            }
            EngineEvent::Message(EngineMessage::Config(payload)) => {
                if let Err(e) = self.handle_config(payload) {
                    error!(?e, "Engine-pushed config bundle rejected");
                }
            }
        }
    }

    fn invalidate_caches(&self) -> Vec<CacheClearOutcome> {
        Metrics::cache_invalidation();
        self.registry.invalidate_all()
    }

    fn broadcast(&self, notice: HubNotice) {
        Metrics::message_broadcast();
        // Send fails only when no consumer is subscribed, which is fine.
        let _ = self.notice_tx.send(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifthub_core::{Athlete, AttemptStatus, FopState};
    use lifthub_state::{CacheKey, PlainCache};
    use lifthub_ws::ConnectionConfig;
    use serde_json::json;

    fn test_hub() -> CompetitionHub {
        let (event_tx, _event_rx) = mpsc::channel(16);
        let connection = Arc::new(ConnectionManager::new(
            ConnectionConfig::default(),
            event_tx,
        ));
        CompetitionHub::new(
            Arc::new(StateStore::new()),
            Arc::new(CacheRegistry::new()),
            connection,
            false,
        )
    }

    fn snapshot_message(athletes: usize) -> EngineEvent {
        let mut snapshot = CompetitionSnapshot::default();
        snapshot.athletes = vec![Athlete::default(); athletes];
        EngineEvent::Message(EngineMessage::Snapshot(snapshot))
    }

    fn update_message(fop: &str, with_current: bool) -> EngineEvent {
        let mut update: FopUpdate = serde_json::from_value(json!({
            "fop": fop,
            "fopState": "ACTIVE",
            "group": "M1"
        }))
        .unwrap();
        if with_current {
            update.current_athlete = Some(Athlete {
                full_name: "DOE John".to_string(),
                requested_weight: Some("151".to_string()),
                ..Default::default()
            });
        }
        EngineEvent::Message(EngineMessage::Update(update))
    }

    #[test]
    fn test_queries_before_any_data_never_panic() {
        let hub = test_hub();

        assert!(hub.database_state().is_none());
        assert!(hub.fop_update("A").is_none());
        assert!(hub.available_fops().is_empty());
        assert!(hub.available_locales().is_empty());
        assert!(!hub.is_connected());

        let data = hub.scoreboard_data("A");
        assert_eq!(data.status, AttemptStatus::Waiting);
        assert!(data.current_attempt.is_none());

        let status = hub.session_status("A");
        assert!(!status.done);
    }

    #[test]
    fn test_snapshot_then_update_scenario() {
        let hub = test_hub();

        hub.handle_event(snapshot_message(40));
        hub.handle_event(update_message("A", true));

        assert_eq!(hub.database_state().unwrap().athletes_count(), 40);

        let data = hub.scoreboard_data("A");
        assert_eq!(data.status, AttemptStatus::Ready);
        let attempt = data.current_attempt.unwrap();
        assert_eq!(attempt.full_name, "DOE John");
        assert_eq!(attempt.requested_weight.as_deref(), Some("151"));
    }

    #[test]
    fn test_resync_invalidates_registered_caches() {
        let hub = test_hub();

        let cache = Arc::new(PlainCache::<String>::new("scoreboard"));
        hub.register_cache(cache.clone());

        let key = CacheKey::new("A", "default");
        cache.put(key.clone(), "stale".to_string());
        assert!(cache.get(&key).is_some());

        hub.handle_event(snapshot_message(10));

        // Pre-resync entries are gone.
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_refresh_without_connection() {
        let hub = test_hub();
        let cache = Arc::new(PlainCache::<String>::new("scoreboard"));
        hub.register_cache(cache.clone());
        cache.put(CacheKey::new("A", "x"), "v".to_string());

        let outcome = hub.refresh(true);
        assert!(!outcome.connection_closed);
        assert_eq!(outcome.caches_cleared.len(), 1);
        assert!(outcome.caches_cleared[0].cleared);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_config_installs_locales_and_clears_caches() {
        let hub = test_hub();
        let cache = Arc::new(PlainCache::<u32>::new("attempts"));
        hub.register_cache(cache.clone());
        cache.put(CacheKey::new("A", "x"), 7);

        let ack = hub
            .handle_config(json!({"translations": {"en": {}, "da": {}}}))
            .unwrap();
        assert!(ack.success);
        assert_eq!(hub.available_locales(), vec!["da", "en"]);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_config_rejection_leaves_state_untouched() {
        let hub = test_hub();
        hub.handle_config(json!({"translations": {"en": {}}})).unwrap();

        let err = hub.handle_config(json!("not an object")).unwrap_err();
        assert!(matches!(err, ConfigError::NotAnObject));
        // Previously committed locales survive the rejection.
        assert_eq!(hub.available_locales(), vec!["en"]);
    }

    #[test]
    fn test_last_write_wins_through_the_hub() {
        let hub = test_hub();

        hub.handle_event(update_message("A", false));
        hub.handle_event(update_message("A", true));

        let update = hub.fop_update("A").unwrap();
        assert!(update.current_athlete.is_some());
        assert_eq!(update.fop_state, FopState::Active);
    }

    #[tokio::test]
    async fn test_subscription_receives_notices() {
        let hub = test_hub();
        let mut sub = hub.subscribe();

        hub.handle_event(update_message("A", false));

        match sub.recv().await {
            Some(HubNotice::FopUpdated(fop)) => assert_eq!(fop, "A"),
            other => panic!("Expected FopUpdated, got {other:?}"),
        }
    }
}
