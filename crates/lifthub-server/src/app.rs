//! Application orchestration.
//!
//! Builds the hub from its collaborators, spawns the connection manager,
//! the hub event loop and the HTTP server, and tears everything down on
//! ctrl-c.

use crate::config::AppConfig;
use crate::error::AppResult;
use lifthub_hub::CompetitionHub;
use lifthub_state::{CacheRegistry, StateStore};
use lifthub_ws::{ConnectionManager, EngineEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Engine event channel capacity. Updates are small and applied
/// synchronously, so a burst buffer of one scoreboard's worth is plenty.
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Main application.
pub struct Application {
    config: AppConfig,
    hub: Arc<CompetitionHub>,
    connection: Arc<ConnectionManager>,
    event_rx: mpsc::Receiver<EngineEvent>,
    shutdown: CancellationToken,
}

impl Application {
    /// Wire up the hub and its collaborators. Nothing runs yet.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let connection = Arc::new(ConnectionManager::new(
            config.engine.clone().into(),
            event_tx,
        ));
        let hub = Arc::new(CompetitionHub::new(
            Arc::new(StateStore::new()),
            Arc::new(CacheRegistry::new()),
            connection.clone(),
            config.learning_mode,
        ));

        Ok(Self {
            config,
            hub,
            connection,
            event_rx,
            shutdown: CancellationToken::new(),
        })
    }

    /// The hub, for plugin cache registration before `run`.
    pub fn hub(&self) -> Arc<CompetitionHub> {
        self.hub.clone()
    }

    /// Run until ctrl-c.
    pub async fn run(self) -> AppResult<()> {
        info!(
            engine_url = %self.config.engine.url,
            learning_mode = self.config.learning_mode,
            "Starting competition hub"
        );

        // Hub event loop.
        let hub = self.hub.clone();
        let event_rx = self.event_rx;
        let hub_handle = tokio::spawn(async move {
            hub.run(event_rx).await;
        });

        // Upstream connection with its own retry loop.
        let connection = self.connection.clone();
        let ws_handle = tokio::spawn(async move {
            if let Err(e) = connection.connect().await {
                error!(?e, "Engine connection task ended with error");
            }
        });

        // HTTP surface.
        let http_handle = if self.config.http.enabled {
            let hub = self.hub.clone();
            let http_config = self.config.http.clone();
            let token = self.shutdown.clone();
            Some(tokio::spawn(async move {
                if let Err(e) = lifthub_http::run_server(hub, http_config, token).await {
                    error!(?e, "HTTP server ended with error");
                }
            }))
        } else {
            info!("HTTP server disabled by configuration");
            None
        };

        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received");

        // Stop the connection retry loop first so no reconnect races the
        // HTTP teardown.
        self.connection.shutdown();
        self.shutdown.cancel();

        if let Some(handle) = http_handle {
            let _ = handle.await;
        }
        ws_handle.abort();
        hub_handle.abort();

        info!("Competition hub stopped");
        Ok(())
    }
}
