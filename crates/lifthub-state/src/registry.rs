//! Plugin cache registry.
//!
//! Independently-developed scoreboard plugins each own a cache of computed
//! projections. The hub knows nothing about their key schemes or contents;
//! it only holds a clear-all capability over every registered cache, used on
//! full resync and on configuration changes.

use crate::error::CacheError;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Clear-all capability a plugin cache exposes to the hub.
pub trait Clearable: Send + Sync {
    /// Cache name, used in refresh responses and per-plugin error reports.
    fn name(&self) -> &str;

    /// Drop every entry. Must leave the cache usable afterwards.
    fn clear(&self) -> Result<(), CacheError>;
}

/// Outcome of clearing one registered cache.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheClearOutcome {
    pub name: String,
    pub cleared: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Registry of plugin-owned caches.
pub struct CacheRegistry {
    caches: RwLock<Vec<Arc<dyn Clearable>>>,
}

impl CacheRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            caches: RwLock::new(Vec::new()),
        }
    }

    /// Register a cache handle. Idempotent per distinct handle: registering
    /// the same `Arc` twice keeps a single entry.
    pub fn register(&self, cache: Arc<dyn Clearable>) {
        let mut caches = self.caches.write();
        if caches.iter().any(|c| Arc::ptr_eq(c, &cache)) {
            return;
        }
        info!(cache = cache.name(), "Plugin cache registered");
        caches.push(cache);
    }

    /// Number of registered caches.
    pub fn len(&self) -> usize {
        self.caches.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.read().is_empty()
    }

    /// Clear every registered cache synchronously.
    ///
    /// A failure in one plugin's cache is caught and reported per-plugin;
    /// it never blocks clearing of the others. Once this returns, every
    /// cache that reported `cleared` holds no pre-sweep entries.
    pub fn invalidate_all(&self) -> Vec<CacheClearOutcome> {
        let caches = self.caches.read();
        let mut outcomes = Vec::with_capacity(caches.len());

        for cache in caches.iter() {
            match cache.clear() {
                Ok(()) => outcomes.push(CacheClearOutcome {
                    name: cache.name().to_string(),
                    cleared: true,
                    error: None,
                }),
                Err(e) => {
                    warn!(cache = cache.name(), error = %e, "Plugin cache failed to clear");
                    outcomes.push(CacheClearOutcome {
                        name: cache.name().to_string(),
                        cleared: false,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        info!(
            cleared = outcomes.iter().filter(|o| o.cleared).count(),
            failed = outcomes.iter().filter(|o| !o.cleared).count(),
            "Cache invalidation sweep complete"
        );
        outcomes
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}
