//! Competition state store.
//!
//! Holds the current `CompetitionSnapshot` and the map of platform name to
//! current `FopUpdate`. Both are replace-only: the snapshot swaps as one
//! `Arc` so readers in flight see the old or the new value in full, and an
//! update replaces the whole entry for its platform. Writers to different
//! platforms never contend; writers to the same platform serialize on the
//! map shard (last write commits).

use chrono::Utc;
use dashmap::DashMap;
use lifthub_core::{CompetitionSnapshot, FopUpdate};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// State store for the competition hub.
pub struct StateStore {
    /// Latest full snapshot; `None` until the first resync.
    snapshot: RwLock<Option<Arc<CompetitionSnapshot>>>,
    /// Latest update per platform name.
    fops: DashMap<String, FopUpdate>,
    /// Locale names installed by configuration pushes.
    locales: RwLock<Vec<String>>,
}

impl StateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(None),
            fops: DashMap::new(),
            locales: RwLock::new(Vec::new()),
        }
    }

    /// Replace the snapshot in one step.
    pub fn apply_snapshot(&self, mut snapshot: CompetitionSnapshot) {
        snapshot.received_at = Some(Utc::now());
        let athletes = snapshot.athletes_count();
        *self.snapshot.write() = Some(Arc::new(snapshot));
        debug!(athletes, "Snapshot replaced");
    }

    /// Replace the update for its platform. Unrelated platforms are
    /// unaffected; for the same platform, last write wins.
    pub fn apply_fop_update(&self, update: FopUpdate) {
        debug!(fop = %update.fop, state = %update.fop_state, "FOP update applied");
        self.fops.insert(update.fop.clone(), update);
    }

    /// Current snapshot, if one has ever loaded.
    pub fn snapshot(&self) -> Option<Arc<CompetitionSnapshot>> {
        self.snapshot.read().clone()
    }

    /// Whether a snapshot with data has ever loaded.
    pub fn database_loaded(&self) -> bool {
        self.snapshot().is_some_and(|s| s.is_loaded())
    }

    /// Current update for a platform.
    pub fn fop_update(&self, fop: &str) -> Option<FopUpdate> {
        self.fops.get(fop).map(|entry| entry.clone())
    }

    /// Known platform names, sorted for stable output.
    pub fn fop_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.fops.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Install the locale list from a configuration push.
    pub fn set_locales(&self, locales: Vec<String>) {
        debug!(count = locales.len(), "Locales installed");
        *self.locales.write() = locales;
    }

    /// Available locale names.
    pub fn locales(&self) -> Vec<String> {
        self.locales.read().clone()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifthub_core::{Athlete, FopState};

    fn update(fop: &str, group: &str, ts: i64) -> FopUpdate {
        FopUpdate {
            fop: fop.to_string(),
            fop_state: FopState::Active,
            group: Some(group.to_string()),
            group_info: None,
            break_kind: None,
            athlete_timer: None,
            break_timer: None,
            decision: None,
            current_athlete: None,
            leaders: vec![],
            start_order: vec![],
            last_update_ms: ts,
        }
    }

    #[test]
    fn test_last_write_wins_per_platform() {
        let store = StateStore::new();

        store.apply_fop_update(update("A", "M1", 1));
        store.apply_fop_update(update("A", "M2", 2));
        store.apply_fop_update(update("A", "M3", 3));

        let current = store.fop_update("A").unwrap();
        assert_eq!(current.group.as_deref(), Some("M3"));
        assert_eq!(current.last_update_ms, 3);
    }

    #[test]
    fn test_updates_do_not_cross_platforms() {
        let store = StateStore::new();

        store.apply_fop_update(update("A", "M1", 1));
        store.apply_fop_update(update("B", "F1", 2));

        assert_eq!(store.fop_update("A").unwrap().group.as_deref(), Some("M1"));
        assert_eq!(store.fop_update("B").unwrap().group.as_deref(), Some("F1"));
        assert_eq!(store.fop_names(), vec!["A", "B"]);
    }

    #[test]
    fn test_snapshot_replaced_wholesale() {
        let store = StateStore::new();
        assert!(store.snapshot().is_none());
        assert!(!store.database_loaded());

        let mut first = CompetitionSnapshot::default();
        first.competition.name = "Old".to_string();
        first.athletes = vec![Athlete::default(); 3];
        store.apply_snapshot(first);

        // A reader holding the old Arc keeps a fully consistent old view.
        let held = store.snapshot().unwrap();
        assert_eq!(held.competition.name, "Old");

        let mut second = CompetitionSnapshot::default();
        second.competition.name = "New".to_string();
        second.athletes = vec![Athlete::default(); 5];
        store.apply_snapshot(second);

        let fresh = store.snapshot().unwrap();
        assert_eq!(fresh.competition.name, "New");
        assert_eq!(fresh.athletes_count(), 5);

        // The held reference never turned into a mix.
        assert_eq!(held.competition.name, "Old");
        assert_eq!(held.athletes_count(), 3);
    }

    #[test]
    fn test_stale_platforms_persist() {
        let store = StateStore::new();
        store.apply_fop_update(update("A", "M1", 1));

        // No expiry: the entry survives until overwritten.
        assert!(store.fop_update("A").is_some());
        assert!(store.fop_update("B").is_none());
    }

    #[test]
    fn test_locales_roundtrip() {
        let store = StateStore::new();
        assert!(store.locales().is_empty());

        store.set_locales(vec!["en".to_string(), "fr".to_string()]);
        assert_eq!(store.locales(), vec!["en", "fr"]);
    }
}
