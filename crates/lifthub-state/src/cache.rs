//! Plugin cache container.
//!
//! `PlainCache` is the cache map a scoreboard plugin typically owns: keyed
//! by platform name plus the plugin's option string, holding a previously
//! computed projection with the time it was computed. The hub never reads
//! these entries; it only clears them through the `Clearable` registration.

use crate::error::CacheError;
use crate::registry::Clearable;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Composite cache key: platform name plus the plugin's option set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub fop: String,
    pub options: String,
}

impl CacheKey {
    pub fn new(fop: impl Into<String>, options: impl Into<String>) -> Self {
        Self {
            fop: fop.into(),
            options: options.into(),
        }
    }
}

/// One cached projection with its computation time.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    cached_at: DateTime<Utc>,
}

/// A plugin-owned projection cache.
pub struct PlainCache<V> {
    name: String,
    entries: DashMap<CacheKey, CacheEntry<V>>,
}

impl<V: Clone + Send + Sync> PlainCache<V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: DashMap::new(),
        }
    }

    /// Look up a cached projection.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        self.entries.get(key).map(|e| e.value.clone())
    }

    /// Cached-at timestamp for a key.
    pub fn cached_at(&self, key: &CacheKey) -> Option<DateTime<Utc>> {
        self.entries.get(key).map(|e| e.cached_at)
    }

    /// Store a projection.
    pub fn put(&self, key: CacheKey, value: V) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                cached_at: Utc::now(),
            },
        );
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone + Send + Sync> Clearable for PlainCache<V> {
    fn name(&self) -> &str {
        &self.name
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_and_clear() {
        let cache: PlainCache<String> = PlainCache::new("scoreboard");
        let key = CacheKey::new("A", "lights=on");

        assert!(cache.get(&key).is_none());

        cache.put(key.clone(), "rendered".to_string());
        assert_eq!(cache.get(&key).as_deref(), Some("rendered"));
        assert!(cache.cached_at(&key).is_some());

        cache.clear().unwrap();
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_keys_isolate_platform_and_options() {
        let cache: PlainCache<u32> = PlainCache::new("attempts");

        cache.put(CacheKey::new("A", "short"), 1);
        cache.put(CacheKey::new("A", "long"), 2);
        cache.put(CacheKey::new("B", "short"), 3);

        assert_eq!(cache.get(&CacheKey::new("A", "short")), Some(1));
        assert_eq!(cache.get(&CacheKey::new("A", "long")), Some(2));
        assert_eq!(cache.get(&CacheKey::new("B", "short")), Some(3));
        assert_eq!(cache.len(), 3);
    }
}
