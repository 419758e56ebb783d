//! Store-scoped reference-data cache.
//!
//! Keys are namespaced per store (`"<store_id>_<key>"`) so one store's
//! entries can be evicted without touching another's. Entries expire after
//! five minutes; a miss is always answered from the database, so eviction is
//! a freshness concern, not a correctness one.

use std::time::Duration;

use moka::sync::Cache;

use driftwood_core::StoreId;

const MAX_ENTRIES: u64 = 1000;
const TIME_TO_LIVE: Duration = Duration::from_secs(300);

/// An in-memory cache for per-store reference data.
#[derive(Clone)]
pub struct ReferenceCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    cache: Cache<String, V>,
}

impl<V> ReferenceCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(TIME_TO_LIVE)
                .build(),
        }
    }

    /// Look up a value cached for one store.
    #[must_use]
    pub fn get(&self, store_id: StoreId, key: &str) -> Option<V> {
        self.cache.get(&Self::scoped(store_id, key))
    }

    /// Cache a value for one store.
    pub fn put(&self, store_id: StoreId, key: &str, value: V) {
        self.cache.insert(Self::scoped(store_id, key), value);
    }

    /// Drop one store-scoped entry.
    pub fn evict(&self, store_id: StoreId, key: &str) {
        self.cache.invalidate(&Self::scoped(store_id, key));
    }

    /// Drop every entry belonging to one store.
    pub fn evict_all_for_store(&self, store_id: StoreId) {
        let prefix = format!("{store_id}_");
        let stale: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, _)| (*key).clone())
            .collect();
        for key in stale {
            self.cache.invalidate(&key);
        }
    }

    fn scoped(store_id: StoreId, key: &str) -> String {
        format!("{store_id}_{key}")
    }
}

impl<V> Default for ReferenceCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_get_put_is_store_scoped() {
        let cache = ReferenceCache::new();
        cache.put(StoreId::new(1), "greeting", "hello".to_owned());

        assert_eq!(
            cache.get(StoreId::new(1), "greeting"),
            Some("hello".to_owned())
        );
        assert_eq!(cache.get(StoreId::new(2), "greeting"), None);
    }

    #[test]
    fn test_evict_single_entry() {
        let cache = ReferenceCache::new();
        cache.put(StoreId::new(1), "a", 1);
        cache.put(StoreId::new(1), "b", 2);

        cache.evict(StoreId::new(1), "a");
        assert_eq!(cache.get(StoreId::new(1), "a"), None);
        assert_eq!(cache.get(StoreId::new(1), "b"), Some(2));
    }

    #[test]
    fn test_evict_all_for_store_leaves_other_stores_alone() {
        let cache = ReferenceCache::new();
        cache.put(StoreId::new(1), "a", 1);
        cache.put(StoreId::new(1), "b", 2);
        cache.put(StoreId::new(2), "a", 3);
        // moka applies writes asynchronously; force them visible
        cache.cache.run_pending_tasks();

        cache.evict_all_for_store(StoreId::new(1));
        assert_eq!(cache.get(StoreId::new(1), "a"), None);
        assert_eq!(cache.get(StoreId::new(1), "b"), None);
        assert_eq!(cache.get(StoreId::new(2), "a"), Some(3));
    }

    #[test]
    fn test_prefix_scoping_does_not_collide_across_stores() {
        let cache = ReferenceCache::new();
        // store 1 with key "1_x" vs store 11 with key "x" must not collide
        cache.put(StoreId::new(1), "1_x", 1);
        cache.put(StoreId::new(11), "x", 2);

        assert_eq!(cache.get(StoreId::new(1), "1_x"), Some(1));
        assert_eq!(cache.get(StoreId::new(11), "x"), Some(2));
    }
}
