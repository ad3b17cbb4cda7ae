//! Expiring key/value storage shared by every lookup cache.

use std::{borrow::Borrow, hash::Hash, num::NonZeroUsize, sync::Mutex, time::Duration};

use lru::LruCache;
use metrics::counter;
use tokio::time::Instant;

use super::lock::mutex_lock;

const SOURCE: &str = "cache::store";

pub(crate) const METRIC_CACHE_HIT: &str = "tourguard_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "tourguard_cache_miss_total";
pub(crate) const METRIC_CACHE_EXPIRED: &str = "tourguard_cache_expired_total";
pub(crate) const METRIC_CACHE_EVICT: &str = "tourguard_cache_evict_total";

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// A bounded map whose entries expire a fixed time after they were written.
///
/// Expiry is lazy: a stale entry is removed by the `get` that finds it. Writes to a full
/// cache evict the least recently used entry. Clock reads go through `tokio::time`, so
/// paused-clock tests can move time forward deterministically.
pub struct TtlCache<K, V> {
    name: &'static str,
    ttl: Duration,
    entries: Mutex<LruCache<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    pub fn new(name: &'static str, ttl: Duration, capacity: NonZeroUsize) -> Self {
        Self {
            name,
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Return the stored value if it has not expired yet.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut entries = mutex_lock(&self.entries, SOURCE, "get");
        let now = Instant::now();

        let expired = match entries.get(key) {
            Some(entry) if now < entry.expires_at => {
                counter!(METRIC_CACHE_HIT, "cache" => self.name).increment(1);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(key);
            counter!(METRIC_CACHE_EXPIRED, "cache" => self.name).increment(1);
        }
        counter!(METRIC_CACHE_MISS, "cache" => self.name).increment(1);
        None
    }

    /// Store `value` under `key`, replacing any previous entry and restarting its TTL.
    pub fn set(&self, key: K, value: V) {
        let mut entries = mutex_lock(&self.entries, SOURCE, "set");
        let evicts = !entries.contains(&key) && entries.len() == entries.cap().get();

        entries.put(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );

        if evicts {
            counter!(METRIC_CACHE_EVICT, "cache" => self.name).increment(1);
        }
    }

    /// Number of stored entries, including ones that expired but were not read since.
    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    fn cache(ttl_secs: u64, capacity: usize) -> TtlCache<String, u32> {
        TtlCache::new(
            "test",
            Duration::from_secs(ttl_secs),
            NonZeroUsize::new(capacity).expect("non-zero capacity"),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn returns_value_before_expiry() {
        let store = cache(60, 8);
        store.set("k".to_string(), 7);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.get("k"), Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn expires_exactly_at_ttl_and_removes_entry() {
        let store = cache(60, 8);
        store.set("k".to_string(), 7);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(store.get("k"), None);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn overwrite_restarts_ttl() {
        let store = cache(60, 8);
        store.set("k".to_string(), 1);

        tokio::time::advance(Duration::from_secs(40)).await;
        store.set("k".to_string(), 2);

        tokio::time::advance(Duration::from_secs(40)).await;
        assert_eq!(store.get("k"), Some(2));
    }

    #[test]
    fn missing_key_is_a_miss() {
        let store = cache(60, 8);
        assert_eq!(store.get("absent"), None);
    }

    #[test]
    fn evicts_least_recently_used_when_full() {
        let store = cache(60, 2);
        store.set("a".to_string(), 1);
        store.set("b".to_string(), 2);
        assert_eq!(store.get("a"), Some(1));

        store.set("c".to_string(), 3);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("b"), None);
        assert_eq!(store.get("a"), Some(1));
        assert_eq!(store.get("c"), Some(3));
    }

    #[test]
    fn recovers_from_poisoned_lock() {
        let store = cache(60, 2);

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store.entries.lock().expect("entries lock should be acquired");
            panic!("poison entries lock");
        }));

        store.set("k".to_string(), 5);
        assert_eq!(store.get("k"), Some(5));
    }
}
