//! Expiring LRU Module
//!
//! Recency-ordered map with an entry-count limit, per-entry expiry and an
//! eviction callback. It synchronizes itself, so callers share it by
//! reference.

use std::fmt;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use crate::cache::CacheEntry;

/// Callback invoked with every entry that leaves the map.
pub type EvictFn<V> = Box<dyn Fn(&str, &V, Removal) + Send + Sync>;

/// Why an entry left the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Explicitly removed by key
    Deleted,
    /// Overwritten by a newer value for the same key
    Replaced,
    /// Dropped to respect the entry-count limit or to free room
    Evicted,
    /// Deadline passed
    Expired,
}

// == Expiring LRU ==
/// Least-recently-used map whose removals all funnel through one callback.
///
/// Every path that drops an entry invokes `on_evict` exactly once for that
/// entry, tagged with the [`Removal`] cause. The one exception is
/// [`ExpiringLru::compare_and_swap`], which hands the replaced value back to
/// its caller instead. The callback runs after the internal lock is
/// released, so it may take other locks but must not assume the map is
/// still unchanged.
pub struct ExpiringLru<V> {
    /// Entries ordered from most to least recently used
    entries: Mutex<LruCache<String, CacheEntry<V>>>,
    /// Expiry applied when an insert does not carry its own
    default_ttl: Option<Duration>,
    on_evict: EvictFn<V>,
}

impl<V: Clone> ExpiringLru<V> {
    // == Constructor ==
    /// Creates a map holding at most `max_keys` entries (0 = unbounded).
    pub fn new(max_keys: usize, default_ttl: Option<Duration>, on_evict: EvictFn<V>) -> Self {
        let entries = match NonZeroUsize::new(max_keys) {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };
        Self {
            entries: Mutex::new(entries),
            default_ttl,
            on_evict,
        }
    }

    fn notify(&self, evicted: Vec<(String, CacheEntry<V>, Removal)>) {
        for (key, entry, cause) in &evicted {
            (self.on_evict)(key, &entry.value, *cause);
        }
    }

    // == Get ==
    /// Returns the value and marks the key most recently used.
    ///
    /// An expired entry is removed and reported as absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            None => return None,
            Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
            Some(_) => {}
        }
        let removed = entries.pop(key);
        drop(entries);

        if let Some(entry) = removed {
            self.notify(vec![(key.to_string(), entry, Removal::Expired)]);
        }
        None
    }

    /// Returns the value without touching recency.
    pub fn peek(&self, key: &str) -> Option<V> {
        self.entries
            .lock()
            .peek(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
    }

    // == Insert ==
    /// Inserts or replaces `key`, marking it most recently used.
    ///
    /// A replaced value, or the entry evicted to respect the entry-count
    /// limit, goes through the eviction callback.
    pub fn insert(&self, key: String, value: V, ttl: Option<Duration>) {
        let entry = CacheEntry::new(value, ttl.or(self.default_ttl));
        let displaced = self.entries.lock().push(key.clone(), entry);
        if let Some((old_key, old)) = displaced {
            let cause = if old_key == key {
                Removal::Replaced
            } else {
                Removal::Evicted
            };
            self.notify(vec![(old_key, old, cause)]);
        }
    }

    // == Remove ==
    /// Removes `key`, returning its value if it was present.
    pub fn remove(&self, key: &str) -> Option<V> {
        let removed = self.entries.lock().pop(key)?;
        let value = removed.value.clone();
        self.notify(vec![(key.to_string(), removed, Removal::Deleted)]);
        Some(value)
    }

    /// Evicts the least recently used entry other than `keep`.
    pub fn remove_oldest(&self, keep: Option<&str>) -> Option<(String, V)> {
        let (key, entry) = {
            let mut entries = self.entries.lock();
            let victim = entries
                .iter()
                .rev()
                .map(|(key, _)| key)
                .find(|key| Some(key.as_str()) != keep)?
                .clone();
            let entry = entries.pop(&victim)?;
            (victim, entry)
        };
        let value = entry.value.clone();
        self.notify(vec![(key.clone(), entry, Removal::Evicted)]);
        Some((key, value))
    }

    // == Keys ==
    /// Snapshot of the live keys, least recently used first.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        self.entries
            .lock()
            .iter()
            .rev()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    // == Purge Expired ==
    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let purged: Vec<(String, CacheEntry<V>, Removal)> = {
            let mut entries = self.entries.lock();
            let expired: Vec<String> = entries
                .iter()
                .filter(|(_, entry)| entry.is_expired_at(now))
                .map(|(key, _)| key.clone())
                .collect();
            expired
                .into_iter()
                .filter_map(|key| {
                    entries
                        .pop(&key)
                        .map(|entry| (key, entry, Removal::Expired))
                })
                .collect()
        };

        let count = purged.len();
        self.notify(purged);
        count
    }

    // == Length ==
    /// Number of entries held, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<V: Clone + PartialEq> ExpiringLru<V> {
    // == Compare And Swap ==
    /// Replaces the value of `key` only if it still equals `expected`.
    ///
    /// `expected == None` means the key must be absent. On success the
    /// replaced value, if any, is returned to the caller and does not go
    /// through the eviction callback. On mismatch nothing changes and the
    /// value observed under the lock is returned as `Err`. Without an
    /// explicit `ttl` an existing entry keeps its deadline and a new one gets
    /// the default expiry.
    pub fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&V>,
        value: V,
        ttl: Option<Duration>,
    ) -> Result<Option<V>, Option<V>> {
        let now = Instant::now();
        let mut displaced = Vec::new();

        let outcome = {
            let mut entries = self.entries.lock();
            if entries.peek(key).is_some_and(|entry| entry.is_expired_at(now)) {
                if let Some(entry) = entries.pop(key) {
                    displaced.push((key.to_string(), entry, Removal::Expired));
                }
            }

            let current = entries.peek(key);
            if current.map(|entry| &entry.value) != expected {
                Err(current.map(|entry| entry.value.clone()))
            } else {
                let expires_at = match (ttl, current) {
                    (Some(ttl), _) => Some(now + ttl),
                    (None, Some(entry)) => entry.expires_at,
                    (None, None) => self.default_ttl.map(|ttl| now + ttl),
                };
                let entry = CacheEntry::with_deadline(value, expires_at);
                match entries.push(key.to_string(), entry) {
                    Some((old_key, old)) if old_key == key => Ok(Some(old.value)),
                    Some((old_key, old)) => {
                        displaced.push((old_key, old, Removal::Evicted));
                        Ok(None)
                    }
                    None => Ok(None),
                }
            }
        };

        self.notify(displaced);
        outcome
    }
}

impl<V> fmt::Debug for ExpiringLru<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.lock();
        f.debug_struct("ExpiringLru")
            .field("len", &entries.len())
            .field("cap", &entries.cap())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread::sleep;

    type Log = Arc<Mutex<Vec<String>>>;

    fn logged(max_keys: usize, ttl: Option<Duration>) -> (ExpiringLru<i32>, Log) {
        let log: Log = Arc::default();
        let sink = Arc::clone(&log);
        let lru = ExpiringLru::new(
            max_keys,
            ttl,
            Box::new(move |key: &str, value: &i32, _: Removal| {
                sink.lock().push(format!("{key}={value}"))
            }),
        );
        (lru, log)
    }

    #[test]
    fn test_lru_new() {
        let (lru, _) = logged(3, None);
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
    }

    #[test]
    fn test_insert_and_get() {
        let (lru, log) = logged(3, None);
        lru.insert("a".into(), 1, None);

        assert_eq!(lru.get("a"), Some(1));
        assert_eq!(lru.get("missing"), None);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_entry_count_eviction_fires_callback() {
        let (lru, log) = logged(2, None);
        lru.insert("a".into(), 1, None);
        lru.insert("b".into(), 2, None);
        lru.insert("c".into(), 3, None);

        assert_eq!(lru.len(), 2);
        assert_eq!(lru.get("a"), None);
        assert_eq!(*log.lock(), vec!["a=1".to_string()]);
    }

    #[test]
    fn test_get_refreshes_recency() {
        let (lru, log) = logged(3, None);
        lru.insert("a".into(), 1, None);
        lru.insert("b".into(), 2, None);
        lru.insert("c".into(), 3, None);

        // Access a so b becomes the oldest
        lru.get("a");
        lru.insert("d".into(), 4, None);

        assert_eq!(*log.lock(), vec!["b=2".to_string()]);
        assert_eq!(lru.keys(), vec!["c", "a", "d"]);
    }

    #[test]
    fn test_peek_does_not_refresh_recency() {
        let (lru, _) = logged(0, None);
        lru.insert("a".into(), 1, None);
        lru.insert("b".into(), 2, None);

        assert_eq!(lru.peek("a"), Some(1));
        assert_eq!(lru.remove_oldest(None), Some(("a".to_string(), 1)));
    }

    #[test]
    fn test_replace_releases_previous_value() {
        let (lru, log) = logged(0, None);
        lru.insert("a".into(), 1, None);
        lru.insert("a".into(), 2, None);

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.get("a"), Some(2));
        assert_eq!(*log.lock(), vec!["a=1".to_string()]);
    }

    #[test]
    fn test_remove() {
        let (lru, log) = logged(0, None);
        lru.insert("a".into(), 1, None);

        assert_eq!(lru.remove("a"), Some(1));
        assert_eq!(lru.remove("a"), None);
        assert_eq!(*log.lock(), vec!["a=1".to_string()]);
    }

    #[test]
    fn test_remove_oldest_order() {
        let (lru, log) = logged(0, None);
        for (i, key) in ["a", "b", "c"].iter().enumerate() {
            lru.insert(key.to_string(), i as i32, None);
        }
        lru.get("a");

        assert_eq!(lru.remove_oldest(None).map(|(k, _)| k), Some("b".to_string()));
        assert_eq!(lru.remove_oldest(None).map(|(k, _)| k), Some("c".to_string()));
        assert_eq!(lru.remove_oldest(None).map(|(k, _)| k), Some("a".to_string()));
        assert_eq!(lru.remove_oldest(None), None);
        assert_eq!(log.lock().len(), 3);
    }

    #[test]
    fn test_default_ttl_expiry_on_get() {
        let (lru, log) = logged(0, Some(Duration::from_millis(30)));
        lru.insert("a".into(), 1, None);
        assert_eq!(lru.get("a"), Some(1));

        sleep(Duration::from_millis(50));

        assert_eq!(lru.get("a"), None);
        assert!(lru.is_empty());
        assert_eq!(*log.lock(), vec!["a=1".to_string()]);
    }

    #[test]
    fn test_per_entry_ttl_overrides_default() {
        let (lru, _) = logged(0, Some(Duration::from_millis(30)));
        lru.insert("short".into(), 1, None);
        lru.insert("long".into(), 2, Some(Duration::from_secs(60)));

        sleep(Duration::from_millis(50));

        assert_eq!(lru.get("short"), None);
        assert_eq!(lru.get("long"), Some(2));
    }

    #[test]
    fn test_keys_skip_expired() {
        let (lru, _) = logged(0, None);
        lru.insert("gone".into(), 1, Some(Duration::from_millis(10)));
        lru.insert("kept".into(), 2, None);

        sleep(Duration::from_millis(30));

        assert_eq!(lru.keys(), vec!["kept"]);
    }

    #[test]
    fn test_purge_expired() {
        let (lru, log) = logged(0, None);
        lru.insert("a".into(), 1, Some(Duration::from_millis(10)));
        lru.insert("b".into(), 2, Some(Duration::from_millis(10)));
        lru.insert("c".into(), 3, None);

        sleep(Duration::from_millis(30));

        assert_eq!(lru.purge_expired(), 2);
        assert_eq!(lru.len(), 1);
        assert_eq!(log.lock().len(), 2);
        assert_eq!(lru.purge_expired(), 0);
    }

    #[test]
    fn test_compare_and_swap_success() {
        let (lru, log) = logged(0, None);
        lru.insert("n".into(), 1, None);

        assert_eq!(lru.compare_and_swap("n", Some(&1), 2, None), Ok(Some(1)));
        assert_eq!(lru.get("n"), Some(2));
        // The replaced value goes back to the caller, not the callback
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_compare_and_swap_conflict_reports_observed() {
        let (lru, log) = logged(0, None);
        lru.insert("n".into(), 5, None);

        assert_eq!(lru.compare_and_swap("n", Some(&1), 2, None), Err(Some(5)));
        assert_eq!(lru.get("n"), Some(5));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_compare_and_swap_absent() {
        let (lru, _) = logged(0, None);

        assert_eq!(lru.compare_and_swap("n", Some(&0), 1, None), Err(None));
        assert_eq!(lru.compare_and_swap("n", None, 1, None), Ok(None));
        assert_eq!(lru.compare_and_swap("n", None, 1, None), Err(Some(1)));
    }

    #[test]
    fn test_compare_and_swap_keeps_deadline() {
        let (lru, _) = logged(0, None);
        lru.insert("n".into(), 1, Some(Duration::from_millis(30)));
        lru.compare_and_swap("n", Some(&1), 2, None).unwrap();

        sleep(Duration::from_millis(50));

        assert_eq!(lru.get("n"), None);
    }

    #[test]
    fn test_compare_and_swap_treats_expired_as_absent() {
        let (lru, log) = logged(0, None);
        lru.insert("n".into(), 7, Some(Duration::from_millis(10)));

        sleep(Duration::from_millis(30));

        assert_eq!(lru.compare_and_swap("n", Some(&7), 8, None), Err(None));
        assert_eq!(*log.lock(), vec!["n=7".to_string()]);
    }

    #[test]
    fn test_remove_oldest_skips_kept_key() {
        let (lru, log) = logged(0, None);
        lru.insert("a".into(), 1, None);
        lru.insert("b".into(), 2, None);

        assert_eq!(lru.remove_oldest(Some("a")), Some(("b".to_string(), 2)));
        assert_eq!(lru.remove_oldest(Some("a")), None);
        assert_eq!(lru.get("a"), Some(1));
        assert_eq!(*log.lock(), vec!["b=2".to_string()]);
    }

    #[test]
    fn test_removal_causes() {
        let causes: Arc<Mutex<Vec<(String, Removal)>>> = Arc::default();
        let sink = Arc::clone(&causes);
        let lru = ExpiringLru::new(
            2,
            None,
            Box::new(move |key: &str, _: &i32, cause: Removal| {
                sink.lock().push((key.to_string(), cause))
            }),
        );

        lru.insert("a".into(), 1, None);
        lru.insert("a".into(), 2, None);
        lru.insert("b".into(), 3, None);
        lru.insert("c".into(), 4, None);
        lru.remove("b");
        lru.insert("d".into(), 5, Some(Duration::from_millis(10)));
        lru.remove_oldest(Some("d"));
        sleep(Duration::from_millis(30));
        lru.purge_expired();

        assert_eq!(
            *causes.lock(),
            vec![
                ("a".to_string(), Removal::Replaced),
                ("a".to_string(), Removal::Evicted),
                ("b".to_string(), Removal::Deleted),
                ("c".to_string(), Removal::Evicted),
                ("d".to_string(), Removal::Expired),
            ]
        );
    }
}
