//! Memory Store Module
//!
//! In-process backend combining the expiring LRU map with byte-budget
//! accounting and an optimistic increment.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::cache::{CacheStats, CapacityTracker, ExpiringLru, MemoryConfig, Removal, MAX_ATTEMPTS};
use crate::error::{KvsError, Result};
use crate::iter::KeyIter;
use crate::options::{ReadOptions, WriteOptions};
use crate::size::format_bytes;
use crate::store::{ensure_live, Store, StoreStats};

// == Memory Store ==
/// Thread-safe bounded cache implementing [`Store`].
///
/// The map synchronizes itself; the byte counter has its own narrow lock
/// that is only taken on writes and inside the eviction callback. Reads never
/// touch the counter.
#[derive(Debug)]
pub struct MemoryStore {
    config: MemoryConfig,
    /// Key-value storage in recency order
    cache: ExpiringLru<Vec<u8>>,
    /// Byte budget shared with the eviction callback
    capacity: Arc<CapacityTracker>,
    /// Performance statistics, shared with the eviction callback
    stats: Arc<CacheStats>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store with the given limits.
    pub fn new(config: MemoryConfig) -> Self {
        let capacity = Arc::new(CapacityTracker::new(config.max_bytes));
        let stats = Arc::new(CacheStats::new());
        let tracker = Arc::clone(&capacity);
        let counters = Arc::clone(&stats);
        let cache = ExpiringLru::new(
            usize::try_from(config.max_keys).unwrap_or(usize::MAX),
            config.ttl,
            Box::new(move |key: &str, value: &Vec<u8>, cause: Removal| {
                tracker.release(value.len() as u64);
                if cause == Removal::Evicted {
                    counters.record_eviction();
                    debug!(key, bytes = value.len(), "evicted");
                }
            }),
        );

        Self {
            config,
            cache,
            capacity,
            stats,
        }
    }

    /// Creates a store from a `memory:` connection descriptor.
    pub fn open(dsn: &str) -> Result<Self> {
        Ok(Self::new(MemoryConfig::from_dsn(dsn)?))
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    // == Length ==
    /// Current number of entries.
    pub fn len(&self) -> i64 {
        self.cache.len() as i64
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    // == Capacity ==
    /// `(budget, used)` in bytes, `(0, 0)` when no byte budget is set.
    pub fn cap(&self) -> (u64, u64) {
        self.capacity.usage()
    }

    // == Admit ==
    /// Reserves `n` bytes, evicting least recently used entries as needed.
    ///
    /// Gives up after `MAX_ATTEMPTS` evictions or once nothing but `keep` is
    /// left to evict. A value larger than the whole budget is refused before
    /// anything is evicted.
    fn admit(&self, cx: &CancellationToken, key: &str, n: u64, keep: Option<&str>) -> Result<()> {
        if self.capacity.exceeds_budget(n) {
            warn!(key, bytes = n, "value larger than the byte budget");
            return Err(KvsError::CapacityExceeded(format!(
                "{key}: {} exceeds budget of {}",
                format_bytes(n),
                format_bytes(self.config.max_bytes)
            )));
        }

        let mut attempt = 0;
        while !self.capacity.reserve(n) {
            let evicted = if attempt < MAX_ATTEMPTS {
                ensure_live(cx)?;
                self.cache.remove_oldest(keep)
            } else {
                None
            };
            if evicted.is_none() {
                debug!(key, bytes = n, attempt, "capacity exhausted");
                return Err(KvsError::CapacityExceeded(format!(
                    "{key}: no room for {} after {attempt} evictions",
                    format_bytes(n)
                )));
            }
            attempt += 1;
        }
        Ok(())
    }

    fn parse_counter(key: &str, value: Option<&[u8]>) -> Result<i64> {
        let Some(bytes) = value else {
            return Ok(0);
        };
        let text = std::str::from_utf8(bytes).map_err(|e| KvsError::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        text.parse::<i64>().map_err(|e| KvsError::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

impl fmt::Display for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut limits = Vec::new();
        if self.config.max_keys > 0 {
            limits.push(format!("keys={}", self.config.max_keys));
        }
        if self.config.max_bytes > 0 {
            limits.push(format!("bytes={}", format_bytes(self.config.max_bytes)));
        }
        if let Some(ttl) = self.config.ttl {
            limits.push(format!("ttl={}s", ttl.as_secs()));
        }

        write!(f, "Memory")?;
        if !limits.is_empty() {
            write!(f, ": {}", limits.join(", "))?;
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    // == Keys ==
    async fn keys(&self, cx: &CancellationToken, opts: ReadOptions) -> Result<KeyIter> {
        ensure_live(cx)?;
        let snapshot = self.cache.keys();
        Ok(KeyIter::spawn(cx.clone(), snapshot, move |key| opts.matches(key)))
    }

    // == Get ==
    async fn get(&self, cx: &CancellationToken, key: &str, _opts: ReadOptions) -> Result<Vec<u8>> {
        ensure_live(cx)?;
        match self.cache.get(key) {
            Some(value) => {
                self.stats.record_hit();
                Ok(value)
            }
            None => {
                self.stats.record_miss();
                Err(KvsError::NotFound(key.to_string()))
            }
        }
    }

    // == Set ==
    async fn set(
        &self,
        cx: &CancellationToken,
        key: &str,
        value: Vec<u8>,
        opts: WriteOptions,
    ) -> Result<()> {
        ensure_live(cx)?;
        self.admit(cx, key, value.len() as u64, None)?;
        self.cache.insert(key.to_string(), value, opts.ttl);
        Ok(())
    }

    // == Increment ==
    async fn inc(
        &self,
        cx: &CancellationToken,
        key: &str,
        delta: i64,
        opts: WriteOptions,
    ) -> Result<i64> {
        ensure_live(cx)?;
        let mut observed = self.cache.peek(key);

        for attempt in 0..MAX_ATTEMPTS {
            ensure_live(cx)?;
            let current = Self::parse_counter(key, observed.as_deref())?;
            let sum = current
                .checked_add(delta)
                .ok_or_else(|| KvsError::InvalidValue {
                    key: key.to_string(),
                    reason: format!("{current} + {delta} overflows"),
                })?;

            // Only the growth over the current text needs room, and the
            // counter itself is never the eviction victim.
            let next = sum.to_string().into_bytes();
            let n = next.len() as u64;
            let old = observed.as_ref().map_or(0, |v| v.len() as u64);
            let grow = n.saturating_sub(old);
            self.admit(cx, key, grow, Some(key))?;

            match self
                .cache
                .compare_and_swap(key, observed.as_ref(), next, opts.ttl)
            {
                Ok(replaced) => {
                    let freed = replaced.map_or(0, |v| v.len() as u64);
                    self.capacity.release((grow + freed).saturating_sub(n));
                    return Ok(sum);
                }
                Err(actual) => {
                    self.capacity.release(grow);
                    self.stats.record_conflict();
                    trace!(key, attempt, "increment conflict, retrying");
                    observed = actual;
                }
            }
        }

        warn!(key, attempts = MAX_ATTEMPTS, "increment gave up after conflicts");
        Err(KvsError::Conflict(format!(
            "{key}: value changed on each of {MAX_ATTEMPTS} attempts"
        )))
    }

    // == Delete ==
    async fn delete(&self, cx: &CancellationToken, key: &str, _opts: WriteOptions) -> Result<()> {
        ensure_live(cx)?;
        // The eviction callback frees the entry's bytes; absent keys are a no-op.
        self.cache.remove(key);
        Ok(())
    }

    fn stats(&self) -> Option<StoreStats> {
        let (max_bytes, used_bytes) = self.cap();
        Some(StoreStats {
            entries: self.cache.len() as u64,
            max_bytes,
            used_bytes,
            hits: self.stats.hits(),
            misses: self.stats.misses(),
            evictions: self.stats.evictions(),
            conflicts: self.stats.conflicts(),
        })
    }

    fn sweep_expired(&self) -> usize {
        self.cache.purge_expired()
    }
}
