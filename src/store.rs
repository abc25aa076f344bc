//! Store Contract
//!
//! The abstract operation set every backend implements. Callers hold an
//! `Arc<dyn Store>` and never learn which backend sits behind it.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::iter::KeyIter;
use crate::options::{ReadOptions, WriteOptions};

// == Store Trait ==
/// Uniform key-value contract.
///
/// Every operation takes a cancellation token. Backends check it at entry and
/// between attempts of any internal retry loop. The `Display` impl gives a
/// human-readable description of the backend and its limits.
#[async_trait]
pub trait Store: fmt::Display + Send + Sync {
    /// Enumerates the keys present when the call is made.
    async fn keys(&self, cx: &CancellationToken, opts: ReadOptions) -> Result<KeyIter>;

    /// Fetches the value stored under `key`.
    async fn get(&self, cx: &CancellationToken, key: &str, opts: ReadOptions) -> Result<Vec<u8>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(
        &self,
        cx: &CancellationToken,
        key: &str,
        value: Vec<u8>,
        opts: WriteOptions,
    ) -> Result<()>;

    /// Adds `delta` to the integer stored under `key` and returns the sum.
    ///
    /// An absent key counts as zero.
    async fn inc(
        &self,
        cx: &CancellationToken,
        key: &str,
        delta: i64,
        opts: WriteOptions,
    ) -> Result<i64>;

    /// Removes `key`. Deleting an absent key is not an error.
    async fn delete(&self, cx: &CancellationToken, key: &str, opts: WriteOptions) -> Result<()>;

    /// Local counters, for backends that keep any.
    fn stats(&self) -> Option<StoreStats> {
        None
    }

    /// Drops expired entries eagerly and returns how many were removed.
    ///
    /// Backends with native expiry have nothing to do.
    fn sweep_expired(&self) -> usize {
        0
    }
}

// == Store Stats ==
/// Point-in-time counters reported by [`Store::stats`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    /// Live entries
    pub entries: u64,
    /// Configured byte budget, 0 when unbounded
    pub max_bytes: u64,
    /// Bytes currently held, 0 when unbounded
    pub used_bytes: u64,
    /// Successful reads
    pub hits: u64,
    /// Reads of absent or expired keys
    pub misses: u64,
    /// Entries evicted by the byte budget or the key limit
    pub evictions: u64,
    /// Increment attempts that lost to a concurrent writer
    pub conflicts: u64,
}

impl StoreStats {
    /// hits / (hits + misses), or 0.0 before any read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Cancellation ==
/// Fails with [`KvsError::Cancelled`](crate::KvsError::Cancelled) once `cx` fired.
pub(crate) fn ensure_live(cx: &CancellationToken) -> Result<()> {
    if cx.is_cancelled() {
        Err(crate::error::KvsError::Cancelled)
    } else {
        Ok(())
    }
}
