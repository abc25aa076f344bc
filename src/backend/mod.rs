//! Backend Selection
//!
//! Maps the scheme of a connection descriptor onto a [`Store`]
//! implementation.
//!
//! # Schemes
//! - `memory` - in-process bounded cache ([`MemoryStore`])
//! - `redis` - networked Redis store (requires the `redis` feature)

#[cfg(feature = "redis")]
mod redis_store;

#[cfg(feature = "redis")]
pub use redis_store::{RedisConfig, RedisStore, SCHEME as REDIS_SCHEME};

use std::sync::Arc;

use tracing::info;

use crate::cache::{MemoryStore, SCHEME as MEMORY_SCHEME};
use crate::error::{KvsError, Result};
use crate::store::Store;

/// Returns the scheme part of `dsn`, everything before the first `:`.
pub fn scheme(dsn: &str) -> &str {
    match dsn.find(':') {
        Some(idx) if idx > 0 => &dsn[..idx],
        _ => dsn,
    }
}

// == Open ==
/// Opens the store described by `dsn`.
pub async fn open(dsn: &str) -> Result<Arc<dyn Store>> {
    let store: Arc<dyn Store> = match scheme(dsn) {
        MEMORY_SCHEME => Arc::new(MemoryStore::open(dsn)?),
        #[cfg(feature = "redis")]
        REDIS_SCHEME => Arc::new(RedisStore::open(dsn).await?),
        other => {
            return Err(KvsError::Unsupported(format!(
                "no backend for scheme '{other}'"
            )))
        }
    };
    info!(backend = %store, "store opened");
    Ok(store)
}
