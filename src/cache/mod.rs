//! Cache Module
//!
//! The in-process backend: an expiring LRU map, byte-budget accounting and
//! the [`MemoryStore`] that ties them together.

mod capacity;
mod config;
mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use capacity::CapacityTracker;
pub use config::{MemoryConfig, SCHEME};
pub use entry::CacheEntry;
pub use lru::{EvictFn, ExpiringLru, Removal};
pub use stats::CacheStats;
pub use store::MemoryStore;

// == Public Constants ==
/// Ceiling on evictions per write and on optimistic increment retries
pub const MAX_ATTEMPTS: usize = 10;
