//! Mini KVS - uniform key-value store contract with pluggable backends
//!
//! Provides a bounded in-memory cache with byte-budget LRU eviction and TTL
//! expiry, an optional Redis backend, and a small HTTP host for either.

pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod iter;
pub mod models;
pub mod options;
pub mod size;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{MemoryConfig, MemoryStore};
pub use config::Config;
pub use error::{KvsError, Result};
pub use iter::KeyIter;
pub use options::{ReadOptions, WriteOptions};
pub use store::{Store, StoreStats};
pub use tasks::spawn_sweep_task;
pub use tokio_util::sync::CancellationToken;
