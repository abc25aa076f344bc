//! Per-call options for store reads and writes.

use std::time::Duration;

/// Options accepted by read operations (`get`, `keys`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Restrict key enumeration to keys starting with this prefix
    pub prefix: Option<String>,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Returns true if `key` passes the prefix filter.
    pub fn matches(&self, key: &str) -> bool {
        match self.prefix.as_deref() {
            Some(prefix) => key.starts_with(prefix),
            None => true,
        }
    }
}

/// Options accepted by write operations (`set`, `inc`, `delete`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Expiry for the written entry; overrides the store default
    pub ttl: Option<Duration>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}
