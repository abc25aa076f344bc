//! Memory Store Configuration
//!
//! Limits for the in-process backend, built either with the `with_*`
//! builders or parsed from a `memory:` connection descriptor.

use std::time::Duration;

use url::Url;

use crate::error::{KvsError, Result};
use crate::size::parse_bytes;

/// DSN scheme served by the in-process backend.
pub const SCHEME: &str = "memory";

/// Limits of a memory store. Zero / `None` means unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryConfig {
    /// Maximum number of entries
    pub max_keys: u64,
    /// Maximum total bytes of stored values
    pub max_bytes: u64,
    /// Default expiry for entries written without their own TTL
    pub ttl: Option<Duration>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_keys(mut self, n: u64) -> Self {
        self.max_keys = n;
        self
    }

    pub fn with_max_bytes(mut self, n: u64) -> Self {
        self.max_bytes = n;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    // == From DSN ==
    /// Parses `memory`, `memory:` or `memory:?keys=N&bytes=SIZE&ttl=SECS`.
    ///
    /// `bytes` accepts human-readable sizes such as `10MB`. Unknown query
    /// parameters are ignored.
    pub fn from_dsn(dsn: &str) -> Result<Self> {
        if dsn == SCHEME {
            return Ok(Self::default());
        }

        let url = Url::parse(dsn).map_err(|e| KvsError::InvalidDsn(format!("{dsn}: {e}")))?;
        if url.scheme() != SCHEME {
            return Err(KvsError::InvalidDsn(format!(
                "expected scheme: {SCHEME} (got: '{}' in '{dsn}')",
                url.scheme()
            )));
        }

        let mut config = Self::default();
        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                "keys" => {
                    config.max_keys = value.parse().map_err(|e| {
                        KvsError::InvalidDsn(format!("Invalid key count: {value:?}: {e}"))
                    })?;
                }
                "bytes" => config.max_bytes = parse_bytes(&value)?,
                "ttl" => {
                    let secs: u64 = value.parse().map_err(|e| {
                        KvsError::InvalidDsn(format!("Invalid ttl: {value:?}: {e}"))
                    })?;
                    config.ttl = (secs > 0).then(|| Duration::from_secs(secs));
                }
                _ => {}
            }
        }
        Ok(config)
    }
}
