//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;

/// Connection descriptor used when `KVS_DSN` is unset.
pub const DEFAULT_DSN: &str = "memory:?keys=10000&bytes=64MB";

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection descriptor selecting the store backend
    pub dsn: String,
    /// HTTP server port
    pub server_port: u16,
    /// Background sweep interval in seconds
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `KVS_DSN` - Store connection descriptor (default: `memory:?keys=10000&bytes=64MB`)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Expiry sweep frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        Self {
            dsn: env::var("KVS_DSN")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DSN.to_string()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            sweep_interval: env::var("SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(1),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dsn: DEFAULT_DSN.to_string(),
            server_port: 3000,
            sweep_interval: 1,
        }
    }
}
