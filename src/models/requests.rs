//! Request DTOs for the store server API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use std::time::Duration;

use serde::Deserialize;

use crate::options::WriteOptions;

/// Longest key accepted over HTTP.
pub const MAX_KEY_LEN: usize = 256;

fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LEN {
        return Some(format!(
            "Key exceeds maximum length of {MAX_KEY_LEN} characters"
        ));
    }
    None
}

fn write_options(ttl: Option<u64>) -> WriteOptions {
    match ttl {
        Some(secs) if secs > 0 => WriteOptions::new().with_ttl(Duration::from_secs(secs)),
        _ => WriteOptions::new(),
    }
}

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The key to store the value under
/// - `value`: The value to store, kept as its UTF-8 bytes
/// - `ttl`: Optional TTL in seconds (backend default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }

    pub fn write_options(&self) -> WriteOptions {
        write_options(self.ttl)
    }
}

/// Request body for the increment operation (POST /inc)
#[derive(Debug, Clone, Deserialize)]
pub struct IncRequest {
    pub key: String,
    /// Amount to add, may be negative
    #[serde(default = "default_delta")]
    pub delta: i64,
    #[serde(default)]
    pub ttl: Option<u64>,
}

fn default_delta() -> i64 {
    1
}

impl IncRequest {
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }

    pub fn write_options(&self) -> WriteOptions {
        write_options(self.ttl)
    }
}

/// Query string for key enumeration (GET /keys?prefix=)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeysQuery {
    #[serde(default)]
    pub prefix: Option<String>,
}
