//! Response DTOs for the store server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;

use crate::store::StoreStats;

/// Response body for the GET operation (GET /get/:key)
///
/// Values that are valid UTF-8 are returned as-is. Anything else is
/// base64-encoded and flagged with `"encoding": "base64"`.
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<&'static str>,
}

impl GetResponse {
    /// Creates a new GetResponse from the raw stored bytes
    pub fn new(key: impl Into<String>, value: &[u8]) -> Self {
        let (value, encoding) = match std::str::from_utf8(value) {
            Ok(text) => (text.to_string(), None),
            Err(_) => (STANDARD.encode(value), Some("base64")),
        };
        Self {
            key: key.into(),
            value,
            encoding,
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for the increment operation (POST /inc)
#[derive(Debug, Clone, Serialize)]
pub struct IncResponse {
    pub key: String,
    /// Counter value after the increment
    pub value: i64,
}

impl IncResponse {
    pub fn new(key: impl Into<String>, value: i64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for key enumeration (GET /keys)
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    pub keys: Vec<String>,
    pub count: usize,
}

impl KeysResponse {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            count: keys.len(),
            keys,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
///
/// `stats` is omitted for backends that keep no local counters.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Human-readable backend description
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<StoreStats>,
    /// Hit rate (hits / (hits + misses))
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hit_rate: Option<f64>,
}

impl StatsResponse {
    /// Creates a new StatsResponse from backend counters
    pub fn new(backend: impl Into<String>, stats: Option<StoreStats>) -> Self {
        let hit_rate = stats.as_ref().map(StoreStats::hit_rate);
        Self {
            backend: backend.into(),
            stats,
            hit_rate,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
