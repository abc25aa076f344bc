//! Error types for the key-value stores
//!
//! Provides unified error handling using thiserror. Every backend reports
//! failures through [`KvsError`], and the HTTP layer maps each variant onto a
//! status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Kvs Error Enum ==
/// Unified error type for all store backends.
#[derive(Error, Debug)]
pub enum KvsError {
    /// Key not present in the store
    #[error("Not found: {0}")]
    NotFound(String),

    /// Connection descriptor could not be parsed
    #[error("Invalid DSN: {0}")]
    InvalidDsn(String),

    /// Operation or backend not supported
    #[error("Not supported: {0}")]
    Unsupported(String),

    /// Key enumeration is exhausted
    #[error("Result set closed")]
    Closed,

    /// Write cannot be admitted even after eviction
    #[error("Exceeded capacity: {0}")]
    CapacityExceeded(String),

    /// Increment target is not a base-10 integer
    #[error("Incremented value must be an integer: {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// Increment lost every optimistic retry to concurrent writers
    #[error("Too many conflicting updates: {0}")]
    Conflict(String),

    /// Caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Networked backend failure
    #[error("Backend error: {0}")]
    Backend(String),
}

impl KvsError {
    /// True when the error is the normal end-of-sequence marker.
    pub fn is_closed(&self) -> bool {
        matches!(self, KvsError::Closed)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, KvsError::NotFound(_))
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for KvsError {
    fn from(err: redis::RedisError) -> Self {
        KvsError::Backend(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for KvsError {
    fn into_response(self) -> Response {
        let status = match &self {
            KvsError::NotFound(_) => StatusCode::NOT_FOUND,
            KvsError::InvalidDsn(_)
            | KvsError::InvalidValue { .. }
            | KvsError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            KvsError::Conflict(_) => StatusCode::CONFLICT,
            KvsError::CapacityExceeded(_) | KvsError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            KvsError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
            KvsError::Backend(_) => StatusCode::BAD_GATEWAY,
            KvsError::Closed => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for store operations.
pub type Result<T> = std::result::Result<T, KvsError>;
