//! API Module
//!
//! HTTP handlers and routing for the store server REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Delete a key
//! - `POST /inc` - Increment an integer value
//! - `GET /keys` - List keys, optionally by prefix
//! - `GET /stats` - Get backend statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
