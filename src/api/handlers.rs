//! API Handlers
//!
//! HTTP request handlers for each store server endpoint. Every handler runs
//! its store call under a child of the server-wide shutdown token, so a
//! shutdown aborts in-flight work instead of waiting on it.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tokio_util::sync::CancellationToken;

use crate::error::{KvsError, Result};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, IncRequest, IncResponse, KeysQuery,
    KeysResponse, SetRequest, SetResponse, StatsResponse,
};
use crate::options::{ReadOptions, WriteOptions};
use crate::store::Store;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Backend selected at startup
    pub store: Arc<dyn Store>,
    /// Cancelled when the server shuts down
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Creates a new AppState around the given store.
    pub fn new(store: Arc<dyn Store>, shutdown: CancellationToken) -> Self {
        Self { store, shutdown }
    }

    /// Token for a single request.
    fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(KvsError::InvalidRequest(error_msg));
    }

    let cx = state.request_token();
    let opts = req.write_options();
    state
        .store
        .set(&cx, &req.key, req.value.into_bytes(), opts)
        .await?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let cx = state.request_token();
    let value = state.store.get(&cx, &key, ReadOptions::new()).await?;

    Ok(Json(GetResponse::new(key, &value)))
}

/// Handler for DELETE /del/:key
///
/// Deleting an absent key still succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let cx = state.request_token();
    state.store.delete(&cx, &key, WriteOptions::new()).await?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /inc
pub async fn inc_handler(
    State(state): State<AppState>,
    Json(req): Json<IncRequest>,
) -> Result<Json<IncResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(KvsError::InvalidRequest(error_msg));
    }

    let cx = state.request_token();
    let value = state
        .store
        .inc(&cx, &req.key, req.delta, req.write_options())
        .await?;

    Ok(Json(IncResponse::new(req.key, value)))
}

/// Handler for GET /keys
pub async fn keys_handler(
    State(state): State<AppState>,
    Query(query): Query<KeysQuery>,
) -> Result<Json<KeysResponse>> {
    let cx = state.request_token();
    let opts = ReadOptions {
        prefix: query.prefix.filter(|p| !p.is_empty()),
    };
    let keys = state.store.keys(&cx, opts).await?.collect().await?;

    Ok(Json(KeysResponse::new(keys)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.store.to_string(),
        state.store.stats(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
