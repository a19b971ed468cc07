//! API Handlers
//!
//! HTTP request handlers exposing the cache store to remote callers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;

use super::client::ClientAddr;
use crate::cache::{CacheReport, CacheStore};
use crate::config::{Config, DEFAULT_FORWARDED_HEADER};
use crate::error::{CacheError, Result};
use crate::models::{DeleteResponse, GetResponse, HealthResponse, PutRequest, PutResponse};

/// Application state shared across all handlers.
///
/// The store synchronizes internally, so handlers share it through a plain `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache store
    pub store: Arc<CacheStore>,
    /// Header consulted for the client address
    pub forwarded_header: Arc<str>,
}

impl AppState {
    /// Creates a new AppState with the default forwarded header.
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self {
            store,
            forwarded_header: Arc::from(DEFAULT_FORWARDED_HEADER),
        }
    }

    /// Overrides the header consulted for the client address.
    pub fn with_forwarded_header(mut self, header: impl AsRef<str>) -> Self {
        self.forwarded_header = Arc::from(header.as_ref());
        self
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = CacheStore::new(config.store.clone())?;
        Ok(Self::new(Arc::new(store)).with_forwarded_header(&config.forwarded_header))
    }
}

/// Handler for PUT /entries/:key
pub async fn put_handler(
    State(state): State<AppState>,
    ClientAddr(client): ClientAddr,
    Path(key): Path<String>,
    Json(req): Json<PutRequest>,
) -> Result<Json<PutResponse>> {
    debug!(%client, %key, "put");
    let ttl = req.ttl();
    state.store.put(key.clone(), req.fields, ttl)?;

    Ok(Json(PutResponse::new(key)))
}

/// Handler for GET /entries/:key
pub async fn get_handler(
    State(state): State<AppState>,
    ClientAddr(client): ClientAddr,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    debug!(%client, %key, "get");
    let value = state
        .store
        .get(&key)?
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;
    let ttl_remaining_ms = state.store.ttl_remaining_ms(&key);

    Ok(Json(GetResponse::new(
        key,
        (*value).clone(),
        ttl_remaining_ms,
    )))
}

/// Handler for DELETE /entries/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    ClientAddr(client): ClientAddr,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    debug!(%client, %key, "delete");
    let removed = state.store.remove(&key);

    Json(DeleteResponse::new(key, removed))
}

/// Handler for GET /report
pub async fn report_handler(State(state): State<AppState>) -> Json<CacheReport> {
    Json(state.store.report())
}

/// Handler for POST /report/reset
///
/// Returns the report as it stood before the counters were zeroed.
pub async fn reset_report_handler(State(state): State<AppState>) -> Json<CacheReport> {
    let report = state.store.report();
    state.store.reset_stats();
    Json(report)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
