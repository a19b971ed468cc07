//! API Module
//!
//! Thin HTTP adapter over the cache store.
//!
//! # Endpoints
//! - `PUT /entries/:key` - Store a multi-field value
//! - `GET /entries/:key` - Retrieve a value by key
//! - `DELETE /entries/:key` - Remove a key
//! - `GET /report` - Cache statistics report
//! - `POST /report/reset` - Zero the statistics counters
//! - `GET /health` - Health check endpoint

pub mod client;
pub mod handlers;
pub mod routes;

pub use client::ClientAddr;
pub use handlers::*;
pub use routes::create_router;
