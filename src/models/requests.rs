//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::cache::{MultiFieldValue, Ttl};

/// Request body for storing an entry (PUT /entries/:key)
///
/// # Fields
/// - `fields`: The named fields to store
/// - `ttl_ms`: Optional TTL in milliseconds; zero or negative uses the
///   store default, `9223372036854775807` never expires
#[derive(Debug, Clone, Deserialize)]
pub struct PutRequest {
    /// The value to store
    pub fields: MultiFieldValue,
    /// Optional TTL in milliseconds
    #[serde(default)]
    pub ttl_ms: Option<i64>,
}

impl PutRequest {
    /// Interprets the requested TTL.
    pub fn ttl(&self) -> Ttl {
        Ttl::from(self.ttl_ms)
    }
}
