//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies. The report
//! endpoint serializes `CacheReport` directly.

use serde::Serialize;

use crate::cache::MultiFieldValue;

/// Response body for reading an entry (GET /entries/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored fields
    pub fields: MultiFieldValue,
    /// Milliseconds until expiry, absent when the entry never expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_remaining_ms: Option<u64>,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(
        key: impl Into<String>,
        fields: MultiFieldValue,
        ttl_remaining_ms: Option<u64>,
    ) -> Self {
        Self {
            key: key.into(),
            fields,
            ttl_remaining_ms,
        }
    }
}

/// Response body for storing an entry (PUT /entries/:key)
#[derive(Debug, Clone, Serialize)]
pub struct PutResponse {
    /// Success message
    pub message: String,
    /// The key that was stored
    pub key: String,
}

impl PutResponse {
    /// Creates a new PutResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' stored successfully", key),
            key,
        }
    }
}

/// Response body for removing an entry (DELETE /entries/:key)
///
/// Removing an absent key is not an error; `removed` reports whether
/// anything was deleted.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// The key that was targeted
    pub key: String,
    /// Whether an entry was removed
    pub removed: bool,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>, removed: bool) -> Self {
        Self {
            key: key.into(),
            removed,
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_response_serialize() {
        let fields = MultiFieldValue::new().with("name", "alice");
        let resp = GetResponse::new("user:1", fields, Some(1_500));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            json,
            json!({"key": "user:1", "fields": {"name": "alice"}, "ttl_remaining_ms": 1500})
        );
    }

    #[test]
    fn test_get_response_omits_missing_ttl() {
        let resp = GetResponse::new("k", MultiFieldValue::new(), None);
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("ttl_remaining_ms").is_none());
    }

    #[test]
    fn test_put_response_serialize() {
        let resp = PutResponse::new("my_key");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("my_key"));
        assert!(json.contains("successfully"));
    }

    #[test]
    fn test_delete_response_serialize() {
        let json = serde_json::to_value(DeleteResponse::new("gone", false)).unwrap();
        assert_eq!(json, json!({"key": "gone", "removed": false}));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
