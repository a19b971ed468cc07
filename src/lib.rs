//! fieldcache - A concurrent in-process multi-field cache
//!
//! Stores multi-field values under time-bounded validity, enforced by
//! pluggable expiration policies, with LRU eviction, a background sweep
//! and runtime statistics.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStore, MultiFieldValue, Ttl};
pub use config::{CacheSettings, Config, StoreConfig};
pub use error::{CacheError, PolicyError, Result};
pub use tasks::Sweeper;
