//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::MultiFieldValue;

// == TTL ==
/// Validity window requested for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ttl {
    /// Use the store's default TTL
    #[default]
    Default,
    /// Expire this many milliseconds after the reference time
    Millis(u64),
    /// Never expire
    Never,
}

impl Ttl {
    /// Raw millisecond value reserved for "never expires".
    pub const NEVER_MILLIS: i64 = i64::MAX;

    /// Interprets a raw millisecond TTL.
    ///
    /// Zero or negative selects the store default; `NEVER_MILLIS` never expires.
    pub fn from_millis(ms: i64) -> Self {
        if ms == Self::NEVER_MILLIS {
            Ttl::Never
        } else if ms <= 0 {
            Ttl::Default
        } else {
            Ttl::Millis(ms as u64)
        }
    }

    /// Resolves against the store default.
    ///
    /// Returns `None` when the entry never expires.
    pub fn resolve(self, default_ms: u64) -> Option<u64> {
        match self {
            Ttl::Default => Some(default_ms),
            Ttl::Millis(ms) => Some(ms),
            Ttl::Never => None,
        }
    }
}

impl From<Option<i64>> for Ttl {
    fn from(ms: Option<i64>) -> Self {
        ms.map(Ttl::from_millis).unwrap_or_default()
    }
}

// == Entry Times ==
/// Reference times handed to expiration policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryTimes {
    /// When the entry was written (ms)
    pub written: u64,
    /// Last successful read or write (ms), maintained best-effort
    pub last_access: u64,
}

// == Cache Entry ==
/// A stored value plus its write timestamp and TTL.
///
/// Entries are never replaced in place; a refresh writes a new entry.
/// Only the last-access time changes after creation.
#[derive(Debug)]
pub struct CacheEntry {
    value: Arc<MultiFieldValue>,
    timestamp: u64,
    ttl: Ttl,
    last_access: AtomicU64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry written at `now_ms`.
    pub fn new(value: MultiFieldValue, ttl: Ttl, now_ms: u64) -> Self {
        Self {
            value: Arc::new(value),
            timestamp: now_ms,
            ttl,
            last_access: AtomicU64::new(now_ms),
        }
    }

    // == Accessors ==
    pub fn value(&self) -> &Arc<MultiFieldValue> {
        &self.value
    }

    /// Write timestamp (ms).
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    pub fn last_access(&self) -> u64 {
        self.last_access.load(Ordering::Relaxed)
    }

    pub fn times(&self) -> EntryTimes {
        EntryTimes {
            written: self.timestamp,
            last_access: self.last_access(),
        }
    }

    // == Touch ==
    /// Records a read at `now_ms`.
    ///
    /// Never moves the access time backwards.
    pub fn touch(&self, now_ms: u64) {
        self.last_access.fetch_max(now_ms, Ordering::Relaxed);
    }
}
