//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, expirations and evictions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde_json::{Map, Value};

// == Stats Collector ==
/// Thread-safe counters updated by the store.
///
/// Each counter is a single atomic, so a snapshot never sees a partially
/// updated value. Counters are not read together atomically; a snapshot
/// taken during traffic is approximate.
#[derive(Debug, Default)]
pub struct StatsCollector {
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
    evictions: AtomicU64,
    puts: AtomicU64,
    removals: AtomicU64,
    replacements: AtomicU64,
    policy_faults: AtomicU64,
}

impl StatsCollector {
    // == Constructor ==
    /// Creates a new collector with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expiration(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_removal(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    /// A put that overwrote a live entry.
    pub fn record_replacement(&self) {
        self.replacements.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_policy_fault(&self) {
        self.policy_faults.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Reads every counter once.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            replacements: self.replacements.load(Ordering::Relaxed),
            policy_faults: self.policy_faults.load(Ordering::Relaxed),
        }
    }

    // == Reset ==
    /// Sets all counters back to zero.
    pub fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.expirations,
            &self.evictions,
            &self.puts,
            &self.removals,
            &self.replacements,
            &self.policy_faults,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

// == Cache Stats ==
/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads that returned a live value
    pub hits: u64,
    /// Reads of absent keys
    pub misses: u64,
    /// Entries removed because a policy found them stale (on read or sweep)
    pub expirations: u64,
    /// Live entries removed to respect capacity
    pub evictions: u64,
    pub puts: u64,
    /// Successful explicit removals
    pub removals: u64,
    /// Puts that overwrote a live key
    pub replacements: u64,
    /// Policy evaluations that failed
    pub policy_faults: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Returns hits / (hits + misses + expirations), or 0.0 before any read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.expirations;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Cache Report ==
/// Monitoring snapshot returned by `CacheStore::report`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheReport {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub evictions: u64,
    pub puts: u64,
    pub removals: u64,
    pub replacements: u64,
    pub policy_faults: u64,
    pub current_size: usize,
    /// `None` when the store is unbounded
    pub capacity: Option<usize>,
    pub hit_rate: f64,
    /// Expiration policy diagnostics
    pub policy: Map<String, Value>,
    /// RFC 3339 generation time
    pub generated_at: String,
}

impl CacheReport {
    pub fn new(
        stats: CacheStats,
        current_size: usize,
        capacity: Option<usize>,
        policy: Map<String, Value>,
    ) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            expirations: stats.expirations,
            evictions: stats.evictions,
            puts: stats.puts,
            removals: stats.removals,
            replacements: stats.replacements,
            policy_faults: stats.policy_faults,
            current_size,
            capacity,
            hit_rate: stats.hit_rate(),
            policy,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Renders the report as a tree of name/value pairs.
    pub fn to_tree(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
