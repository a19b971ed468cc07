//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and
//! policy-driven expiration.
//!
//! The map lock is held for single map operations only. Policy evaluation
//! always runs on an entry snapshot with the lock released.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Map;
use tracing::{debug, warn};

use crate::cache::{
    CacheEntry, CacheReport, CacheStats, Clock, ExpirePolicy, LruTracker, MultiFieldValue,
    StatsCollector, SystemClock, Ttl, MAX_KEY_LENGTH,
};
use crate::config::StoreConfig;
use crate::error::{CacheError, PolicyError, Result};

/// Number of entries a sweep evaluates per lock acquisition.
pub const SWEEP_BATCH_SIZE: usize = 64;

// == Sweep Outcome ==
/// Summary of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Entries evaluated
    pub scanned: usize,
    /// Entries removed as expired
    pub expired: usize,
    /// Entries kept because the policy failed on them
    pub faults: usize,
}

#[derive(Debug, Default)]
struct StoreInner {
    entries: HashMap<String, Arc<CacheEntry>>,
    lru: LruTracker,
}

impl StoreInner {
    /// Removes `key` only if it still maps to `entry`.
    fn remove_if_same(&mut self, key: &str, entry: &Arc<CacheEntry>) -> bool {
        let same = self
            .entries
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, entry));
        if same {
            self.entries.remove(key);
            self.lru.remove(key);
        }
        same
    }
}

// == Cache Store ==
/// Concurrent multi-field cache with LRU eviction and pluggable expiration.
///
/// All operations take `&self`; share the store behind an `Arc`.
#[derive(Debug)]
pub struct CacheStore {
    inner: Mutex<StoreInner>,
    policy: Arc<dyn ExpirePolicy>,
    stats: StatsCollector,
    clock: Arc<dyn Clock>,
    capacity: Option<usize>,
    default_ttl_ms: u64,
    sweep_interval: Duration,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store using the system clock.
    ///
    /// Fails with `CacheError::Config` for a zero capacity, a default TTL
    /// under one millisecond, a zero sweep interval or an unbuildable policy.
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let policy = config.policy.build()?;
        Ok(Self {
            inner: Mutex::new(StoreInner::default()),
            policy,
            stats: StatsCollector::new(),
            clock: Arc::new(SystemClock),
            capacity: config.capacity,
            default_ttl_ms: config.default_ttl.as_millis() as u64,
            sweep_interval: config.sweep_interval,
        })
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replaces the configured policy, e.g. with a custom implementation.
    pub fn with_policy(mut self, policy: Arc<dyn ExpirePolicy>) -> Self {
        self.policy = policy;
        self
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns `Ok(None)` for absent keys (a miss) and for entries the policy
    /// finds stale (an expiration; the entry is removed). A failing policy
    /// leaves the entry in place and returns `CacheError::Policy`.
    pub fn get(&self, key: &str) -> Result<Option<Arc<MultiFieldValue>>> {
        let entry = self.inner.lock().entries.get(key).cloned();
        let Some(entry) = entry else {
            self.stats.record_miss();
            return Ok(None);
        };

        let now = self.clock.now_ms();
        match self.evaluate(&entry, now) {
            Ok(false) => {
                if self.policy.tracks_access() {
                    entry.touch(now);
                }
                {
                    let mut inner = self.inner.lock();
                    if inner
                        .entries
                        .get(key)
                        .is_some_and(|current| Arc::ptr_eq(current, &entry))
                    {
                        inner.lru.touch(key);
                    }
                }
                self.stats.record_hit();
                Ok(Some(entry.value().clone()))
            }
            Ok(true) => {
                if self.inner.lock().remove_if_same(key, &entry) {
                    self.stats.record_expiration();
                    debug!(key, "expired entry removed on read");
                } else {
                    // Replaced or removed by another caller meanwhile
                    self.stats.record_miss();
                }
                Ok(None)
            }
            Err(source) => {
                self.stats.record_policy_fault();
                warn!(key, error = %source, policy = self.policy.name(), "expiration policy failed");
                Err(CacheError::Policy {
                    key: key.to_string(),
                    source,
                })
            }
        }
    }

    // == Put ==
    /// Stores a value, replacing any existing entry for `key`.
    ///
    /// A new key arriving at capacity displaces the least recently used entry
    /// first. Replacing an existing key never displaces anything. A displaced
    /// entry the policy already finds stale counts as an expiration, any other
    /// as an eviction.
    pub fn put(&self, key: impl Into<String>, value: MultiFieldValue, ttl: Ttl) -> Result<()> {
        let key = key.into();
        validate_key(&key)?;

        let now = self.clock.now_ms();
        let entry = Arc::new(CacheEntry::new(value, ttl, now));
        let mut displaced = Vec::new();

        let replaced = {
            let mut inner = self.inner.lock();
            let replaced = inner.entries.contains_key(&key);

            if let (false, Some(capacity)) = (replaced, self.capacity) {
                while inner.entries.len() >= capacity {
                    let Some(victim) = inner.lru.evict_oldest() else {
                        return Err(CacheError::Internal(
                            "eviction order out of sync with entries".to_string(),
                        ));
                    };
                    if let Some(old) = inner.entries.remove(&victim) {
                        displaced.push((victim, old));
                    }
                }
            }

            inner.entries.insert(key.clone(), entry);
            inner.lru.touch(&key);
            replaced
        };

        for (victim, old) in displaced {
            match self.evaluate(&old, now) {
                Ok(true) => {
                    self.stats.record_expiration();
                    debug!(key = %victim, "displaced entry was already expired");
                }
                Ok(false) => {
                    self.stats.record_eviction();
                    debug!(key = %victim, "evicted least recently used entry");
                }
                Err(source) => {
                    self.stats.record_eviction();
                    warn!(key = %victim, error = %source, "expiration policy failed on evicted entry");
                }
            }
        }
        if replaced {
            self.stats.record_replacement();
        }
        self.stats.record_put();

        Ok(())
    }

    // == Remove ==
    /// Removes an entry by key, returning whether anything was removed.
    pub fn remove(&self, key: &str) -> bool {
        let removed = {
            let mut inner = self.inner.lock();
            let removed = inner.entries.remove(key).is_some();
            if removed {
                inner.lru.remove(key);
            }
            removed
        };

        if removed {
            self.stats.record_removal();
        }
        removed
    }

    // == Sweep ==
    /// Removes every entry the policy finds stale at the current time.
    ///
    /// Keys are snapshotted once, then evaluated in batches of
    /// `SWEEP_BATCH_SIZE`, re-acquiring the lock per batch so concurrent
    /// callers interleave with the pass.
    pub fn sweep(&self) -> SweepOutcome {
        let now = self.clock.now_ms();
        let keys: Vec<String> = self.inner.lock().entries.keys().cloned().collect();
        let mut outcome = SweepOutcome::default();

        for batch in keys.chunks(SWEEP_BATCH_SIZE) {
            let snapshot: Vec<(&String, Arc<CacheEntry>)> = {
                let inner = self.inner.lock();
                batch
                    .iter()
                    .filter_map(|key| inner.entries.get(key).map(|e| (key, e.clone())))
                    .collect()
            };

            let mut stale = Vec::new();
            for (key, entry) in snapshot {
                outcome.scanned += 1;
                match self.evaluate(&entry, now) {
                    Ok(true) => stale.push((key, entry)),
                    Ok(false) => {}
                    Err(source) => {
                        outcome.faults += 1;
                        self.stats.record_policy_fault();
                        warn!(key = %key, error = %source, "expiration policy failed during sweep");
                    }
                }
            }

            if stale.is_empty() {
                continue;
            }

            let mut inner = self.inner.lock();
            for (key, entry) in stale {
                if inner.remove_if_same(key, &entry) {
                    outcome.expired += 1;
                    self.stats.record_expiration();
                }
            }
        }

        outcome
    }

    // == Report ==
    /// Returns counters plus current size, capacity and policy diagnostics.
    pub fn report(&self) -> CacheReport {
        let mut policy = Map::new();
        policy.insert("name".into(), self.policy.name().into());
        if let Some(reportable) = self.policy.as_reportable() {
            reportable.report(&mut policy);
        }
        CacheReport::new(self.stats.snapshot(), self.len(), self.capacity, policy)
    }

    /// Returns the raw counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Zeroes every counter.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    // == Diagnostics ==
    /// Milliseconds until `key` would expire, if the policy can tell.
    ///
    /// Does not touch statistics, access times or recency.
    pub fn ttl_remaining_ms(&self, key: &str) -> Option<u64> {
        let entry = self.inner.lock().entries.get(key).cloned()?;
        self.policy.remaining_ms(
            entry.value(),
            entry.times(),
            self.clock.now_ms(),
            entry.ttl().resolve(self.default_ttl_ms),
        )
    }

    /// True if `key` is stored, whether or not it is still valid.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    pub fn policy(&self) -> &Arc<dyn ExpirePolicy> {
        &self.policy
    }

    fn evaluate(&self, entry: &CacheEntry, now: u64) -> std::result::Result<bool, PolicyError> {
        self.policy.is_expired(
            entry.value(),
            entry.times(),
            now,
            entry.ttl().resolve(self.default_ttl_ms),
        )
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
