//! Store Scenario Tests
//!
//! Exercises the cache engine through its public API only.

use std::sync::Arc;
use std::time::Duration;

use fieldcache::cache::{
    CacheStore, EntryTimes, ExpirePolicy, ManualClock, MultiFieldValue, PolicySettings,
    Reportable, TtlPolicy, Ttl,
};
use fieldcache::{CacheError, CacheSettings, PolicyError, StoreConfig, Sweeper};
use serde_json::{json, Map, Value};

/// Custom policy: entries with `pinned: true` never expire, others follow TTL.
#[derive(Debug)]
struct PinnedPolicy;

impl ExpirePolicy for PinnedPolicy {
    fn name(&self) -> &str {
        "pinned"
    }

    fn is_expired(
        &self,
        value: &MultiFieldValue,
        times: EntryTimes,
        now: u64,
        ttl: Option<u64>,
    ) -> Result<bool, PolicyError> {
        match value.get("pinned") {
            Some(Value::Bool(true)) => Ok(false),
            Some(Value::Bool(false)) | None => TtlPolicy.is_expired(value, times, now, ttl),
            Some(other) => Err(PolicyError::new(format!("pinned must be a bool, got {}", other))),
        }
    }

    fn as_reportable(&self) -> Option<&dyn Reportable> {
        Some(self)
    }
}

impl Reportable for PinnedPolicy {
    fn report(&self, out: &mut Map<String, Value>) {
        out.insert("field".into(), "pinned".into());
    }
}

fn store_from_json(raw: &str, clock: &ManualClock) -> CacheStore {
    let config = CacheSettings::from_json(raw).unwrap().validate().unwrap();
    CacheStore::new(config).unwrap().with_clock(clock.clone())
}

#[test]
fn capacity_two_eviction_then_expiration() {
    let clock = ManualClock::new(0);
    let store = store_from_json(r#"{"capacity": 2, "default_ttl_ms": 10}"#, &clock);

    store.put("a", MultiFieldValue::new().with("x", 1), Ttl::Default).unwrap();
    clock.set(1);
    store.put("b", MultiFieldValue::new().with("x", 2), Ttl::Default).unwrap();
    clock.set(2);
    store.put("c", MultiFieldValue::new().with("x", 3), Ttl::Default).unwrap();

    let report = store.report();
    assert_eq!(report.current_size, 2);
    assert_eq!(report.evictions, 1);

    clock.set(3);
    assert!(store.get("a").unwrap().is_none());
    assert_eq!(store.report().misses, 1);

    clock.set(12);
    assert!(store.get("b").unwrap().is_none());
    let report = store.report();
    assert_eq!(report.expirations, 1);
    assert_eq!(report.misses, 1);
    assert_eq!(report.current_size, 1);
}

#[test]
fn never_expiring_entry_survives() {
    let clock = ManualClock::new(0);
    let store = store_from_json(r#"{"default_ttl_ms": 1}"#, &clock);

    store
        .put("config", MultiFieldValue::new().with("mode", "fast"), Ttl::from_millis(Ttl::NEVER_MILLIS))
        .unwrap();
    clock.set(u64::MAX);

    let value = store.get("config").unwrap().unwrap();
    assert_eq!(value.get("mode"), Some(&json!("fast")));
}

#[test]
fn custom_policy_pins_entries() {
    let clock = ManualClock::new(0);
    let store = store_from_json(r#"{"default_ttl_ms": 10}"#, &clock)
        .with_policy(Arc::new(PinnedPolicy));

    store.put("pinned", MultiFieldValue::new().with("pinned", true), Ttl::Default).unwrap();
    store.put("plain", MultiFieldValue::new().with("pinned", false), Ttl::Default).unwrap();
    store.put("broken", MultiFieldValue::new().with("pinned", "yes"), Ttl::Default).unwrap();
    clock.set(100);

    assert!(store.get("pinned").unwrap().is_some());
    assert!(store.get("plain").unwrap().is_none());
    assert!(matches!(store.get("broken"), Err(CacheError::Policy { .. })));

    let report = store.report();
    assert_eq!(report.policy_faults, 1);
    assert_eq!(report.policy.get("name"), Some(&json!("pinned")));
    assert_eq!(report.policy.get("field"), Some(&json!("pinned")));
}

#[test]
fn composite_policy_from_settings() {
    let clock = ManualClock::new(0);
    let store = store_from_json(
        r#"{
            "default_ttl_ms": 1000,
            "expire_policy": {
                "type": "composite",
                "policies": [{"type": "ttl"}, {"type": "deadline_field", "field": "valid_until"}]
            }
        }"#,
        &clock,
    );

    store
        .put("offer", MultiFieldValue::new().with("valid_until", 50), Ttl::Default)
        .unwrap();
    store.put("plain", MultiFieldValue::new(), Ttl::Default).unwrap();

    assert_eq!(store.ttl_remaining_ms("offer"), Some(50));
    clock.set(60);
    assert!(store.get("offer").unwrap().is_none());
    assert!(store.get("plain").unwrap().is_some());

    clock.set(1_000);
    assert!(store.get("plain").unwrap().is_none());
    assert_eq!(store.report().expirations, 2);
}

#[test]
fn invalid_settings_fail_fast() {
    let negative = CacheSettings::from_json(r#"{"capacity": -3}"#).unwrap();
    assert!(matches!(negative.validate(), Err(CacheError::Config(_))));

    assert!(matches!(
        CacheSettings::from_json(r#"{"expire_policy": {"type": "lfu"}}"#),
        Err(CacheError::Config(_))
    ));

    let unset = CacheSettings::from_json("{}").unwrap().validate().unwrap();
    assert_eq!(unset, StoreConfig::default());
    assert_eq!(unset.policy, PolicySettings::Ttl);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_traffic_with_background_sweep() {
    let clock = ManualClock::new(0);
    let store = Arc::new(
        CacheStore::new(StoreConfig {
            capacity: Some(100),
            default_ttl: Duration::from_millis(30),
            sweep_interval: Duration::from_millis(5),
            ..Default::default()
        })
        .unwrap()
        .with_clock(clock.clone()),
    );
    let sweeper = Sweeper::start(&store);

    let workers: Vec<_> = (0..4u64)
        .map(|w| {
            let store = store.clone();
            let clock = clock.clone();
            tokio::spawn(async move {
                for i in 0..300u64 {
                    let key = format!("k{}", (w * 97 + i) % 150);
                    store
                        .put(key.clone(), MultiFieldValue::new().with("i", i), Ttl::Default)
                        .unwrap();
                    store.get(&key).unwrap();
                    if i % 10 == 0 {
                        clock.advance(1);
                        tokio::task::yield_now().await;
                    }
                }
            })
        })
        .collect();
    for worker in workers {
        worker.await.unwrap();
    }

    clock.advance(1_000);
    tokio::time::sleep(Duration::from_millis(100)).await;
    sweeper.stop().await;

    let report = store.report();
    assert_eq!(report.current_size, 0);
    // Reads that found a stale entry count as expirations, the rest as hits or misses
    assert!(report.hits + report.misses <= 1_200);
    assert!(report.hits + report.misses + report.expirations >= 1_200);
    assert_eq!(
        report.puts - report.replacements - report.removals - report.expirations - report.evictions,
        0
    );
}
