//! Expiration Policy Module
//!
//! Pluggable strategies deciding whether a stored entry is stale.
//!
//! Policies hold configuration only. They are shared by every entry in a
//! store and evaluated without holding the store lock, so implementations
//! must be pure with respect to their inputs.

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cache::{EntryTimes, MultiFieldValue};
use crate::error::{CacheError, PolicyError, Result};

// == Expire Policy Trait ==
/// Decides whether an entry is expired.
pub trait ExpirePolicy: Send + Sync + Debug {
    /// Short identifier used in reports and logs.
    fn name(&self) -> &str;

    /// Returns true if the entry is stale at `now`.
    ///
    /// `ttl` is already resolved against the store default; `None` means the
    /// entry never expires by time.
    fn is_expired(
        &self,
        value: &MultiFieldValue,
        times: EntryTimes,
        now: u64,
        ttl: Option<u64>,
    ) -> std::result::Result<bool, PolicyError>;

    /// Whether the store must maintain last-access times for this policy.
    fn tracks_access(&self) -> bool {
        false
    }

    /// Milliseconds until the entry would expire, if the policy can tell.
    fn remaining_ms(
        &self,
        _value: &MultiFieldValue,
        _times: EntryTimes,
        _now: u64,
        _ttl: Option<u64>,
    ) -> Option<u64> {
        None
    }

    /// Diagnostics capability, if this policy has one.
    fn as_reportable(&self) -> Option<&dyn Reportable> {
        None
    }
}

// == Reportable Trait ==
/// Report-on-demand capability for diagnostics.
pub trait Reportable {
    /// Writes name/value pairs describing the component into `out`.
    fn report(&self, out: &mut Map<String, Value>);
}

/// True when `reference + ttl` has been reached. Overflow never expires.
fn deadline_reached(reference: u64, ttl: Option<u64>, now: u64) -> bool {
    match ttl.and_then(|ttl| reference.checked_add(ttl)) {
        Some(deadline) => now >= deadline,
        None => false,
    }
}

fn remaining(reference: u64, ttl: Option<u64>, now: u64) -> Option<u64> {
    ttl.map(|ttl| reference.saturating_add(ttl).saturating_sub(now))
}

// == TTL Policy ==
/// Expires entries a fixed TTL after they were written.
///
/// The deadline itself counts as expired (`now >= written + ttl`), so an
/// entry read exactly at `written + ttl` is already gone. This is one
/// millisecond earlier than a strict `written + ttl < now` check.
#[derive(Debug, Clone, Copy, Default)]
pub struct TtlPolicy;

impl ExpirePolicy for TtlPolicy {
    fn name(&self) -> &str {
        "ttl"
    }

    fn is_expired(
        &self,
        _value: &MultiFieldValue,
        times: EntryTimes,
        now: u64,
        ttl: Option<u64>,
    ) -> std::result::Result<bool, PolicyError> {
        Ok(deadline_reached(times.written, ttl, now))
    }

    fn remaining_ms(
        &self,
        _value: &MultiFieldValue,
        times: EntryTimes,
        now: u64,
        ttl: Option<u64>,
    ) -> Option<u64> {
        remaining(times.written, ttl, now)
    }

    fn as_reportable(&self) -> Option<&dyn Reportable> {
        Some(self)
    }
}

impl Reportable for TtlPolicy {
    fn report(&self, out: &mut Map<String, Value>) {
        out.insert("type".into(), "ttl".into());
        out.insert("reference".into(), "written".into());
    }
}

// == Sliding Policy ==
/// Expires entries a fixed TTL after they were last read or written.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlidingPolicy;

impl ExpirePolicy for SlidingPolicy {
    fn name(&self) -> &str {
        "sliding"
    }

    fn is_expired(
        &self,
        _value: &MultiFieldValue,
        times: EntryTimes,
        now: u64,
        ttl: Option<u64>,
    ) -> std::result::Result<bool, PolicyError> {
        Ok(deadline_reached(times.last_access, ttl, now))
    }

    fn tracks_access(&self) -> bool {
        true
    }

    fn remaining_ms(
        &self,
        _value: &MultiFieldValue,
        times: EntryTimes,
        now: u64,
        ttl: Option<u64>,
    ) -> Option<u64> {
        remaining(times.last_access, ttl, now)
    }

    fn as_reportable(&self) -> Option<&dyn Reportable> {
        Some(self)
    }
}

impl Reportable for SlidingPolicy {
    fn report(&self, out: &mut Map<String, Value>) {
        out.insert("type".into(), "sliding".into());
        out.insert("reference".into(), "last_access".into());
    }
}

// == Deadline Field Policy ==
/// Expires entries whose value carries a millisecond deadline field that has passed.
///
/// Values without the field, or with a non-numeric one, are never expired
/// by this policy. Combine with `TtlPolicy` in a `CompositePolicy` to also
/// enforce TTLs.
#[derive(Debug, Clone)]
pub struct DeadlineFieldPolicy {
    field: String,
}

impl DeadlineFieldPolicy {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl ExpirePolicy for DeadlineFieldPolicy {
    fn name(&self) -> &str {
        "deadline_field"
    }

    fn is_expired(
        &self,
        value: &MultiFieldValue,
        _times: EntryTimes,
        now: u64,
        _ttl: Option<u64>,
    ) -> std::result::Result<bool, PolicyError> {
        Ok(value
            .get(&self.field)
            .and_then(Value::as_u64)
            .is_some_and(|deadline| now >= deadline))
    }

    fn remaining_ms(
        &self,
        value: &MultiFieldValue,
        _times: EntryTimes,
        now: u64,
        _ttl: Option<u64>,
    ) -> Option<u64> {
        value
            .get(&self.field)
            .and_then(Value::as_u64)
            .map(|deadline| deadline.saturating_sub(now))
    }

    fn as_reportable(&self) -> Option<&dyn Reportable> {
        Some(self)
    }
}

impl Reportable for DeadlineFieldPolicy {
    fn report(&self, out: &mut Map<String, Value>) {
        out.insert("type".into(), "deadline_field".into());
        out.insert("field".into(), self.field.clone().into());
    }
}

// == Composite Policy ==
/// Expired as soon as any child policy says so.
#[derive(Debug, Clone)]
pub struct CompositePolicy {
    policies: Vec<Arc<dyn ExpirePolicy>>,
}

impl CompositePolicy {
    pub fn new(policies: Vec<Arc<dyn ExpirePolicy>>) -> Self {
        Self { policies }
    }

    pub fn policies(&self) -> &[Arc<dyn ExpirePolicy>] {
        &self.policies
    }
}

impl ExpirePolicy for CompositePolicy {
    fn name(&self) -> &str {
        "composite"
    }

    fn is_expired(
        &self,
        value: &MultiFieldValue,
        times: EntryTimes,
        now: u64,
        ttl: Option<u64>,
    ) -> std::result::Result<bool, PolicyError> {
        for policy in &self.policies {
            if policy.is_expired(value, times, now, ttl)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn tracks_access(&self) -> bool {
        self.policies.iter().any(|p| p.tracks_access())
    }

    /// The soonest expiry among children that can tell.
    fn remaining_ms(
        &self,
        value: &MultiFieldValue,
        times: EntryTimes,
        now: u64,
        ttl: Option<u64>,
    ) -> Option<u64> {
        self.policies
            .iter()
            .filter_map(|p| p.remaining_ms(value, times, now, ttl))
            .min()
    }

    fn as_reportable(&self) -> Option<&dyn Reportable> {
        Some(self)
    }
}

impl Reportable for CompositePolicy {
    fn report(&self, out: &mut Map<String, Value>) {
        let children: Vec<Value> = self
            .policies
            .iter()
            .map(|p| {
                let mut child = Map::new();
                match p.as_reportable() {
                    Some(r) => r.report(&mut child),
                    None => {
                        child.insert("type".into(), p.name().into());
                    }
                }
                Value::Object(child)
            })
            .collect();
        out.insert("type".into(), "composite".into());
        out.insert("policies".into(), Value::Array(children));
    }
}

// == Policy Settings ==
/// Configured choice of expiration policy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicySettings {
    #[default]
    #[serde(alias = "default")]
    Ttl,
    Sliding,
    DeadlineField {
        field: String,
    },
    Composite {
        policies: Vec<PolicySettings>,
    },
}

impl PolicySettings {
    /// Parses either a bare policy name (`ttl`, `default`, `sliding`) or a
    /// JSON object such as `{"type":"deadline_field","field":"expires_at"}`.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        match raw {
            "ttl" | "default" => Ok(PolicySettings::Ttl),
            "sliding" => Ok(PolicySettings::Sliding),
            _ => serde_json::from_str(raw).map_err(|e| {
                CacheError::Config(format!("invalid expire policy '{}': {}", raw, e))
            }),
        }
    }

    /// Builds the shared policy object.
    pub fn build(&self) -> Result<Arc<dyn ExpirePolicy>> {
        let policy: Arc<dyn ExpirePolicy> = match self {
            PolicySettings::Ttl => Arc::new(TtlPolicy),
            PolicySettings::Sliding => Arc::new(SlidingPolicy),
            PolicySettings::DeadlineField { field } => {
                if field.is_empty() {
                    return Err(CacheError::Config(
                        "deadline_field policy requires a field name".to_string(),
                    ));
                }
                Arc::new(DeadlineFieldPolicy::new(field.clone()))
            }
            PolicySettings::Composite { policies } => {
                if policies.is_empty() {
                    return Err(CacheError::Config(
                        "composite policy requires at least one child policy".to_string(),
                    ));
                }
                let children = policies
                    .iter()
                    .map(PolicySettings::build)
                    .collect::<Result<Vec<_>>>()?;
                Arc::new(CompositePolicy::new(children))
            }
        };
        Ok(policy)
    }
}
