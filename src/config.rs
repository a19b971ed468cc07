//! Configuration Module
//!
//! Settings for the cache store and the server binary.
//!
//! Unset values fall back to defaults. Values that are set but malformed are
//! rejected with `CacheError::Config` rather than silently replaced.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::PolicySettings;
use crate::error::{CacheError, Result};

/// Default TTL applied to entries written without one (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default interval between background sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Default HTTP server port.
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Default header carrying the client address behind a load balancer.
pub const DEFAULT_FORWARDED_HEADER: &str = "X-Forwarded-For";

// == Store Config ==
/// Validated cache store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum number of entries, `None` for unbounded
    pub capacity: Option<usize>,
    /// TTL for entries written without one
    pub default_ttl: Duration,
    /// Interval between background sweeps
    pub sweep_interval: Duration,
    /// Expiration policy to build
    pub policy: PolicySettings,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: None,
            default_ttl: DEFAULT_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            policy: PolicySettings::default(),
        }
    }
}

impl StoreConfig {
    /// Rejects values no store can run with.
    ///
    /// Fields are public, so a hand-built config is checked again here even
    /// when it came through `CacheSettings::validate`.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == Some(0) {
            return Err(CacheError::Config("capacity must be positive, got 0".to_string()));
        }
        if self.default_ttl.as_millis() == 0 {
            return Err(CacheError::Config(format!(
                "default_ttl must be at least 1ms, got {:?}",
                self.default_ttl
            )));
        }
        if self.sweep_interval.is_zero() {
            return Err(CacheError::Config("sweep_interval must be positive".to_string()));
        }
        Ok(())
    }
}

// == Cache Settings ==
/// Raw, unvalidated settings object.
///
/// Every field is optional so that "unset" can be told apart from "invalid".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    pub capacity: Option<i64>,
    pub default_ttl_ms: Option<i64>,
    pub sweep_interval_ms: Option<i64>,
    pub expire_policy: Option<PolicySettings>,
}

impl CacheSettings {
    /// Parses settings from a JSON document.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| CacheError::Config(format!("malformed cache settings: {}", e)))
    }

    /// Checks every explicit value and fills in defaults for the rest.
    pub fn validate(self) -> Result<StoreConfig> {
        let capacity = match self.capacity {
            None => None,
            Some(c) if c > 0 => Some(c as usize),
            Some(c) => {
                return Err(CacheError::Config(format!(
                    "capacity must be positive, got {}",
                    c
                )))
            }
        };

        let default_ttl = positive_millis("default_ttl_ms", self.default_ttl_ms)?
            .unwrap_or(DEFAULT_TTL);
        let sweep_interval = positive_millis("sweep_interval_ms", self.sweep_interval_ms)?
            .unwrap_or(DEFAULT_SWEEP_INTERVAL);

        let policy = self.expire_policy.unwrap_or_default();
        // Surface policy errors now rather than at store construction
        policy.build()?;

        Ok(StoreConfig {
            capacity,
            default_ttl,
            sweep_interval,
            policy,
        })
    }
}

fn positive_millis(name: &str, value: Option<i64>) -> Result<Option<Duration>> {
    match value {
        None => Ok(None),
        Some(ms) if ms > 0 => Ok(Some(Duration::from_millis(ms as u64))),
        Some(ms) => Err(CacheError::Config(format!(
            "{} must be positive, got {}",
            name, ms
        ))),
    }
}

// == Server Config ==
/// Server configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache store settings
    pub store: StoreConfig,
    /// HTTP server port
    pub server_port: u16,
    /// Header consulted for the client address in request logs
    pub forwarded_header: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: unbounded)
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `SWEEP_INTERVAL_MS` - Sweep frequency in milliseconds (default: 1000)
    /// - `EXPIRE_POLICY` - Policy name or JSON policy settings (default: ttl)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `FORWARDED_HEADER` - Client address header (default: X-Forwarded-For)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = CacheSettings {
            capacity: parse_var(&lookup, "CACHE_CAPACITY")?,
            default_ttl_ms: parse_var(&lookup, "DEFAULT_TTL_MS")?,
            sweep_interval_ms: parse_var(&lookup, "SWEEP_INTERVAL_MS")?,
            expire_policy: lookup("EXPIRE_POLICY")
                .map(|raw| PolicySettings::parse(&raw))
                .transpose()?,
        };

        Ok(Self {
            store: settings.validate()?,
            server_port: parse_var(&lookup, "SERVER_PORT")?.unwrap_or(DEFAULT_SERVER_PORT),
            forwarded_header: lookup("FORWARDED_HEADER")
                .filter(|h| !h.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FORWARDED_HEADER.to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            server_port: DEFAULT_SERVER_PORT,
            forwarded_header: DEFAULT_FORWARDED_HEADER.to_string(),
        }
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| CacheError::Config(format!("{}='{}': {}", name, raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.store.capacity, None);
        assert_eq!(config.store.default_ttl, Duration::from_secs(300));
        assert_eq!(config.store.sweep_interval, Duration::from_secs(1));
        assert_eq!(config.store.policy, PolicySettings::Ttl);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.forwarded_header, "X-Forwarded-For");
    }

    #[test]
    fn test_config_from_lookup_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_config_from_lookup_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("CACHE_CAPACITY", "50"),
            ("DEFAULT_TTL_MS", "1500"),
            ("SWEEP_INTERVAL_MS", "250"),
            ("EXPIRE_POLICY", "sliding"),
            ("SERVER_PORT", "8080"),
            ("FORWARDED_HEADER", "X-Real-IP"),
        ]))
        .unwrap();

        assert_eq!(config.store.capacity, Some(50));
        assert_eq!(config.store.default_ttl, Duration::from_millis(1500));
        assert_eq!(config.store.sweep_interval, Duration::from_millis(250));
        assert_eq!(config.store.policy, PolicySettings::Sliding);
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.forwarded_header, "X-Real-IP");
    }

    #[test]
    fn test_unparseable_value_is_an_error() {
        let result = Config::from_lookup(lookup_from(&[("CACHE_CAPACITY", "lots")]));
        assert!(matches!(result, Err(CacheError::Config(_))));
    }

    #[test]
    fn test_negative_capacity_is_an_error() {
        let result = Config::from_lookup(lookup_from(&[("CACHE_CAPACITY", "-1")]));
        assert!(matches!(result, Err(CacheError::Config(_))));
    }

    #[test]
    fn test_settings_from_json() {
        let config = CacheSettings::from_json(
            r#"{
                "capacity": 2,
                "default_ttl_ms": 10,
                "expire_policy": {"type": "composite", "policies": [{"type": "ttl"}, {"type": "sliding"}]}
            }"#,
        )
        .unwrap()
        .validate()
        .unwrap();

        assert_eq!(config.capacity, Some(2));
        assert_eq!(config.default_ttl, Duration::from_millis(10));
        assert_eq!(config.sweep_interval, DEFAULT_SWEEP_INTERVAL);
        assert!(matches!(config.policy, PolicySettings::Composite { .. }));
    }

    #[test]
    fn test_settings_reject_non_positive_durations() {
        let zero_ttl = CacheSettings {
            default_ttl_ms: Some(0),
            ..Default::default()
        };
        assert!(matches!(zero_ttl.validate(), Err(CacheError::Config(_))));

        let negative_sweep = CacheSettings {
            sweep_interval_ms: Some(-100),
            ..Default::default()
        };
        assert!(matches!(negative_sweep.validate(), Err(CacheError::Config(_))));
    }

    #[test]
    fn test_store_config_validate() {
        assert!(StoreConfig::default().validate().is_ok());

        let zero_capacity = StoreConfig {
            capacity: Some(0),
            ..Default::default()
        };
        assert!(matches!(zero_capacity.validate(), Err(CacheError::Config(_))));

        let sub_millisecond_ttl = StoreConfig {
            default_ttl: Duration::from_micros(500),
            ..Default::default()
        };
        assert!(matches!(sub_millisecond_ttl.validate(), Err(CacheError::Config(_))));

        let zero_sweep = StoreConfig {
            sweep_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(zero_sweep.validate(), Err(CacheError::Config(_))));
    }

    #[test]
    fn test_settings_reject_empty_composite() {
        let settings = CacheSettings {
            expire_policy: Some(PolicySettings::Composite { policies: vec![] }),
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(CacheError::Config(_))));
    }
}
