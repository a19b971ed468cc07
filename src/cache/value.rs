//! Multi-Field Value Module
//!
//! Defines the cached value type: an ordered set of named fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Multi-Field Value ==
/// A cached value composed of named sub-fields.
///
/// Field names are unique and kept in sorted order. A field holding
/// `Value::Null` is distinct from a field that is absent.
///
/// Values are built by the caller and become immutable once stored: the
/// store hands out `Arc<MultiFieldValue>` snapshots, so changing a field
/// means writing a new value through `CacheStore::put`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultiFieldValue {
    fields: BTreeMap<String, Value>,
}

impl MultiFieldValue {
    // == Constructor ==
    /// Creates an empty value with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    // == Builder ==
    /// Returns the value with `name` set to `value`, replacing any previous field.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a field, returning the previous value if the field existed.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    // == Accessors ==
    /// Returns the field value, or `None` if the field is absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns true if the field is present, even when it holds null.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterates over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for MultiFieldValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
