//! Opaque key/value attributes attached to assets, categories, and sessions.
//!
//! The engine never interprets these values. They are stored as JSONB and
//! round-tripped to clients unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tenant-defined attributes keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomFields(BTreeMap<String, Value>);

impl CustomFields {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Overlay `other` onto `self`. A `null` value deletes the key.
    pub fn merge(&mut self, other: CustomFields) {
        for (key, value) in other.0 {
            if value.is_null() {
                self.0.remove(&key);
            } else {
                self.0.insert(key, value);
            }
        }
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no fields are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for CustomFields {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transparent_json() {
        let fields: CustomFields =
            serde_json::from_value(json!({"table_size": "9ft", "cloth": 2})).expect("parse");
        assert_eq!(fields.get("table_size"), Some(&json!("9ft")));
        assert_eq!(
            serde_json::to_value(&fields).expect("serialize"),
            json!({"cloth": 2, "table_size": "9ft"})
        );
    }

    #[test]
    fn test_merge_null_deletes() {
        let mut base = CustomFields::new();
        base.insert("color", "green");
        base.insert("seats", 4);

        let patch: CustomFields =
            serde_json::from_value(json!({"color": null, "seats": 6})).expect("parse");
        base.merge(patch);

        assert_eq!(base.len(), 1);
        assert_eq!(base.get("seats"), Some(&json!(6)));
    }
}
