//! Default sanitizer: bounded deep trim
//!
//! Visits the leaf strings of a tree of scalars and containers and trims
//! them. Descent stops at `max_depth`; with an allow-list set, only the
//! listed object keys are descended into.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::observability::Event;

/// Recursion limits for the deep trim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizeLimits {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Object keys the trim may descend into; `None` means all keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_keys: Option<BTreeSet<String>>,
}

fn default_max_depth() -> usize {
    8
}

impl Default for SanitizeLimits {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            allowed_keys: None,
        }
    }
}

impl SanitizeLimits {
    pub fn with_allowed_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    fn descends_into(&self, key: &str) -> bool {
        self.allowed_keys
            .as_ref()
            .map_or(true, |keys| keys.contains(key))
    }
}

/// Trims every reachable string leaf of `value`.
pub fn deep_trim(value: Value, limits: &SanitizeLimits) -> Value {
    trim_at(value, limits, 0)
}

fn trim_at(value: Value, limits: &SanitizeLimits, depth: usize) -> Value {
    match value {
        Value::String(s) => trimmed(s),
        Value::Array(_) | Value::Object(_) if depth >= limits.max_depth => {
            tracing::debug!(
                event = %Event::SanitizeDepthExceeded,
                depth,
                max_depth = limits.max_depth,
                "container left untrimmed"
            );
            value
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| trim_at(item, limits, depth + 1))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, v)| {
                    let v = if limits.descends_into(&key) {
                        trim_at(v, limits, depth + 1)
                    } else {
                        v
                    };
                    (key, v)
                })
                .collect(),
        ),
        other => other,
    }
}

fn trimmed(s: String) -> Value {
    let t = s.trim();
    if t.len() == s.len() {
        Value::String(s)
    } else {
        Value::String(t.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trims_scalars_and_arrays() {
        let limits = SanitizeLimits::default();
        assert_eq!(deep_trim(json!("  a "), &limits), json!("a"));
        assert_eq!(deep_trim(json!([" a", "b ", 3]), &limits), json!(["a", "b", 3]));
        assert_eq!(deep_trim(json!(12), &limits), json!(12));
    }

    #[test]
    fn test_trims_nested_objects() {
        let limits = SanitizeLimits::default();
        let value = json!({"name": " John ", "address": {"city": " Paris", "zip": 75000}});
        assert_eq!(
            deep_trim(value, &limits),
            json!({"name": "John", "address": {"city": "Paris", "zip": 75000}})
        );
    }

    #[test]
    fn test_depth_limit() {
        let limits = SanitizeLimits {
            max_depth: 1,
            allowed_keys: None,
        };
        let value = json!({"a": " x ", "b": {"c": " y "}});
        assert_eq!(
            deep_trim(value, &limits),
            json!({"a": "x", "b": {"c": " y "}})
        );
    }

    #[test]
    fn test_allow_list() {
        let limits = SanitizeLimits::default().with_allowed_keys(["name"]);
        let value = json!({"name": " John ", "bio": "  keep  "});
        assert_eq!(
            deep_trim(value, &limits),
            json!({"name": "John", "bio": "  keep  "})
        );
    }
}
