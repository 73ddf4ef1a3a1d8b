//! Named normalizers
//!
//! Plain-data entity definitions cannot carry closures, so they refer to
//! normalizers by name. Values of a shape a normalizer does not handle pass
//! through unchanged.

use serde_json::{Number, Value};
use std::sync::Arc;

use crate::schema::NormalizerFn;

/// Names accepted in entity definitions
pub const NAMES: [&str; 6] = ["lowercase", "uppercase", "capitalize", "trim", "slugify", "round"];

/// Resolves a normalizer by name.
pub fn named(name: &str) -> Option<Arc<NormalizerFn>> {
    let f: Arc<NormalizerFn> = match name {
        "lowercase" => Arc::new(|v: Value| map_str(v, |s| s.to_lowercase())),
        "uppercase" => Arc::new(|v: Value| map_str(v, |s| s.to_uppercase())),
        "capitalize" => Arc::new(|v: Value| map_str(v, capitalize)),
        "trim" => Arc::new(|v: Value| map_str(v, |s| s.trim().to_string())),
        "slugify" => Arc::new(|v: Value| map_str(v, slugify)),
        "round" => Arc::new(round),
        _ => return None,
    };
    Some(f)
}

fn map_str(value: Value, f: impl Fn(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(&s)),
        other => other,
    }
}

/// Upper-cases the first character, lower-cases the rest.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Lower-case ASCII alphanumerics separated by single hyphens.
pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    let mut pending_dash = false;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Rounds numbers to the nearest integer.
pub fn round(value: Value) -> Value {
    match value {
        Value::Number(n) if !(n.is_i64() || n.is_u64()) => {
            let rounded = n.as_f64().map(f64::round).unwrap_or_default();
            if rounded.abs() < i64::MAX as f64 {
                Value::Number(Number::from(rounded as i64))
            } else {
                Number::from_f64(rounded).map_or(Value::Null, Value::Number)
            }
        }
        other => other,
    }
}
