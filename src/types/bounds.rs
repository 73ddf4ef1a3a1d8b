//! Property bounds
//!
//! A bound is a number (value range, or length for strings and arrays) or a
//! date. Dates and numbers convert into each other through epoch milliseconds
//! so a timestamp field may be bounded by a date and vice versa.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One side of a bound
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Limit {
    Number(f64),
    Date(DateTime<Utc>),
}

impl Limit {
    /// Numeric view; dates become epoch milliseconds.
    pub fn as_f64(&self) -> f64 {
        match self {
            Limit::Number(n) => *n,
            Limit::Date(d) => d.timestamp_millis() as f64,
        }
    }

    /// Date view; numbers are read as epoch milliseconds.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Limit::Number(n) => DateTime::from_timestamp_millis(*n as i64),
            Limit::Date(d) => Some(*d),
        }
    }
}

impl From<f64> for Limit {
    fn from(n: f64) -> Self {
        Limit::Number(n)
    }
}

impl From<i64> for Limit {
    fn from(n: i64) -> Self {
        Limit::Number(n as f64)
    }
}

impl From<i32> for Limit {
    fn from(n: i32) -> Self {
        Limit::Number(n as f64)
    }
}

impl From<DateTime<Utc>> for Limit {
    fn from(d: DateTime<Utc>) -> Self {
        Limit::Date(d)
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Number(n) => write!(f, "{}", n),
            Limit::Date(d) => write!(f, "{}", d.to_rfc3339()),
        }
    }
}

/// Inclusive lower and upper bound
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Limit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Limit>,
}

impl Bounds {
    pub const UNBOUNDED: Bounds = Bounds {
        min: None,
        max: None,
    };

    pub fn new(min: Option<Limit>, max: Option<Limit>) -> Self {
        Self { min, max }
    }

    /// Numeric bounds helper
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(Limit::Number(min)),
            max: Some(Limit::Number(max)),
        }
    }

    /// Field-wise override: sides set on `self` win over `defaults`.
    pub fn or(&self, defaults: &Bounds) -> Bounds {
        Bounds {
            min: self.min.or(defaults.min),
            max: self.max.or(defaults.max),
        }
    }

    /// True when both sides are set and min exceeds max.
    pub fn is_inverted(&self) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => min.as_f64() > max.as_f64(),
            _ => false,
        }
    }

    pub fn min_f64(&self) -> Option<f64> {
        self.min.map(|l| l.as_f64())
    }

    pub fn max_f64(&self) -> Option<f64> {
        self.max.map(|l| l.as_f64())
    }

    /// Length bounds for strings and arrays; negative limits clamp to zero.
    pub fn min_len(&self) -> Option<usize> {
        self.min_f64().map(|n| n.max(0.0) as usize)
    }

    pub fn max_len(&self) -> Option<usize> {
        self.max_f64().map(|n| n.max(0.0) as usize)
    }

    /// Whether a number lies within the bounds.
    pub fn contains(&self, n: f64) -> bool {
        self.min_f64().map_or(true, |min| n >= min) && self.max_f64().map_or(true, |max| n <= max)
    }

    /// Rendering of the lower side for messages ("-inf" when open).
    pub fn min_label(&self) -> String {
        self.min.map_or_else(|| "-inf".to_string(), |l| l.to_string())
    }

    /// Rendering of the upper side for messages ("inf" when open).
    pub fn max_label(&self) -> String {
        self.max.map_or_else(|| "inf".to_string(), |l| l.to_string())
    }
}
