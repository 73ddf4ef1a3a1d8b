//! Type check failures
//!
//! Every check in the registry reports failure through this one type.

use thiserror::Error;

/// Why a value was rejected by a type check
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeViolation {
    /// Value has the wrong JSON shape
    #[error("expected {expected}, but received {actual}")]
    WrongType {
        expected: &'static str,
        actual: String,
    },

    /// Value is outside the property bounds
    #[error("expected {expected} in range [{min}, {max}], but received {actual}")]
    OutOfRange {
        expected: &'static str,
        min: String,
        max: String,
        actual: String,
    },

    /// Value has the right shape but not the expected format
    #[error("expected {expected}, but received {actual}")]
    Format {
        expected: &'static str,
        actual: String,
    },

    /// Password policy not met
    #[error("password {0}")]
    Password(String),

    /// Custom validator rejection
    #[error("{0}")]
    Custom(String),
}

impl TypeViolation {
    pub fn wrong_type(expected: &'static str, actual: &serde_json::Value) -> Self {
        Self::WrongType {
            expected,
            actual: describe(actual),
        }
    }

    pub fn format(expected: &'static str, actual: &serde_json::Value) -> Self {
        Self::Format {
            expected,
            actual: describe(actual),
        }
    }

    pub fn out_of_range(
        expected: &'static str,
        min: impl ToString,
        max: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::OutOfRange {
            expected,
            min: min.to_string(),
            max: max.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn password(reason: impl Into<String>) -> Self {
        Self::Password(reason.into())
    }

    /// Rejection raised by a caller-supplied validator.
    pub fn custom(reason: impl Into<String>) -> Self {
        Self::Custom(reason.into())
    }
}

/// JSON type name of a value.
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;

    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// "<type>: <value>" rendering used in violation messages.
fn describe(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => format!("string: {}", s),
        serde_json::Value::Array(items) => format!("array of length {}", items.len()),
        serde_json::Value::Object(_) => "object".to_string(),
        other => format!("{}: {}", json_type_name(other), other),
    }
}
