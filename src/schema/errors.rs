//! Schema construction errors
//!
//! Raised when an entity or one of its properties is built, never at
//! request time. Every variant maps to a stable code:
//! - ANTITY_INVALID_KEY
//! - ANTITY_DUPLICATE_KEY
//! - ANTITY_UNKNOWN_TYPE
//! - ANTITY_INVALID_OPERATION
//! - ANTITY_UNKNOWN_NORMALIZER
//! - ANTITY_INVALID_BOUNDS
//! - ANTITY_MALFORMED_DEFINITION

use thiserror::Error;

/// Result type for schema construction
pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Key is empty or cannot be used as a quoted column identifier
    #[error("Invalid property key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("Duplicate property key \"{0}\"")]
    DuplicateKey(String),

    #[error("Unknown type \"{type_name}\" for property \"{key}\"")]
    UnknownType { key: String, type_name: String },

    /// Operation tag outside the canonical vocabulary
    #[error("Invalid operation \"{operation}\" for property \"{key}\"")]
    InvalidOperation { key: String, operation: String },

    #[error("Unknown normalizer \"{name}\" for property \"{key}\"")]
    UnknownNormalizer { key: String, name: String },

    /// min exceeds max
    #[error("Invalid bounds for property \"{key}\": min {min} is greater than max {max}")]
    InvalidBounds {
        key: String,
        min: String,
        max: String,
    },

    /// Definition file unreadable or not valid JSON
    #[error("Malformed entity definition at {location}: {reason}")]
    MalformedDefinition { location: String, reason: String },
}

impl SchemaError {
    pub fn invalid_key(key: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason,
        }
    }

    pub fn unknown_type(key: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            key: key.into(),
            type_name: type_name.into(),
        }
    }

    pub fn invalid_operation(key: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::InvalidOperation {
            key: key.into(),
            operation: operation.into(),
        }
    }

    pub fn malformed(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedDefinition {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::InvalidKey { .. } => "ANTITY_INVALID_KEY",
            SchemaError::DuplicateKey(_) => "ANTITY_DUPLICATE_KEY",
            SchemaError::UnknownType { .. } => "ANTITY_UNKNOWN_TYPE",
            SchemaError::InvalidOperation { .. } => "ANTITY_INVALID_OPERATION",
            SchemaError::UnknownNormalizer { .. } => "ANTITY_UNKNOWN_NORMALIZER",
            SchemaError::InvalidBounds { .. } => "ANTITY_INVALID_BOUNDS",
            SchemaError::MalformedDefinition { .. } => "ANTITY_MALFORMED_DEFINITION",
        }
    }
}
