//! Validation errors
//!
//! User-facing, field-identifying errors returned by the pipeline. All of
//! them are client errors (400).

use serde::Serialize;
use thiserror::Error;

use crate::types::TypeViolation;

/// Result type for pipeline operations
pub type ValidationResult<T> = Result<T, ValidationError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Required field absent or null
    #[error("Missing {key} of type {type_name}")]
    Missing { key: String, type_name: String },

    /// Type or bounds check failed
    #[error("Invalid \"{key}\" - caused by: {cause}")]
    Invalid {
        key: String,
        type_name: String,
        cause: TypeViolation,
    },

    /// Caller-supplied validator rejected the value
    #[error("Custom validator callback failed for \"{key}\" - caused by: {cause}")]
    CustomFailed { key: String, cause: TypeViolation },

    /// Body absent or not an object / array of objects
    #[error("No data to validate")]
    NoData,

    #[error("Invalid verb \"{received}\", expected one of: {accepted}")]
    InvalidVerb { received: String, accepted: String },
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::Missing { .. } => "ANTITY_MISSING_FIELD",
            ValidationError::Invalid { .. } => "ANTITY_INVALID_FIELD",
            ValidationError::CustomFailed { .. } => "ANTITY_CUSTOM_VALIDATION_FAILED",
            ValidationError::NoData => "ANTITY_NO_DATA",
            ValidationError::InvalidVerb { .. } => "ANTITY_INVALID_VERB",
        }
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> u16 {
        400
    }

    /// Offending field, when the error is about one.
    pub fn key(&self) -> Option<&str> {
        match self {
            ValidationError::Missing { key, .. }
            | ValidationError::Invalid { key, .. }
            | ValidationError::CustomFailed { key, .. } => Some(key),
            ValidationError::NoData | ValidationError::InvalidVerb { .. } => None,
        }
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub message: String,
}

impl From<&ValidationError> for ErrorBody {
    fn from(err: &ValidationError) -> Self {
        Self {
            status_code: err.status_code(),
            code: err.code(),
            key: err.key().map(str::to_string),
            message: err.to_string(),
        }
    }
}
