//! CLI error types
//!
//! Library errors keep their own codes; the CLI adds codes for I/O and
//! argument problems.

use std::io;
use thiserror::Error;

use crate::config::ConfigError;
use crate::pipeline::ValidationError;
use crate::query::QueryError;
use crate::schema::SchemaError;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// File or stdout failure
    #[error("I/O error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl CliError {
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Io(_) => "ANTITY_CLI_IO_ERROR",
            CliError::Json(_) => "ANTITY_CLI_JSON_ERROR",
            CliError::InvalidArgument(_) => "ANTITY_CLI_INVALID_ARGUMENT",
            CliError::Config(e) => e.code(),
            CliError::Schema(e) => e.code(),
            CliError::Validation(e) => e.code(),
            CliError::Query(e) => e.code(),
        }
    }

    /// Field the error is about, for validation failures.
    pub fn key(&self) -> Option<&str> {
        match self {
            CliError::Validation(e) => e.key(),
            CliError::Query(QueryError::Validation(e)) => e.key(),
            _ => None,
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}
