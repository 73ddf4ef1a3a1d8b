//! Query errors
//!
//! Error codes:
//! - ANTITY_INVALID_QUERY_PARAM
//! - ANTITY_LIMIT_EXCEEDED
//! - ANTITY_INVALID_FILTERS
//! - ANTITY_NO_RECORDS
//! - ANTITY_NOTHING_TO_WRITE
//!
//! Validation failures keep their own codes. Database errors are not
//! wrapped in a code; they come back from the executor as they were raised.

use thiserror::Error;

use crate::pipeline::ValidationError;

/// Result type for statement building and request parsing
pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("Invalid query parameter: {0}")]
    InvalidParam(String),

    #[error("Page size {0} exceeds maximum {1}")]
    LimitExceeded(usize, usize),

    /// `filters` parameter is not a valid filter map
    #[error("Invalid filters: {0}")]
    InvalidFilters(String),

    #[error("No records to write")]
    NoRecords,

    /// Record carries none of the columns the statement writes
    #[error("Nothing to write on {0}")]
    NothingToWrite(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl QueryError {
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::InvalidParam(_) => "ANTITY_INVALID_QUERY_PARAM",
            QueryError::LimitExceeded(..) => "ANTITY_LIMIT_EXCEEDED",
            QueryError::InvalidFilters(_) => "ANTITY_INVALID_FILTERS",
            QueryError::NoRecords => "ANTITY_NO_RECORDS",
            QueryError::NothingToWrite(_) => "ANTITY_NOTHING_TO_WRITE",
            QueryError::Validation(err) => err.code(),
        }
    }

    /// All query errors are client errors.
    pub fn status_code(&self) -> u16 {
        400
    }
}

/// Failure of an executed entity operation
#[derive(Debug, Error)]
pub enum ExecuteError<E>
where
    E: std::error::Error + 'static,
{
    /// Rejected before reaching the database
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Raised by the executor, unmodified
    #[error(transparent)]
    Database(E),
}

impl<E> ExecuteError<E>
where
    E: std::error::Error + 'static,
{
    /// The executor's error, if that is where it failed.
    pub fn database(&self) -> Option<&E> {
        match self {
            ExecuteError::Database(err) => Some(err),
            ExecuteError::Query(_) => None,
        }
    }
}
