//! Query-string parser
//!
//! Builds a [`SelectRequest`] from request parameters:
//!
//! | Parameter    | Meaning                                   |
//! |--------------|-------------------------------------------|
//! | `first`      | offset of the first row                   |
//! | `rows`       | page size, capped by `max_rows`           |
//! | `sortField`  | column to order by                        |
//! | `sortOrder`  | `asc`, `desc`, `1` or `-1`                |
//! | `pagination` | `true` adds the window total to each row  |
//! | `operator`   | `and` / `or` between fields               |
//! | `filters`    | filter map as JSON                        |
//!
//! Unknown parameters are ignored.

use std::collections::HashMap;

use super::assembler::{SelectRequest, SortOrder};
use super::errors::{QueryError, QueryResult};
use crate::config::FilterDefaults;
use crate::filter::{BoolOperator, FilterMap};

/// Hard cap on page size unless configured otherwise
pub const MAX_ROWS: usize = 1000;

#[derive(Debug, Clone)]
pub struct RequestParser {
    max_rows: usize,
    default_rows: Option<usize>,
    operator: BoolOperator,
}

impl Default for RequestParser {
    fn default() -> Self {
        Self {
            max_rows: MAX_ROWS,
            default_rows: None,
            operator: BoolOperator::And,
        }
    }
}

impl RequestParser {
    pub fn new(defaults: &FilterDefaults) -> Self {
        Self {
            max_rows: defaults.max_rows,
            default_rows: defaults.default_rows,
            operator: defaults.operator,
        }
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn parse(&self, params: &HashMap<String, String>) -> QueryResult<SelectRequest> {
        let mut request = SelectRequest {
            operator: self.operator,
            ..SelectRequest::default()
        };

        for (key, value) in params {
            match key.as_str() {
                "first" => request.first = parse_count("first", value)?,
                "rows" => request.rows = Some(parse_count("rows", value)?),
                "sortField" => {
                    let field = value.trim();
                    request.sort_field = (!field.is_empty()).then(|| field.to_string());
                }
                "sortOrder" => {
                    request.sort_order = SortOrder::parse(value).ok_or_else(|| {
                        QueryError::InvalidParam(format!("Invalid sortOrder: {}", value))
                    })?;
                }
                "pagination" => request.pagination = parse_flag("pagination", value)?,
                "operator" => request.operator = parse_operator(value)?,
                "filters" => request.filters = parse_filters(value)?,
                _ => {}
            }
        }

        request.rows = self.page_size(request.rows)?;
        Ok(request)
    }

    /// Requested page size, or the configured default, checked against
    /// `max_rows`.
    pub fn page_size(&self, rows: Option<usize>) -> QueryResult<Option<usize>> {
        match rows.or(self.default_rows) {
            Some(rows) if rows > self.max_rows => Err(QueryError::LimitExceeded(rows, self.max_rows)),
            rows => Ok(rows),
        }
    }
}

fn parse_count(name: &str, value: &str) -> QueryResult<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| QueryError::InvalidParam(format!("Invalid {}: {}", name, value)))
}

fn parse_flag(name: &str, value: &str) -> QueryResult<bool> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        _ => Err(QueryError::InvalidParam(format!("Invalid {}: {}", name, value))),
    }
}

fn parse_operator(value: &str) -> QueryResult<BoolOperator> {
    match value.trim().to_ascii_lowercase().as_str() {
        "and" => Ok(BoolOperator::And),
        "or" => Ok(BoolOperator::Or),
        _ => Err(QueryError::InvalidParam(format!("Invalid operator: {}", value))),
    }
}

fn parse_filters(value: &str) -> QueryResult<FilterMap> {
    if value.trim().is_empty() {
        return Ok(FilterMap::new());
    }
    serde_json::from_str(value).map_err(|e| QueryError::InvalidFilters(e.to_string()))
}
