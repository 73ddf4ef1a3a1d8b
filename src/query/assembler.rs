//! Select assembly
//!
//! Combines compiled filters with the entity's select projection, an
//! optional ORDER BY and bound LIMIT/OFFSET into one statement.
//!
//! Assembly never fails on client input: filters that do not compile and
//! sort fields that are not selectable are dropped and logged.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::filter::{
    BoolOperator, DroppedFilter, FilterCompiler, FilterMap, MatchModeRegistry, SqlArgs,
};
use crate::observability::Event;
use crate::schema::{quote, Entity, Operation};

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "ASC", alias = "asc")]
    Asc,
    #[serde(rename = "DESC", alias = "desc")]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// Accepts `asc`/`desc` in any case, and the `1`/`-1` form of table
    /// widgets.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "1" => Some(SortOrder::Asc),
            "desc" | "-1" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One page of a select
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectRequest {
    /// Offset of the first row
    pub first: usize,

    /// Page size; no LIMIT when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<String>,

    pub sort_order: SortOrder,

    pub filters: FilterMap,

    /// Adds the window total to every row
    pub pagination: bool,

    /// Connective between fields
    pub operator: BoolOperator,
}

impl SelectRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, first: usize, rows: usize) -> Self {
        self.first = first;
        self.rows = Some(rows);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_field = Some(field.into());
        self.sort_order = order;
        self
    }

    pub fn filters(mut self, filters: FilterMap) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_pagination(mut self) -> Self {
        self.pagination = true;
        self
    }

    pub fn operator(mut self, operator: BoolOperator) -> Self {
        self.operator = operator;
        self
    }
}

/// SQL text with its positional arguments
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statement {
    pub sql: String,
    pub args: SqlArgs,

    /// Filters skipped while compiling; empty for writes
    #[serde(skip)]
    pub dropped: Vec<DroppedFilter>,
}

impl Statement {
    pub fn new(sql: String, args: SqlArgs) -> Self {
        Self {
            sql,
            args,
            dropped: Vec::new(),
        }
    }
}

/// Builds select statements for one entity
#[derive(Debug, Clone, Copy)]
pub struct QueryAssembler<'a> {
    entity: &'a Entity,
    modes: &'a MatchModeRegistry,
}

impl<'a> QueryAssembler<'a> {
    pub fn new(entity: &'a Entity, modes: &'a MatchModeRegistry) -> Self {
        Self { entity, modes }
    }

    pub fn select(&self, request: &SelectRequest) -> Statement {
        let mut args = SqlArgs::new();
        let compiled =
            FilterCompiler::new(self.entity, self.modes).compile(&request.filters, &mut args);

        let mut sql = format!(
            "SELECT {} FROM {}",
            self.entity.column_list(Operation::Select, request.pagination),
            self.entity.quoted_table()
        );

        if let Some(predicate) = compiled.predicate(request.operator) {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate);
        }

        if let Some(field) = request.sort_field.as_deref() {
            if self.entity.is_selectable(field) {
                sql.push_str(&format!(" ORDER BY {} {}", quote(field), request.sort_order));
            } else {
                tracing::info!(
                    event = %Event::SortDropped,
                    entity = %self.entity.name(),
                    field,
                    "skipping sort on a field that is not selectable"
                );
            }
        }

        if let Some(rows) = request.rows {
            let limit = args.bind(rows);
            let offset = args.bind(request.first);
            sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
        }

        tracing::debug!(
            event = %Event::QueryAssembled,
            entity = %self.entity.name(),
            sql = %sql,
            args = args.len(),
            dropped = compiled.dropped.len(),
            "select assembled"
        );

        Statement {
            sql,
            args,
            dropped: compiled.dropped,
        }
    }
}
