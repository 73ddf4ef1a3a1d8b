//! Write statements
//!
//! Built from the same per-operation catalogs as selects. Every value is a
//! bound argument; only quoted schema keys reach the SQL text.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::assembler::Statement;
use super::errors::{QueryError, QueryResult};
use crate::filter::SqlArgs;
use crate::pipeline::Record;
use crate::schema::{quote, Entity, Operation};

/// Row identity column
pub const ID_COLUMN: &str = "id";

/// Archive timestamp column used by [`delete_archived`]
pub const ARCHIVED_AT_COLUMN: &str = "archivedAt";

/// Multi-row insert over the insert catalog. A field absent from a record
/// is written as NULL.
pub fn insert(entity: &Entity, records: &[Record], returning: Option<&str>) -> QueryResult<Statement> {
    if records.is_empty() {
        return Err(QueryError::NoRecords);
    }
    let columns = entity.columns(Operation::Insert);
    if columns.is_empty() {
        return Err(QueryError::NothingToWrite(entity.name().to_string()));
    }

    let mut args = SqlArgs::new();
    let rows: Vec<String> = records
        .iter()
        .map(|record| {
            let placeholders: Vec<String> = columns
                .iter()
                .map(|key| args.bind(record.get(key).cloned().unwrap_or(Value::Null)))
                .collect();
            format!("({})", placeholders.join(", "))
        })
        .collect();

    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES {}",
        entity.quoted_table(),
        entity.rendered_columns(Operation::Insert).join(", "),
        rows.join(", ")
    );
    if let Some(column) = returning {
        sql.push_str(&format!(" RETURNING {}", quote(column)));
    }
    Ok(Statement::new(sql, args))
}

/// Full-row update over the update catalog.
///
/// The SET list is the catalog's own fragments, so the Nth column is bound
/// at `$N`; the id follows them. Absent fields are written as NULL.
pub fn update(entity: &Entity, record: &Record, id: impl Into<Value>) -> QueryResult<Statement> {
    let columns = entity.columns(Operation::Update);
    if !columns.iter().any(|key| record.contains_key(key)) {
        return Err(QueryError::NothingToWrite(entity.name().to_string()));
    }

    let mut args = SqlArgs::new();
    for key in columns {
        args.bind(record.get(key).cloned().unwrap_or(Value::Null));
    }
    let id = args.bind(id);

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        entity.quoted_table(),
        entity.rendered_columns(Operation::Update).join(", "),
        quote(ID_COLUMN),
        id
    );
    Ok(Statement::new(sql, args))
}

/// Partial update: only merge-catalog fields present in the record.
pub fn merge(entity: &Entity, record: &Record, id: impl Into<Value>) -> QueryResult<Statement> {
    let mut args = SqlArgs::new();
    let assignments: Vec<String> = entity
        .columns(Operation::Merge)
        .iter()
        .filter_map(|key| {
            record
                .get(key)
                .map(|value| format!("{} = {}", quote(key), args.bind(value.clone())))
        })
        .collect();
    if assignments.is_empty() {
        return Err(QueryError::NothingToWrite(entity.name().to_string()));
    }
    let id = args.bind(id);

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        entity.quoted_table(),
        assignments.join(", "),
        quote(ID_COLUMN),
        id
    );
    Ok(Statement::new(sql, args))
}

/// Deletes rows by id; the ids are bound as one array.
pub fn delete_ids(entity: &Entity, ids: &[Value]) -> QueryResult<Statement> {
    if ids.is_empty() {
        return Err(QueryError::NoRecords);
    }
    let mut args = SqlArgs::new();
    let sql = format!(
        "DELETE FROM {} WHERE {} = ANY({})",
        entity.quoted_table(),
        quote(ID_COLUMN),
        args.bind(Value::Array(ids.to_vec()))
    );
    Ok(Statement::new(sql, args))
}

/// Deletes rows archived before `before`.
pub fn delete_archived(entity: &Entity, before: DateTime<Utc>) -> Statement {
    let mut args = SqlArgs::new();
    let sql = format!(
        "DELETE FROM {} WHERE {} < {}",
        entity.quoted_table(),
        quote(ARCHIVED_AT_COLUMN),
        args.bind(before.to_rfc3339())
    );
    Statement::new(sql, args)
}
