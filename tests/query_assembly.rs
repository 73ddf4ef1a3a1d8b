//! Query Assembly Tests
//!
//! Select and write statements end to end:
//! - Request parameters become a select with bound LIMIT/OFFSET
//! - Writes are built from the same catalogs as selects
//! - An executor only ever sees statements built from validated records

use std::collections::HashMap;
use std::sync::Arc;

use antity::config::FilterDefaults;
use antity::filter::{BoolOperator, FilterMap, MatchModeRegistry};
use antity::pipeline::Record;
use antity::query::{
    statements, ExecuteError, Executor, QueryAssembler, QueryError, RequestParser, SelectRequest,
    SortOrder, SqlEntity, MAX_ROWS,
};
use antity::schema::{Entity, Operation, PropertyDescriptor};
use antity::types::TypeRegistry;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::Mutex;

// =============================================================================
// Helper Functions
// =============================================================================

fn books() -> Entity {
    Entity::new(
        "Book",
        "library.books",
        vec![
            PropertyDescriptor::new("id", "integer")
                .operations(&[Operation::Select, Operation::Delete]),
            PropertyDescriptor::new("title", "string").required().max(200),
            PropertyDescriptor::new("pages", "integer").min(1),
            PropertyDescriptor::new("isbn", "string")
                .unsafe_for_mutation()
                .operations(&[Operation::Insert]),
        ],
        &TypeRegistry::default(),
    )
    .unwrap()
}

fn filters(value: Value) -> FilterMap {
    serde_json::from_value(value).unwrap()
}

fn record(value: Value) -> Record {
    serde_json::from_value(value).unwrap()
}

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[derive(Debug, Error)]
#[error("database unavailable")]
struct Unavailable;

/// Captures statements and answers with canned rows
#[derive(Default)]
struct Capture {
    statements: Mutex<Vec<(String, Vec<Value>)>>,
    rows: Vec<Value>,
    fail: bool,
}

impl Executor for Capture {
    type Error = Unavailable;

    async fn query(&self, sql: &str, args: &[Value]) -> Result<Vec<Value>, Self::Error> {
        self.statements
            .lock()
            .await
            .push((sql.to_string(), args.to_vec()));
        if self.fail {
            return Err(Unavailable);
        }
        Ok(self.rows.clone())
    }
}

// =============================================================================
// Select Tests
// =============================================================================

#[test]
fn test_full_select() {
    let entity = books();
    let modes = MatchModeRegistry::standard();
    let request = SelectRequest::new()
        .page(40, 20)
        .sort("title", SortOrder::Desc)
        .with_pagination()
        .filters(filters(json!({
            "title": {"value": "rust", "matchMode": "contains"},
            "pages": {"value": [100, 500], "matchMode": "between"}
        })));

    let statement = QueryAssembler::new(&entity, &modes).select(&request);
    assert_eq!(
        statement.sql,
        "SELECT \"id\", \"title\", \"pages\", COUNT(*) OVER () AS total \
         FROM \"library\".\"books\" \
         WHERE (\"pages\" >= $1 AND \"pages\" <= $2) AND LOWER(\"title\") LIKE $3 \
         ORDER BY \"title\" DESC LIMIT $4 OFFSET $5"
    );
    assert_eq!(
        statement.args.values(),
        [json!(100), json!(500), json!("%rust%"), json!(20), json!(40)]
    );
    assert!(statement.dropped.is_empty());
}

#[test]
fn test_bare_select() {
    let entity = books();
    let modes = MatchModeRegistry::standard();
    let statement = QueryAssembler::new(&entity, &modes).select(&SelectRequest::new());
    assert_eq!(
        statement.sql,
        "SELECT \"id\", \"title\", \"pages\" FROM \"library\".\"books\""
    );
    assert!(statement.args.is_empty());
}

#[test]
fn test_or_between_fields() {
    let entity = books();
    let modes = MatchModeRegistry::standard();
    let request = SelectRequest::new()
        .operator(BoolOperator::Or)
        .filters(filters(json!({"id": {"value": 1}, "pages": {"value": 2}})));

    let statement = QueryAssembler::new(&entity, &modes).select(&request);
    assert!(statement.sql.ends_with("WHERE \"id\" = $1 OR \"pages\" = $2"));
}

/// Sorting or filtering on a field outside the select catalog is dropped.
#[test]
fn test_non_selectable_fields_are_dropped() {
    let entity = books();
    let modes = MatchModeRegistry::standard();
    let request = SelectRequest::new()
        .sort("isbn", SortOrder::Asc)
        .filters(filters(json!({"isbn": {"value": "978"}})));

    let statement = QueryAssembler::new(&entity, &modes).select(&request);
    assert!(!statement.sql.contains("isbn"));
    assert!(!statement.sql.contains("ORDER BY"));
    assert_eq!(statement.dropped.len(), 1);
    assert!(statement.args.is_empty());
}

#[test]
fn test_request_from_json() {
    let request: SelectRequest = serde_json::from_value(json!({
        "first": 10,
        "rows": 5,
        "sortField": "pages",
        "sortOrder": "desc",
        "operator": "or",
        "filters": {"pages": {"value": 3, "matchMode": "gt"}}
    }))
    .unwrap();
    assert_eq!(request.first, 10);
    assert_eq!(request.sort_order, SortOrder::Desc);
    assert_eq!(request.operator, BoolOperator::Or);
    assert_eq!(request.filters.len(), 1);
}

// =============================================================================
// Request Parser Tests
// =============================================================================

#[test]
fn test_parse_query_string() {
    let request = RequestParser::default()
        .parse(&params(&[
            ("first", "20"),
            ("rows", "10"),
            ("sortField", "title"),
            ("sortOrder", "-1"),
            ("pagination", "true"),
            ("filters", r#"{"title": {"value": "x"}}"#),
            ("utm_source", "ignored"),
        ]))
        .unwrap();

    assert_eq!(request.first, 20);
    assert_eq!(request.rows, Some(10));
    assert_eq!(request.sort_field.as_deref(), Some("title"));
    assert_eq!(request.sort_order, SortOrder::Desc);
    assert!(request.pagination);
    assert!(request.filters.contains_key("title"));
}

#[test]
fn test_parse_rejects_bad_params() {
    let parser = RequestParser::default();
    for pairs in [
        [("rows", "ten")],
        [("first", "-1")],
        [("sortOrder", "sideways")],
        [("filters", "{not json")],
    ] {
        let err = parser.parse(&params(&pairs)).unwrap_err();
        assert!(
            matches!(err, QueryError::InvalidParam(_) | QueryError::InvalidFilters(_)),
            "{:?} gave {:?}",
            pairs,
            err
        );
        assert_eq!(err.status_code(), 400);
    }
}

/// One malformed filter entry is dropped; the rest of the request stands.
#[test]
fn test_malformed_filter_is_local() {
    let entity = books();
    let modes = MatchModeRegistry::standard();
    let request = RequestParser::default()
        .parse(&params(&[(
            "filters",
            r#"{"pages": {"value": 3, "matchMode": 5}, "title": {"value": "Dune"}}"#,
        )]))
        .unwrap();

    let statement = QueryAssembler::new(&entity, &modes).select(&request);
    assert!(statement.sql.ends_with("WHERE LOWER(\"title\") = $1"));
    assert_eq!(statement.args.values(), [json!("dune")]);
    assert_eq!(statement.dropped.len(), 1);
    assert_eq!(statement.dropped[0].field, "pages");
}

#[test]
fn test_parse_enforces_row_cap() {
    let rows = (MAX_ROWS + 1).to_string();
    let err = RequestParser::default()
        .parse(&params(&[("rows", rows.as_str())]))
        .unwrap_err();
    assert_eq!(err, QueryError::LimitExceeded(MAX_ROWS + 1, MAX_ROWS));
    assert_eq!(err.code(), "ANTITY_LIMIT_EXCEEDED");
}

#[test]
fn test_parser_defaults_from_config() {
    let parser = RequestParser::new(&FilterDefaults {
        max_rows: 50,
        default_rows: Some(25),
        operator: BoolOperator::Or,
    });
    let request = parser.parse(&HashMap::new()).unwrap();
    assert_eq!(request.rows, Some(25));
    assert_eq!(request.operator, BoolOperator::Or);
    assert!(parser.parse(&params(&[("rows", "51")])).is_err());
}

// =============================================================================
// Write Statement Tests
// =============================================================================

#[test]
fn test_insert_statement() {
    let statement = statements::insert(
        &books(),
        &[
            record(json!({"title": "A", "pages": 10, "isbn": "1"})),
            record(json!({"title": "B"})),
        ],
        Some("id"),
    )
    .unwrap();
    assert_eq!(
        statement.sql,
        "INSERT INTO \"library\".\"books\" (\"title\", \"pages\", \"isbn\") \
         VALUES ($1, $2, $3), ($4, $5, $6) RETURNING \"id\""
    );
    assert_eq!(
        statement.args.values(),
        [json!("A"), json!(10), json!("1"), json!("B"), Value::Null, Value::Null]
    );
}

#[test]
fn test_update_and_merge_statements() {
    let entity = books();

    let update = statements::update(&entity, &record(json!({"title": "T"})), 7).unwrap();
    assert_eq!(
        update.sql,
        "UPDATE \"library\".\"books\" SET \"title\" = $1, \"pages\" = $2 WHERE \"id\" = $3"
    );
    assert_eq!(update.args.values(), [json!("T"), Value::Null, json!(7)]);

    let merge = statements::merge(&entity, &record(json!({"pages": 9})), 7).unwrap();
    assert_eq!(
        merge.sql,
        "UPDATE \"library\".\"books\" SET \"pages\" = $1 WHERE \"id\" = $2"
    );

    let err = statements::merge(&entity, &record(json!({"isbn": "x"})), 7).unwrap_err();
    assert_eq!(err.code(), "ANTITY_NOTHING_TO_WRITE");
}

#[test]
fn test_delete_statements() {
    let entity = books();

    let by_id = statements::delete_ids(&entity, &[json!(1), json!(2)]).unwrap();
    assert_eq!(
        by_id.sql,
        "DELETE FROM \"library\".\"books\" WHERE \"id\" = ANY($1)"
    );
    assert_eq!(by_id.args.values(), [json!([1, 2])]);
    assert_eq!(
        statements::delete_ids(&entity, &[]).unwrap_err(),
        QueryError::NoRecords
    );

    let cutoff = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let archived = statements::delete_archived(&entity, cutoff);
    assert_eq!(
        archived.sql,
        "DELETE FROM \"library\".\"books\" WHERE \"archivedAt\" < $1"
    );
    assert_eq!(archived.args.values(), [json!("2024-01-01T00:00:00+00:00")]);
}

// =============================================================================
// Executor Tests
// =============================================================================

#[tokio::test]
async fn test_sql_entity_select() {
    let books = SqlEntity::new(
        Arc::new(books()),
        Capture {
            rows: vec![json!({"id": 1, "title": "Dune", "pages": 412})],
            ..Capture::default()
        },
    );

    let rows = books
        .select(&SelectRequest::new().page(0, 1))
        .await
        .unwrap();
    assert_eq!(rows[0]["title"], "Dune");

    let seen = books.executor().statements.lock().await;
    assert!(seen[0].0.ends_with("LIMIT $1 OFFSET $2"));
    assert_eq!(seen[0].1, [json!(1), json!(0)]);
}

#[tokio::test]
async fn test_sql_entity_writes_validate_first() {
    let books = SqlEntity::new(Arc::new(books()), Capture::default());

    let mut bad = vec![record(json!({"title": "ok", "pages": 0}))];
    let err = books.insert(&mut bad, None).await.unwrap_err();
    match err {
        ExecuteError::Query(QueryError::Validation(e)) => assert_eq!(e.key(), Some("pages")),
        other => panic!("expected a validation failure, got {:?}", other),
    }
    assert!(books.executor().statements.lock().await.is_empty());

    let mut good = record(json!({"title": "  Spaced  "}));
    books.update(&mut good, 3).await.unwrap();
    let seen = books.executor().statements.lock().await;
    assert_eq!(seen[0].1[0], json!("Spaced"));
}

#[tokio::test]
async fn test_sql_entity_merge_and_delete() {
    let books = SqlEntity::new(Arc::new(books()), Capture::default());

    let mut patch = record(json!({"title": "Emma", "pages": 12}));
    books.merge(&mut patch, 5).await.unwrap();
    books.delete(&[json!(5)]).await.unwrap();

    let seen = books.executor().statements.lock().await;
    assert!(seen[0].0.starts_with("UPDATE"));
    assert!(seen[1].0.starts_with("DELETE"));
}

#[tokio::test]
async fn test_database_errors_pass_through() {
    let books = SqlEntity::new(
        Arc::new(books()),
        Capture {
            fail: true,
            ..Capture::default()
        },
    );

    let err = books.select(&SelectRequest::new()).await.unwrap_err();
    assert!(err.database().is_some());
    assert_eq!(err.to_string(), "database unavailable");
}
