//! CLI command implementations
//!
//! Each command loads its inputs, runs one library operation and returns
//! the `data` payload of the response envelope. `run` writes the envelope.

use std::path::Path;

use serde_json::{json, Value};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_json, records_from, write_error, write_response};
use crate::config::AntityConfig;
use crate::filter::MatchModeRegistry;
use crate::pipeline::ValidationError;
use crate::query::{QueryAssembler, SelectRequest};
use crate::schema::{load_entity, Entity, Intent, Operation};

/// Main CLI entry point
///
/// Parses arguments, runs the command and writes one envelope to stdout.
/// On failure the error envelope is written and the error returned, so the
/// binary can exit non-zero.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    match execute(cli) {
        Ok(data) => write_response(data),
        Err(err) => {
            write_error(&err)?;
            Err(err)
        }
    }
}

fn execute(cli: Cli) -> CliResult<Value> {
    let config = match &cli.config {
        Some(path) => AntityConfig::load(path)?,
        None => AntityConfig::from_env()?,
    };
    run_command(&config, cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(config: &AntityConfig, cmd: Command) -> CliResult<Value> {
    match cmd {
        Command::Validate {
            entity,
            records,
            op,
        } => validate(config, &entity, &records, &op),
        Command::Normalize { entity, records } => normalize(config, &entity, &records),
        Command::Compile { entity, request } => compile(config, &entity, &request),
        Command::Columns { entity, op, total } => columns(config, &entity, &op, total),
    }
}

/// Validate a batch; the data is the sanitized and normalized records.
pub fn validate(config: &AntityConfig, entity: &Path, records: &Path, op: &str) -> CliResult<Value> {
    let entity = entity_from(config, entity)?;
    let intent = Intent::parse(op).ok_or_else(|| ValidationError::InvalidVerb {
        received: op.to_string(),
        accepted: Intent::accepted().join(", "),
    })?;

    let mut records = records_from(read_json(records)?)?;
    entity.validate(&mut records, intent)?;
    Ok(json!({ "records": records }))
}

/// Sanitize and normalize a batch.
pub fn normalize(config: &AntityConfig, entity: &Path, records: &Path) -> CliResult<Value> {
    let entity = entity_from(config, entity)?;
    let mut records = records_from(read_json(records)?)?;
    entity.normalize(&mut records);
    Ok(json!({ "records": records }))
}

/// Compile a select request.
pub fn compile(config: &AntityConfig, entity: &Path, request: &Path) -> CliResult<Value> {
    let entity = entity_from(config, entity)?;
    let mut request: SelectRequest = serde_json::from_value(read_json(request)?)?;

    request.rows = config.request_parser().page_size(request.rows)?;

    let modes = MatchModeRegistry::standard();
    let statement = QueryAssembler::new(&entity, &modes).select(&request);
    let dropped: Vec<Value> = statement
        .dropped
        .iter()
        .map(|d| json!({ "field": d.field, "reason": d.anomaly.to_string() }))
        .collect();

    Ok(json!({
        "sql": statement.sql,
        "args": statement.args,
        "dropped": dropped
    }))
}

/// Column catalog of one operation.
pub fn columns(config: &AntityConfig, entity: &Path, op: &str, total: bool) -> CliResult<Value> {
    let entity = entity_from(config, entity)?;
    let op = Operation::parse(op).ok_or_else(|| {
        CliError::InvalidArgument(format!(
            "unknown operation {:?}, expected one of: {}",
            op,
            Operation::ALL.map(|o| o.as_str()).join(", ")
        ))
    })?;

    Ok(json!({
        "operation": op.as_str(),
        "columns": entity.columns(op),
        "list": entity.column_list(op, total),
        "unsafe": entity.unsafe_properties()
    }))
}

fn entity_from(config: &AntityConfig, path: &Path) -> CliResult<Entity> {
    let types = config.type_registry();
    Ok(load_entity(path, &types)?.with_sanitize_limits(config.sanitize.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const PEOPLE: &str = r#"{
        "name": "Person",
        "table": "people",
        "properties": [
            {"key": "id", "type": "integer", "operations": ["select", "delete"]},
            {"key": "name", "type": "string", "required": true, "max": 20,
             "normalize": true, "normalizer": "capitalize"},
            {"key": "age", "type": "integer", "min": 0, "max": 120},
            {"key": "password", "type": "password", "safe": false,
             "operations": ["insert", "update"]}
        ]
    }"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_validate_returns_cleaned_records() {
        let dir = TempDir::new().unwrap();
        let entity = write(&dir, "people.json", PEOPLE);
        let records = write(&dir, "rows.json", r#"[{"name": "  ada  ", "age": 36}]"#);

        let data = validate(&AntityConfig::default(), &entity, &records, "select").unwrap();
        assert_eq!(data["records"][0]["name"], "Ada");
    }

    #[test]
    fn test_validate_reports_first_failure() {
        let dir = TempDir::new().unwrap();
        let entity = write(&dir, "people.json", PEOPLE);
        let records = write(&dir, "rows.json", r#"[{"name": "a", "age": 150}, {}]"#);

        let err = validate(&AntityConfig::default(), &entity, &records, "POST").unwrap_err();
        assert_eq!(err.code(), "ANTITY_INVALID_FIELD");
        assert_eq!(err.key(), Some("age"));
    }

    #[test]
    fn test_validate_rejects_unknown_intent() {
        let dir = TempDir::new().unwrap();
        let entity = write(&dir, "people.json", PEOPLE);
        let records = write(&dir, "rows.json", "{}");

        let err = validate(&AntityConfig::default(), &entity, &records, "upsert").unwrap_err();
        assert_eq!(err.code(), "ANTITY_INVALID_VERB");
    }

    #[test]
    fn test_normalize() {
        let dir = TempDir::new().unwrap();
        let entity = write(&dir, "people.json", PEOPLE);
        let records = write(&dir, "rows.json", r#"{"name": " grace hopper "}"#);

        let data = normalize(&AntityConfig::default(), &entity, &records).unwrap();
        assert_eq!(data["records"][0]["name"], "Grace hopper");
    }

    #[test]
    fn test_compile() {
        let dir = TempDir::new().unwrap();
        let entity = write(&dir, "people.json", PEOPLE);
        let request = write(
            &dir,
            "request.json",
            r#"{"rows": 10, "filters": {
                "age": {"value": [18, 30], "matchMode": "between"},
                "nickname": {"value": "x"}
            }}"#,
        );

        let data = compile(&AntityConfig::default(), &entity, &request).unwrap();
        assert_eq!(
            data["sql"],
            "SELECT \"id\", \"name\", \"age\" FROM \"people\" \
             WHERE (\"age\" >= $1 AND \"age\" <= $2) LIMIT $3 OFFSET $4"
        );
        assert_eq!(data["args"], json!([18, 30, 10, 0]));
        assert_eq!(data["dropped"][0]["field"], "nickname");
    }

    #[test]
    fn test_compile_enforces_page_size() {
        let dir = TempDir::new().unwrap();
        let entity = write(&dir, "people.json", PEOPLE);
        let request = write(&dir, "request.json", r#"{"rows": 100000}"#);

        let err = compile(&AntityConfig::default(), &entity, &request).unwrap_err();
        assert_eq!(err.code(), "ANTITY_LIMIT_EXCEEDED");
    }

    #[test]
    fn test_compile_applies_default_rows() {
        let dir = TempDir::new().unwrap();
        let entity = write(&dir, "people.json", PEOPLE);
        let request = write(
            &dir,
            "request.json",
            r#"{"filters": {"age": {"value": 3, "matchMode": 5}, "name": {"value": "x"}}}"#,
        );
        let mut config = AntityConfig::default();
        config.filter.default_rows = Some(25);

        let data = compile(&config, &entity, &request).unwrap();
        assert_eq!(
            data["sql"],
            "SELECT \"id\", \"name\", \"age\" FROM \"people\" \
             WHERE LOWER(\"name\") = $1 LIMIT $2 OFFSET $3"
        );
        assert_eq!(data["args"], json!(["x", 25, 0]));
        assert_eq!(data["dropped"][0]["field"], "age");
    }

    #[test]
    fn test_columns() {
        let dir = TempDir::new().unwrap();
        let entity = write(&dir, "people.json", PEOPLE);

        let data = columns(&AntityConfig::default(), &entity, "update", false).unwrap();
        assert_eq!(data["columns"], json!(["name", "age", "password"]));
        assert_eq!(
            data["list"],
            "\"name\" = $1, \"age\" = $2, \"password\" = $3"
        );
        assert_eq!(data["unsafe"], json!(["password"]));

        let err = columns(&AntityConfig::default(), &entity, "PUT", false).unwrap_err();
        assert_eq!(err.code(), "ANTITY_CLI_INVALID_ARGUMENT");
    }

    #[test]
    fn test_unknown_type_fails_load() {
        let dir = TempDir::new().unwrap();
        let entity = write(
            &dir,
            "bad.json",
            r#"{"name": "x", "properties": [{"key": "a", "type": "node"}]}"#,
        );
        let err = columns(&AntityConfig::default(), &entity, "select", false).unwrap_err();
        assert_eq!(err.code(), "ANTITY_UNKNOWN_TYPE");
    }
}
