//! JSON I/O handling for CLI
//!
//! - Input: JSON files named on the command line
//! - Output: one JSON envelope on stdout, `{"status": "ok", "data": ...}`
//!   or `{"status": "error", "code": ..., "message": ...}`
//! - Logs stay on stderr

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};
use crate::pipeline::{Record, ValidationError};

/// Read and parse a JSON file
pub fn read_json(path: &Path) -> CliResult<Value> {
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("{}: {}", path.display(), e)))?;
    if content.trim().is_empty() {
        return Err(CliError::Io(format!("{}: empty input", path.display())));
    }
    Ok(serde_json::from_str(&content)?)
}

/// One object or a non-empty array of objects.
pub fn records_from(value: Value) -> CliResult<Vec<Record>> {
    match value {
        Value::Object(record) => Ok(vec![record]),
        Value::Array(items) if !items.is_empty() => items
            .into_iter()
            .map(|item| match item {
                Value::Object(record) => Ok(record),
                _ => Err(CliError::from(ValidationError::NoData)),
            })
            .collect(),
        _ => Err(ValidationError::NoData.into()),
    }
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_envelope(&json!({
        "status": "ok",
        "data": data
    }))
}

/// Write an error response to stdout
pub fn write_error(err: &CliError) -> CliResult<()> {
    let mut response = json!({
        "status": "error",
        "code": err.code(),
        "message": err.to_string()
    });
    if let Some(key) = err.key() {
        response["key"] = json!(key);
    }
    write_envelope(&response)
}

fn write_envelope(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}
