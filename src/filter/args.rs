//! Positional query arguments
//!
//! Placeholders are 1-based positions in this list. A fresh `SqlArgs` is
//! created per statement; compile steps take it by `&mut` and never keep
//! it, so compilation stays reentrant.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SqlArgs {
    values: Vec<Value>,
}

impl SqlArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value and returns its placeholder (`$n`).
    pub fn bind(&mut self, value: impl Into<Value>) -> String {
        self.values.push(value.into());
        format!("${}", self.values.len())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Drops everything bound after `mark` (a previous `len()`).
    pub(crate) fn rollback(&mut self, mark: usize) {
        self.values.truncate(mark);
    }
}
