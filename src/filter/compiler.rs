//! Filter compiler
//!
//! Turns a client filter map into SQL predicate fragments and positional
//! arguments. Malformed filters are dropped and logged, never fatal: the
//! query degrades instead of failing. A dropped filter leaves the argument
//! list exactly as it found it.

use serde_json::Value;
use thiserror::Error;

use super::args::SqlArgs;
use super::input::{BoolOperator, Filter, FilterInput, FilterMap};
use super::match_mode::{MatchMode, MatchModeRegistry};
use super::{scalar, structural};
use crate::observability::Event;
use crate::schema::{quote, Entity, Operation};
use crate::types::FilterCategory;

/// Column-name suffix of JSON object aggregates
pub const JSON_AGG_SUFFIX: &str = "JsonAgg";

/// Column-name suffix of integer aggregates
pub const ARRAY_AGG_SUFFIX: &str = "ArrayAgg";

/// Why a filter was dropped
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterAnomaly {
    #[error("unknown field")]
    UnknownField,

    #[error("field is not selectable")]
    NotSelectable,

    #[error("type \"{0}\" cannot be filtered")]
    NotFilterable(String),

    #[error("unknown match mode \"{0}\"")]
    UnknownMode(String),

    #[error("match mode {mode} is not allowed for {category} fields")]
    IllegalMode {
        mode: MatchMode,
        category: FilterCategory,
    },

    #[error("match mode {0} does not apply to this value")]
    UnsupportedMode(MatchMode),

    #[error("expected {0} value")]
    BadValue(&'static str),

    #[error("subProps are required for JSON aggregate filters")]
    MissingSubProps,

    #[error("empty filter list")]
    Empty,

    /// Entry matched neither the single nor the list shape
    #[error("malformed filter: {0}")]
    Malformed(String),
}

/// A filter the compiler skipped
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedFilter {
    pub field: String,
    pub anomaly: FilterAnomaly,
}

/// Output of one compile call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledFilters {
    /// One fragment per field that compiled, in field order
    pub fragments: Vec<String>,
    pub dropped: Vec<DroppedFilter>,
}

impl CompiledFilters {
    /// Fragments joined by `operator`, without the `WHERE` keyword.
    pub fn predicate(&self, operator: BoolOperator) -> Option<String> {
        if self.fragments.is_empty() {
            return None;
        }
        Some(self.fragments.join(&format!(" {} ", operator.as_str())))
    }
}

/// Compiles filters against one entity
#[derive(Debug, Clone, Copy)]
pub struct FilterCompiler<'a> {
    entity: &'a Entity,
    modes: &'a MatchModeRegistry,
}

impl<'a> FilterCompiler<'a> {
    pub fn new(entity: &'a Entity, modes: &'a MatchModeRegistry) -> Self {
        Self { entity, modes }
    }

    /// Compiles every field, binding values onto `args`.
    pub fn compile(&self, filters: &FilterMap, args: &mut SqlArgs) -> CompiledFilters {
        let mut out = CompiledFilters::default();

        for (field, input) in filters {
            match input {
                FilterInput::Single(filter) => match self.compile_one(field, filter, args) {
                    Ok(fragment) => out.fragments.push(fragment),
                    Err(anomaly) => out.skip(field, anomaly),
                },
                FilterInput::Malformed { reason, .. } => {
                    out.skip(field, FilterAnomaly::Malformed(reason.clone()))
                }
                FilterInput::Many(list) => {
                    let operator = list
                        .first()
                        .and_then(|f| f.operator)
                        .unwrap_or_default();
                    let mut parts = Vec::with_capacity(list.len());
                    for filter in list {
                        match self.compile_one(field, filter, args) {
                            Ok(fragment) => parts.push(fragment),
                            Err(anomaly) => out.skip(field, anomaly),
                        }
                    }
                    match operator.join(&parts) {
                        Some(fragment) => out.fragments.push(fragment),
                        None if list.is_empty() => out.skip(field, FilterAnomaly::Empty),
                        None => {}
                    }
                }
            }
        }

        out
    }

    /// Compiles one filter; on failure the arguments are rolled back.
    pub fn compile_one(
        &self,
        field: &str,
        filter: &Filter,
        args: &mut SqlArgs,
    ) -> Result<String, FilterAnomaly> {
        let mark = args.len();
        match self.build(field, filter, args) {
            Ok(fragment) => {
                tracing::debug!(
                    event = %Event::FilterCompiled,
                    field,
                    fragment = %fragment,
                    "filter compiled"
                );
                Ok(fragment)
            }
            Err(anomaly) => {
                args.rollback(mark);
                Err(anomaly)
            }
        }
    }

    fn build(&self, field: &str, filter: &Filter, args: &mut SqlArgs) -> Result<String, FilterAnomaly> {
        let property = self
            .entity
            .property(field)
            .ok_or(FilterAnomaly::UnknownField)?;
        if !property.applies_to(Operation::Select) {
            return Err(FilterAnomaly::NotSelectable);
        }

        let requested = filter
            .match_mode
            .as_deref()
            .map(|name| MatchMode::parse(name).ok_or_else(|| FilterAnomaly::UnknownMode(name.to_string())))
            .transpose()?;
        let column = quote(field);
        let value = &filter.value;

        if field.ends_with(JSON_AGG_SUFFIX) {
            let mode = self.checked(FilterCategory::String, requested, value)?;
            return structural::json_agg(&column, filter.sub_props.as_deref(), value, mode, args);
        }
        if field.ends_with(ARRAY_AGG_SUFFIX) {
            self.checked(FilterCategory::Array, requested, value)?;
            return structural::array_agg(&column, value, true, args);
        }

        let category = property
            .rule()
            .category()
            .ok_or_else(|| FilterAnomaly::NotFilterable(property.type_name().to_string()))?;
        let mode = self.checked(category, requested, value)?;

        if value.is_null() {
            return mode
                .null_test()
                .map(|test| format!("{} {}", column, test))
                .ok_or(FilterAnomaly::UnsupportedMode(mode));
        }

        match category {
            FilterCategory::Geometry => structural::geometry(&column, mode, value, args),
            FilterCategory::Array => structural::array_agg(&column, value, false, args),
            FilterCategory::String if value.is_object() => {
                structural::object(&column, value, mode, args)
            }
            FilterCategory::String => scalar::text(&column, mode, value, args),
            FilterCategory::Number => scalar::number(&column, mode, value, args),
            FilterCategory::Date => scalar::date(&column, mode, value, args),
            FilterCategory::Boolean => scalar::boolean(&column, mode, value, args),
        }
    }

    /// Requested mode if legal for the category, else the category default.
    fn checked(
        &self,
        category: FilterCategory,
        requested: Option<MatchMode>,
        value: &Value,
    ) -> Result<MatchMode, FilterAnomaly> {
        match requested {
            Some(mode) if self.modes.allows(category, mode) => Ok(mode),
            Some(mode) => Err(FilterAnomaly::IllegalMode { mode, category }),
            None => Ok(self.modes.default_mode(category, value)),
        }
    }
}

impl CompiledFilters {
    fn skip(&mut self, field: &str, anomaly: FilterAnomaly) {
        tracing::info!(
            event = %Event::FilterDropped,
            field,
            reason = %anomaly,
            "skipping filter"
        );
        self.dropped.push(DroppedFilter {
            field: field.to_string(),
            anomaly,
        });
    }
}
