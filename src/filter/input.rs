//! Filter input model
//!
//! Filters arrive from clients as JSON:
//!
//! ```json
//! {
//!   "name":       {"value": "abc", "matchMode": "contains"},
//!   "age":        [{"value": 18, "matchMode": "gte", "operator": "and"},
//!                  {"value": 65, "matchMode": "lt"}],
//!   "tagsJsonAgg": {"value": ["red", 1], "subProps": ["color", "size"]}
//! }
//! ```
//!
//! Everything here is untrusted; the compiler validates before use.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Boolean connective between filter fragments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoolOperator {
    #[default]
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
}

impl BoolOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoolOperator::And => "AND",
            BoolOperator::Or => "OR",
        }
    }

    /// Joins fragments, parenthesising when there is more than one.
    pub fn join(&self, fragments: &[String]) -> Option<String> {
        match fragments {
            [] => None,
            [only] => Some(only.clone()),
            many => Some(format!("({})", many.join(&format!(" {} ", self.as_str())))),
        }
    }
}

impl fmt::Display for BoolOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One filter on one field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(default)]
    pub value: Value,

    /// Wire name of the match mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_mode: Option<String>,

    /// Sub-property names for JSON aggregate columns
    #[serde(default, alias = "subProp", skip_serializing_if = "Option::is_none")]
    pub sub_props: Option<Vec<String>>,

    /// Connective for a list of filters; read from the first one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<BoolOperator>,
}

impl Filter {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn mode(mut self, match_mode: impl Into<String>) -> Self {
        self.match_mode = Some(match_mode.into());
        self
    }

    pub fn sub_props<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_props = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn operator(mut self, operator: BoolOperator) -> Self {
        self.operator = Some(operator);
        self
    }
}

/// A field's filter, or several combined by the first one's operator
///
/// Each map entry is converted on its own: an entry that does not fit
/// either shape becomes `Malformed` and is dropped at compile time, so one
/// bad entry never rejects the whole map.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterInput {
    Single(Filter),
    Many(Vec<Filter>),
    Malformed { raw: Value, reason: String },
}

impl FilterInput {
    pub fn from_value(raw: Value) -> Self {
        let parsed = match &raw {
            Value::Array(_) => serde_json::from_value(raw.clone()).map(FilterInput::Many),
            _ => serde_json::from_value(raw.clone()).map(FilterInput::Single),
        };
        parsed.unwrap_or_else(|e| FilterInput::Malformed {
            raw,
            reason: e.to_string(),
        })
    }
}

impl<'de> Deserialize<'de> for FilterInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(FilterInput::from_value)
    }
}

impl Serialize for FilterInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterInput::Single(filter) => filter.serialize(serializer),
            FilterInput::Many(filters) => filters.serialize(serializer),
            FilterInput::Malformed { raw, .. } => raw.serialize(serializer),
        }
    }
}

impl From<Filter> for FilterInput {
    fn from(filter: Filter) -> Self {
        FilterInput::Single(filter)
    }
}

impl From<Vec<Filter>> for FilterInput {
    fn from(filters: Vec<Filter>) -> Self {
        FilterInput::Many(filters)
    }
}

/// Field name to filter. Ordered, so compiled text is deterministic.
pub type FilterMap = BTreeMap<String, FilterInput>;
