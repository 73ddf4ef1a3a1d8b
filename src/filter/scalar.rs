//! Scalar conditions
//!
//! Each builder takes a SQL expression (a quoted column or a JSON path
//! over one), a match mode already checked against the field's category,
//! and the raw value. Values are converted, then bound; nothing from the
//! value reaches the SQL text.

use serde_json::{Number, Value};

use super::args::SqlArgs;
use super::compiler::FilterAnomaly;
use super::match_mode::{Comparator, MatchMode};
use crate::types::checks::parse_date;

pub(super) type Condition = Result<String, FilterAnomaly>;

/// Case-folded text comparison or pattern match.
pub(super) fn text(expr: &str, mode: MatchMode, value: &Value, args: &mut SqlArgs) -> Condition {
    let comparator = mode.comparator();
    match comparator {
        Comparator::Any => any(expr, value, args, text_value),
        Comparator::Eq | Comparator::Ne | Comparator::Like { .. } => {
            let folded = text_value(value)?
                .as_str()
                .map(str::to_lowercase)
                .unwrap_or_default();
            let bound = match comparator {
                Comparator::Like {
                    leading, trailing, ..
                } => pattern(&folded, leading, trailing),
                _ => folded,
            };
            let op = comparator
                .operator()
                .ok_or(FilterAnomaly::UnsupportedMode(mode))?;
            Ok(format!("LOWER({}) {} {}", expr, op, args.bind(bound)))
        }
        _ => Err(FilterAnomaly::UnsupportedMode(mode)),
    }
}

pub(super) fn number(expr: &str, mode: MatchMode, value: &Value, args: &mut SqlArgs) -> Condition {
    ordered(expr, mode, value, args, number_value)
}

pub(super) fn date(expr: &str, mode: MatchMode, value: &Value, args: &mut SqlArgs) -> Condition {
    ordered(expr, mode, value, args, date_value)
}

pub(super) fn boolean(expr: &str, mode: MatchMode, value: &Value, args: &mut SqlArgs) -> Condition {
    match mode.comparator() {
        Comparator::Eq | Comparator::Ne => binary(expr, mode, bool_value(value)?, args),
        _ => Err(FilterAnomaly::UnsupportedMode(mode)),
    }
}

/// Binary comparators, ranges and `= ANY` over one value converter.
fn ordered(
    expr: &str,
    mode: MatchMode,
    value: &Value,
    args: &mut SqlArgs,
    convert: fn(&Value) -> Result<Value, FilterAnomaly>,
) -> Condition {
    match mode.comparator() {
        Comparator::Range => range(expr, value, args, convert),
        Comparator::Any => any(expr, value, args, convert),
        Comparator::Like { .. } => Err(FilterAnomaly::UnsupportedMode(mode)),
        _ => binary(expr, mode, convert(value)?, args),
    }
}

fn binary(expr: &str, mode: MatchMode, value: Value, args: &mut SqlArgs) -> Condition {
    let op = mode
        .comparator()
        .operator()
        .ok_or(FilterAnomaly::UnsupportedMode(mode))?;
    Ok(format!("{} {} {}", expr, op, args.bind(value)))
}

/// `[from, to]`, both inclusive; a `null` side is open.
pub(super) fn range(
    expr: &str,
    value: &Value,
    args: &mut SqlArgs,
    convert: fn(&Value) -> Result<Value, FilterAnomaly>,
) -> Condition {
    let bounds = match value.as_array().map(Vec::as_slice) {
        Some([from, to]) => [from, to],
        _ => return Err(FilterAnomaly::BadValue("two-element [from, to] array")),
    };
    let [from, to] = bounds.map(|side| (!side.is_null()).then(|| convert(side)).transpose());
    let (from, to) = (from?, to?);

    let mut parts = Vec::with_capacity(2);
    if let Some(from) = from {
        parts.push(format!("{} >= {}", expr, args.bind(from)));
    }
    if let Some(to) = to {
        parts.push(format!("{} <= {}", expr, args.bind(to)));
    }
    match parts.as_slice() {
        [] => Err(FilterAnomaly::BadValue("range with at least one bound")),
        [one] => Ok(one.clone()),
        _ => Ok(format!("({})", parts.join(" AND "))),
    }
}

/// `expr = ANY($n)`, the whole list bound as one argument.
pub(super) fn any(
    expr: &str,
    value: &Value,
    args: &mut SqlArgs,
    convert: fn(&Value) -> Result<Value, FilterAnomaly>,
) -> Condition {
    let items = match value {
        Value::Array(items) if !items.is_empty() => items
            .iter()
            .map(convert)
            .collect::<Result<Vec<_>, _>>()?,
        Value::Array(_) => return Err(FilterAnomaly::BadValue("non-empty list")),
        scalar => vec![convert(scalar)?],
    };
    Ok(format!("{} = ANY({})", expr, args.bind(Value::Array(items))))
}

/// LIKE pattern with user wildcards escaped.
pub(super) fn pattern(s: &str, leading: bool, trailing: bool) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    if leading {
        out.push('%');
    }
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    if trailing {
        out.push('%');
    }
    out
}

pub(super) fn text_value(value: &Value) -> Result<Value, FilterAnomaly> {
    match value {
        Value::String(_) => Ok(value.clone()),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        _ => Err(FilterAnomaly::BadValue("string")),
    }
}

/// Numbers, or numeric strings converted to numbers.
pub(super) fn number_value(value: &Value) -> Result<Value, FilterAnomaly> {
    match value {
        Value::Number(_) => Ok(value.clone()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Ok(Value::Number(i.into()));
            }
            s.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or(FilterAnomaly::BadValue("number"))
        }
        _ => Err(FilterAnomaly::BadValue("number")),
    }
}

/// Date strings (RFC 3339 or `YYYY-MM-DD`) or epoch milliseconds.
pub(super) fn date_value(value: &Value) -> Result<Value, FilterAnomaly> {
    match value {
        Value::String(s) if parse_date(s).is_some() => Ok(value.clone()),
        Value::Number(n) if n.is_i64() => Ok(value.clone()),
        _ => Err(FilterAnomaly::BadValue("date")),
    }
}

pub(super) fn bool_value(value: &Value) -> Result<Value, FilterAnomaly> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::String(s) if s == "true" => Ok(Value::Bool(true)),
        Value::String(s) if s == "false" => Ok(Value::Bool(false)),
        _ => Err(FilterAnomaly::BadValue("boolean")),
    }
}
