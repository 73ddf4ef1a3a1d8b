//! Structural filters
//!
//! Object values addressed by JSON path, aggregate columns and geometry.
//! JSON keys and sub-property names are bound like any other value.

use serde_json::{Map, Value};

use super::args::SqlArgs;
use super::compiler::FilterAnomaly;
use super::match_mode::{Comparator, MatchMode};
use super::scalar::{self, Condition};

/// Nesting limit for object-valued filters
pub const MAX_OBJECT_DEPTH: usize = 8;

/// SRID for envelopes and points
const SRID: i64 = 4326;

/// Object value: one condition per key, ANDed.
pub(super) fn object(base: &str, value: &Value, mode: MatchMode, args: &mut SqlArgs) -> Condition {
    let map = value
        .as_object()
        .ok_or(FilterAnomaly::BadValue("object"))?;
    object_at(base, map, mode, args, 0)
}

fn object_at(
    base: &str,
    map: &Map<String, Value>,
    mode: MatchMode,
    args: &mut SqlArgs,
    depth: usize,
) -> Condition {
    if depth >= MAX_OBJECT_DEPTH {
        return Err(FilterAnomaly::BadValue("object nested within the depth limit"));
    }
    if map.is_empty() {
        return Err(FilterAnomaly::BadValue("non-empty object"));
    }

    let mut parts = Vec::with_capacity(map.len());
    for (key, v) in map {
        let key = args.bind(key.as_str());
        let part = match v {
            Value::Object(inner) => {
                object_at(&format!("{}->{}", base, key), inner, mode, args, depth + 1)?
            }
            leaf => json_leaf(&format!("{}->>{}", base, key), leaf, mode, args)?,
        };
        parts.push(part);
    }
    Ok(parenthesised(parts, "AND"))
}

/// Condition on a text-valued JSON path expression.
fn json_leaf(expr: &str, value: &Value, mode: MatchMode, args: &mut SqlArgs) -> Condition {
    match value {
        Value::Null => mode
            .null_test()
            .map(|test| format!("{} {}", expr, test))
            .ok_or(FilterAnomaly::UnsupportedMode(mode)),
        Value::Bool(b) => Ok(format!("CAST({} AS BOOLEAN) = {}", expr, args.bind(*b))),
        Value::Number(_) => {
            let mode = if is_ordering(mode) { mode } else { MatchMode::Equals };
            scalar::number(&format!("CAST({} AS NUMERIC)", expr), mode, value, args)
        }
        Value::String(_) => scalar::text(expr, text_mode(mode), value, args),
        Value::Array(items) => {
            if !items.is_empty() && items.iter().all(Value::is_number) {
                scalar::any(&format!("CAST({} AS NUMERIC)", expr), value, args, scalar::number_value)
            } else {
                scalar::any(expr, value, args, scalar::text_value)
            }
        }
        Value::Object(_) => Err(FilterAnomaly::BadValue("scalar")),
    }
}

/// Aggregate of JSON objects: `EXISTS` over the array elements, ANDing
/// sub-properties within a tuple and ORing across tuples.
pub(super) fn json_agg(
    column: &str,
    sub_props: Option<&[String]>,
    value: &Value,
    mode: MatchMode,
    args: &mut SqlArgs,
) -> Condition {
    let sub_props = match sub_props {
        Some(names) if !names.is_empty() => names,
        _ => return Err(FilterAnomaly::MissingSubProps),
    };
    if mode.comparator() == Comparator::Range {
        return Err(FilterAnomaly::UnsupportedMode(mode));
    }

    let repeated;
    let flat: &[Value] = match value {
        Value::Array(items) => items,
        scalar => {
            repeated = vec![scalar.clone(); sub_props.len()];
            &repeated
        }
    };
    if flat.is_empty() || flat.len() % sub_props.len() != 0 {
        return Err(FilterAnomaly::BadValue("one value per sub-property"));
    }

    let mut tuples = Vec::with_capacity(flat.len() / sub_props.len());
    for tuple in flat.chunks(sub_props.len()) {
        let mut conditions = Vec::with_capacity(sub_props.len());
        for (name, v) in sub_props.iter().zip(tuple) {
            let name = args.bind(name.as_str());
            let condition = match v {
                Value::Object(inner) => object_at(&format!("p->{}", name), inner, mode, args, 1)?,
                // Element values are text; compare numbers as text
                Value::Number(n) => {
                    let op = match mode.comparator() {
                        comparator @ (Comparator::Eq | Comparator::Ne) => comparator.operator(),
                        _ => None,
                    }
                    .ok_or(FilterAnomaly::UnsupportedMode(mode))?;
                    format!("p->>{} {} {}", name, op, args.bind(n.to_string()))
                }
                leaf => json_leaf(&format!("p->>{}", name), leaf, mode, args)?,
            };
            conditions.push(condition);
        }
        tuples.push(format!("({})", conditions.join(" AND ")));
    }

    Ok(format!(
        "EXISTS (SELECT 1 FROM json_array_elements({}::json) AS p WHERE {})",
        column,
        tuples.join(" OR ")
    ))
}

/// Aggregate of scalars: `$n = ANY(column)` per element, ORed.
///
/// With `integers_only`, non-integer elements are skipped.
pub(super) fn array_agg(
    column: &str,
    value: &Value,
    integers_only: bool,
    args: &mut SqlArgs,
) -> Condition {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        scalar => vec![scalar],
    };
    let kept: Vec<&Value> = items
        .into_iter()
        .filter(|v| {
            if integers_only {
                v.is_i64() || v.is_u64()
            } else {
                v.is_string() || v.is_number() || v.is_boolean()
            }
        })
        .collect();
    if kept.is_empty() {
        return Err(FilterAnomaly::BadValue(if integers_only {
            "integer elements"
        } else {
            "scalar elements"
        }));
    }

    let parts = kept
        .into_iter()
        .map(|v| format!("{} = ANY({})", args.bind(v.clone()), column))
        .collect();
    Ok(parenthesised(parts, "OR"))
}

/// Envelope containment or point-radius proximity.
pub(super) fn geometry(column: &str, mode: MatchMode, value: &Value, args: &mut SqlArgs) -> Condition {
    match mode.comparator() {
        Comparator::Envelope => {
            let bounds = value
                .get("bounds")
                .ok_or(FilterAnomaly::BadValue("geometry bounds"))?;
            let [min_lng, min_lat, max_lng, max_lat] =
                numbers(bounds, ["minLng", "minLat", "maxLng", "maxLat"])?;
            Ok(format!(
                "ST_Contains(ST_MakeEnvelope({}, {}, {}, {}, {}), {})",
                args.bind(min_lng),
                args.bind(min_lat),
                args.bind(max_lng),
                args.bind(max_lat),
                SRID,
                column
            ))
        }
        Comparator::Radius => {
            let [lng, lat, radius] = numbers(value, ["lng", "lat", "radius"])?;
            Ok(format!(
                "ST_DWithin({}, ST_SetSRID(ST_MakePoint({}, {}), {})::geography, {})",
                column,
                args.bind(lng),
                args.bind(lat),
                SRID,
                args.bind(radius)
            ))
        }
        _ => Err(FilterAnomaly::UnsupportedMode(mode)),
    }
}

/// Reads numeric members, all or nothing.
fn numbers<const N: usize>(value: &Value, keys: [&str; N]) -> Result<[Value; N], FilterAnomaly> {
    let mut out: [Value; N] = std::array::from_fn(|_| Value::Null);
    for (slot, key) in out.iter_mut().zip(keys) {
        *slot = value
            .get(key)
            .filter(|v| v.is_number())
            .cloned()
            .ok_or(FilterAnomaly::BadValue("numeric geometry coordinates"))?;
    }
    Ok(out)
}

fn is_ordering(mode: MatchMode) -> bool {
    matches!(
        mode.comparator(),
        Comparator::Eq
            | Comparator::Ne
            | Comparator::Lt
            | Comparator::Lte
            | Comparator::Gt
            | Comparator::Gte
    )
}

fn text_mode(mode: MatchMode) -> MatchMode {
    match mode.comparator() {
        Comparator::Eq | Comparator::Ne | Comparator::Like { .. } | Comparator::Any => mode,
        _ => MatchMode::Equals,
    }
}

fn parenthesised(parts: Vec<String>, connective: &str) -> String {
    if parts.len() == 1 {
        parts.into_iter().next().unwrap_or_default()
    } else {
        format!("({})", parts.join(&format!(" {} ", connective)))
    }
}
