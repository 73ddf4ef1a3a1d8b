//! Primitive type checks
//!
//! Pure, total functions over JSON values. Each returns `Ok(())` or the
//! `TypeViolation` describing the rejection. `strict` disables coercion of
//! numeric strings (the original `typeCheck` flag).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde_json::Value;
use std::net::IpAddr;
use std::sync::OnceLock;

use super::bounds::Bounds;
use super::violation::TypeViolation;

type CheckResult = Result<(), TypeViolation>;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
            .expect("email pattern is valid")
    })
}

fn slug_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug pattern is valid"))
}

fn hex_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:0[xXhH])?[0-9A-Fa-f]+$").expect("hexadecimal pattern is valid")
    })
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*$")
            .expect("identifier pattern is valid")
    })
}

// =============================================================================
// Numeric family
// =============================================================================

/// Reads a number, accepting numeric strings unless `strict`.
fn numeric(value: &Value, strict: bool, expected: &'static str) -> Result<f64, TypeViolation> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| TypeViolation::wrong_type(expected, value)),
        Value::String(s) if !strict => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| TypeViolation::wrong_type(expected, value)),
        _ => Err(TypeViolation::wrong_type(expected, value)),
    }
}

fn integral(value: &Value, strict: bool, expected: &'static str) -> Result<f64, TypeViolation> {
    let n = numeric(value, strict, expected)?;
    if n.fract() != 0.0 {
        return Err(TypeViolation::wrong_type(expected, value));
    }
    Ok(n)
}

fn within(n: f64, bounds: &Bounds, expected: &'static str) -> CheckResult {
    if bounds.contains(n) {
        Ok(())
    } else {
        Err(TypeViolation::out_of_range(
            expected,
            bounds.min_label(),
            bounds.max_label(),
            format!("number: {}", n),
        ))
    }
}

pub fn number(value: &Value, bounds: &Bounds, strict: bool) -> CheckResult {
    let n = numeric(value, strict, "number")?;
    within(n, bounds, "number")
}

pub fn integer(value: &Value, bounds: &Bounds, strict: bool) -> CheckResult {
    let n = integral(value, strict, "integer")?;
    within(n, bounds, "integer")
}

/// Finite number with a fractional part.
pub fn float(value: &Value, bounds: &Bounds, strict: bool) -> CheckResult {
    let n = numeric(value, strict, "float")?;
    if n.fract() == 0.0 {
        return Err(TypeViolation::wrong_type("float", value));
    }
    within(n, bounds, "float")
}

pub fn even(value: &Value, _bounds: &Bounds, strict: bool) -> CheckResult {
    let n = integral(value, strict, "even integer")?;
    if n % 2.0 == 0.0 {
        Ok(())
    } else {
        Err(TypeViolation::format("even integer", value))
    }
}

pub fn odd(value: &Value, _bounds: &Bounds, strict: bool) -> CheckResult {
    let n = integral(value, strict, "odd integer")?;
    if n % 2.0 != 0.0 {
        Ok(())
    } else {
        Err(TypeViolation::format("odd integer", value))
    }
}

pub fn positive(value: &Value, _bounds: &Bounds, strict: bool) -> CheckResult {
    let n = numeric(value, strict, "positive number")?;
    if n > 0.0 {
        Ok(())
    } else {
        Err(TypeViolation::format("positive number", value))
    }
}

pub fn negative(value: &Value, _bounds: &Bounds, strict: bool) -> CheckResult {
    let n = numeric(value, strict, "negative number")?;
    if n < 0.0 {
        Ok(())
    } else {
        Err(TypeViolation::format("negative number", value))
    }
}

pub fn power_of_two(value: &Value, _bounds: &Bounds, strict: bool) -> CheckResult {
    let n = integral(value, strict, "power of two")?;
    if n >= 1.0 && n <= u64::MAX as f64 {
        let k = n as u64;
        if k & (k - 1) == 0 {
            return Ok(());
        }
    }
    Err(TypeViolation::format("power of two", value))
}

/// ASCII character code. The flag widens the range to extended ASCII
/// instead of toggling coercion.
pub fn ascii(value: &Value, _bounds: &Bounds, extended: bool) -> CheckResult {
    let n = integral(value, false, "ascii code")?;
    let max = if extended { 255.0 } else { 127.0 };
    if (0.0..=max).contains(&n) {
        Ok(())
    } else {
        Err(TypeViolation::out_of_range(
            "ascii code",
            0,
            max,
            format!("number: {}", n),
        ))
    }
}

// =============================================================================
// String family
// =============================================================================

fn text<'v>(value: &'v Value, expected: &'static str) -> Result<&'v str, TypeViolation> {
    value
        .as_str()
        .ok_or_else(|| TypeViolation::wrong_type(expected, value))
}

pub fn string(value: &Value, bounds: &Bounds, _strict: bool) -> CheckResult {
    let s = text(value, "string")?;
    let length = s.chars().count();
    let min = bounds.min_len().unwrap_or(0);
    let max = bounds.max_len().unwrap_or(usize::MAX);
    if length < min || length > max {
        return Err(TypeViolation::out_of_range(
            "string length",
            bounds.min_label(),
            bounds.max_label(),
            format!("length: {}", length),
        ));
    }
    Ok(())
}

pub fn email(value: &Value, _bounds: &Bounds, _strict: bool) -> CheckResult {
    let s = text(value, "email")?;
    if s.len() <= 254 && email_pattern().is_match(s) {
        Ok(())
    } else {
        Err(TypeViolation::format("email", value))
    }
}

pub fn regex(value: &Value, _bounds: &Bounds, _strict: bool) -> CheckResult {
    let s = text(value, "regular expression")?;
    Regex::new(s)
        .map(|_| ())
        .map_err(|_| TypeViolation::format("regular expression", value))
}

/// JSON text. Without `strict`, already-structured objects and arrays pass.
pub fn json(value: &Value, _bounds: &Bounds, strict: bool) -> CheckResult {
    match value {
        Value::String(s) => serde_json::from_str::<Value>(s)
            .map(|_| ())
            .map_err(|_| TypeViolation::format("json", value)),
        Value::Object(_) | Value::Array(_) if !strict => Ok(()),
        _ => Err(TypeViolation::wrong_type("json", value)),
    }
}

/// Three base64url segments whose header and payload decode to JSON objects.
pub fn jwt(value: &Value, _bounds: &Bounds, _strict: bool) -> CheckResult {
    let s = text(value, "jwt")?;
    let segments: Vec<&str> = s.split('.').collect();
    if segments.len() != 3 || segments.iter().any(|seg| seg.is_empty()) {
        return Err(TypeViolation::format("jwt", value));
    }

    for segment in &segments[..2] {
        let decoded = URL_SAFE_NO_PAD
            .decode(segment.trim_end_matches('='))
            .map_err(|_| TypeViolation::format("jwt", value))?;
        match serde_json::from_slice::<Value>(&decoded) {
            Ok(Value::Object(_)) => {}
            _ => return Err(TypeViolation::format("jwt", value)),
        }
    }

    URL_SAFE_NO_PAD
        .decode(segments[2].trim_end_matches('='))
        .map(|_| ())
        .map_err(|_| TypeViolation::format("jwt", value))
}

pub fn slug(value: &Value, _bounds: &Bounds, _strict: bool) -> CheckResult {
    let s = text(value, "slug")?;
    if slug_pattern().is_match(s) {
        Ok(())
    } else {
        Err(TypeViolation::format("slug", value))
    }
}

pub fn hexadecimal(value: &Value, _bounds: &Bounds, _strict: bool) -> CheckResult {
    let s = text(value, "hexadecimal")?;
    if hex_pattern().is_match(s) {
        Ok(())
    } else {
        Err(TypeViolation::format("hexadecimal", value))
    }
}

pub fn ip_address(value: &Value, _bounds: &Bounds, _strict: bool) -> CheckResult {
    let s = text(value, "ip address")?;
    s.parse::<IpAddr>()
        .map(|_| ())
        .map_err(|_| TypeViolation::format("ip address", value))
}

/// Name of a callable (stored procedure, registered handler).
pub fn function(value: &Value, _bounds: &Bounds, _strict: bool) -> CheckResult {
    let s = text(value, "function name")?;
    if identifier_pattern().is_match(s) {
        Ok(())
    } else {
        Err(TypeViolation::format("function name", value))
    }
}

// =============================================================================
// Containers
// =============================================================================

pub fn boolean(value: &Value, _bounds: &Bounds, _strict: bool) -> CheckResult {
    if value.is_boolean() {
        Ok(())
    } else {
        Err(TypeViolation::wrong_type("boolean", value))
    }
}

pub fn array(value: &Value, bounds: &Bounds, _strict: bool) -> CheckResult {
    let items = value
        .as_array()
        .ok_or_else(|| TypeViolation::wrong_type("array", value))?;
    let min = bounds.min_len().unwrap_or(0);
    let max = bounds.max_len().unwrap_or(usize::MAX);
    if items.len() < min || items.len() > max {
        return Err(TypeViolation::out_of_range(
            "array length",
            bounds.min_label(),
            bounds.max_label(),
            format!("length: {}", items.len()),
        ));
    }
    Ok(())
}

pub fn object(value: &Value, _bounds: &Bounds, _strict: bool) -> CheckResult {
    if value.is_object() {
        Ok(())
    } else {
        Err(TypeViolation::wrong_type("object", value))
    }
}

/// Point (`lng`, `lat`) or envelope (`bounds` with min/max lng/lat).
pub fn geometry(value: &Value, _bounds: &Bounds, _strict: bool) -> CheckResult {
    let obj = value
        .as_object()
        .ok_or_else(|| TypeViolation::wrong_type("geometry", value))?;

    let numeric_keys = |o: &serde_json::Map<String, Value>, keys: &[&str]| {
        keys.iter().all(|k| o.get(*k).map_or(false, Value::is_number))
    };

    let is_point = numeric_keys(obj, &["lng", "lat"]);
    let is_envelope = obj
        .get("bounds")
        .and_then(Value::as_object)
        .map_or(false, |b| numeric_keys(b, &["minLng", "minLat", "maxLng", "maxLat"]));

    if is_point || is_envelope {
        Ok(())
    } else {
        Err(TypeViolation::format("geometry", value))
    }
}

// =============================================================================
// Dates
// =============================================================================

/// Parses RFC 3339 datetimes and plain `YYYY-MM-DD` dates.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn date_within(at: DateTime<Utc>, bounds: &Bounds, expected: &'static str) -> CheckResult {
    let after_min = bounds
        .min
        .and_then(|l| l.as_datetime())
        .map_or(true, |min| at >= min);
    let before_max = bounds
        .max
        .and_then(|l| l.as_datetime())
        .map_or(true, |max| at <= max);

    if after_min && before_max {
        Ok(())
    } else {
        Err(TypeViolation::out_of_range(
            expected,
            bounds.min_label(),
            bounds.max_label(),
            at.to_rfc3339(),
        ))
    }
}

/// Date string; epoch milliseconds are accepted unless `strict`.
pub fn date(value: &Value, bounds: &Bounds, strict: bool) -> CheckResult {
    let at = match value {
        Value::String(s) => parse_date(s).ok_or_else(|| TypeViolation::format("date", value))?,
        Value::Number(n) if !strict => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| TypeViolation::format("date", value))?,
        _ => return Err(TypeViolation::wrong_type("date", value)),
    };
    date_within(at, bounds, "date")
}

/// Epoch milliseconds; numeric strings are accepted unless `strict`.
pub fn timestamp(value: &Value, bounds: &Bounds, strict: bool) -> CheckResult {
    let n = integral(value, strict, "timestamp")?;
    let at = DateTime::from_timestamp_millis(n as i64)
        .ok_or_else(|| TypeViolation::format("timestamp", value))?;
    date_within(at, bounds, "timestamp")
}
