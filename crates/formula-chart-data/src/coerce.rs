use crate::dimension::DimensionType;
use serde_json::Value;

/// Placeholder a host writes for "no value" in any dimension.
pub(crate) const EMPTY_MARKER: &str = "-";

/// Parse a raw scalar into a number, yielding `NaN` for anything that has no numeric reading.
///
/// `null`, the empty string and the empty marker are missing. Strings are trimmed before
/// parsing and must be spelled as plain decimal numbers. Booleans read as `1`/`0`. Nested
/// arrays and objects are missing.
pub(crate) fn parse_number(value: &Value) -> f64 {
    match value {
        Value::Null => f64::NAN,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s == EMPTY_MARKER {
                return f64::NAN;
            }
            parse_decimal(s).unwrap_or(f64::NAN)
        }
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

/// Decimal reading of `s`. `f64::from_str` also accepts `inf`, `infinity` and `nan`; those
/// spellings are not numbers here.
fn parse_decimal(s: &str) -> Option<f64> {
    let starts_numeric = s
        .bytes()
        .next()
        .is_some_and(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.'));
    let decimal_only = s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !starts_numeric || !decimal_only {
        return None;
    }
    s.parse::<f64>().ok()
}

/// Category text for an ordinal dimension, if the raw value is a non-empty string that does not
/// read as a number.
pub(crate) fn ordinal_text(value: &Value) -> Option<&str> {
    let Value::String(s) = value else {
        return None;
    };
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == EMPTY_MARKER || parse_decimal(trimmed).is_some() {
        return None;
    }
    Some(s.as_str())
}

/// Narrow a number to the dimension's storage type.
///
/// Int values truncate toward zero. Anything an `i64` cannot hold is missing.
pub(crate) fn coerce_number(value: f64, dimension_type: DimensionType) -> f64 {
    match dimension_type {
        DimensionType::Int => {
            let truncated = value.trunc();
            // `i64::MAX as f64` rounds up to 2^63, which is already out of range.
            if truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
                truncated
            } else {
                f64::NAN
            }
        }
        _ => value,
    }
}
