//! Polars AnyValue utility functions.
//!
//! This module provides helper functions for turning Polars `AnyValue`
//! cells into the typed values of a summary dataset.

use polars::prelude::*;

use crate::format::format_numeric;

/// Strings treated as missing when they make up a whole cell.
pub const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "NULL", "."];

/// Returns true when a text cell only holds a missing marker.
pub fn is_missing_text(value: &str) -> bool {
    let trimmed = value.trim();
    MISSING_TOKENS
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
}

/// Converts a Polars `AnyValue` to a `String` representation.
///
/// Returns an empty string for `Null`, formats floats without trailing
/// zeros and booleans as `TRUE`/`FALSE`.
///
/// # Examples
///
/// ```
/// use polars::prelude::AnyValue;
/// use tbl_common::any_to_string;
///
/// assert_eq!(any_to_string(AnyValue::Null), "");
/// assert_eq!(any_to_string(AnyValue::Int32(42)), "42");
/// assert_eq!(any_to_string(AnyValue::Boolean(true)), "TRUE");
/// ```
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => logical_label(b).to_string(),
        other => other.to_string(),
    }
}

/// Converts to text, returning `None` for nulls and missing markers.
pub fn any_to_text(value: AnyValue<'_>) -> Option<String> {
    let s = any_to_string(value);
    if is_missing_text(&s) {
        None
    } else {
        Some(s.trim().to_string())
    }
}

/// Converts an `AnyValue` to `f64`, returning `None` for non-numeric or null values.
///
/// Handles integer types, floating-point types, and string parsing.
pub fn any_to_f64(value: AnyValue<'_>) -> Option<f64> {
    match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(f64::from(v)),
        AnyValue::Int16(v) => Some(f64::from(v)),
        AnyValue::Int32(v) => Some(f64::from(v)),
        AnyValue::Int64(v) => Some(v as f64),
        AnyValue::UInt8(v) => Some(f64::from(v)),
        AnyValue::UInt16(v) => Some(f64::from(v)),
        AnyValue::UInt32(v) => Some(f64::from(v)),
        AnyValue::UInt64(v) => Some(v as f64),
        AnyValue::Float32(v) => Some(f64::from(v)).filter(|v| !v.is_nan()),
        AnyValue::Float64(v) => Some(v).filter(|v| !v.is_nan()),
        AnyValue::String(s) => parse_f64(s),
        AnyValue::StringOwned(s) => parse_f64(&s),
        _ => None,
    }
}

/// Converts an `AnyValue` to `bool`, accepting `TRUE`/`FALSE` text.
pub fn any_to_bool(value: AnyValue<'_>) -> Option<bool> {
    match value {
        AnyValue::Boolean(b) => Some(b),
        AnyValue::String(s) => parse_bool(s),
        AnyValue::StringOwned(s) => parse_bool(&s),
        _ => None,
    }
}

/// Parses a string as `f64`, returning `None` for invalid, empty or NaN strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Parses `TRUE`/`FALSE` (any case, or `T`/`F`).
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_uppercase().as_str() {
        "TRUE" | "T" => Some(true),
        "FALSE" | "F" => Some(false),
        _ => None,
    }
}

/// Level label of a logical value.
pub fn logical_label(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_to_string_null() {
        assert_eq!(any_to_string(AnyValue::Null), "");
    }

    #[test]
    fn test_any_to_string_numbers() {
        assert_eq!(any_to_string(AnyValue::Int64(-100)), "-100");
        assert_eq!(any_to_string(AnyValue::Float64(1.0)), "1");
        assert_eq!(any_to_string(AnyValue::Float64(1.50)), "1.5");
    }

    #[test]
    fn test_any_to_string_boolean() {
        assert_eq!(any_to_string(AnyValue::Boolean(true)), "TRUE");
        assert_eq!(any_to_string(AnyValue::Boolean(false)), "FALSE");
    }

    #[test]
    fn test_any_to_text_missing_markers() {
        assert_eq!(any_to_text(AnyValue::Null), None);
        assert_eq!(any_to_text(AnyValue::String("  ")), None);
        assert_eq!(any_to_text(AnyValue::String("NA")), None);
        assert_eq!(any_to_text(AnyValue::String("na")), None);
        assert_eq!(
            any_to_text(AnyValue::String(" manual ")),
            Some("manual".to_string())
        );
    }

    #[test]
    fn test_any_to_f64() {
        assert_eq!(any_to_f64(AnyValue::Null), None);
        assert_eq!(any_to_f64(AnyValue::Int32(42)), Some(42.0));
        assert_eq!(any_to_f64(AnyValue::Float64(f64::NAN)), None);
        assert_eq!(any_to_f64(AnyValue::String("2.5")), Some(2.5));
        assert_eq!(any_to_f64(AnyValue::String("invalid")), None);
    }

    #[test]
    fn test_any_to_bool() {
        assert_eq!(any_to_bool(AnyValue::Boolean(false)), Some(false));
        assert_eq!(any_to_bool(AnyValue::String("true")), Some(true));
        assert_eq!(any_to_bool(AnyValue::String("F")), Some(false));
        assert_eq!(any_to_bool(AnyValue::String("yes")), None);
        assert_eq!(any_to_bool(AnyValue::Int32(1)), None);
    }

    #[test]
    fn test_parse_f64() {
        assert_eq!(parse_f64(""), None);
        assert_eq!(parse_f64("  3.25  "), Some(3.25));
        assert_eq!(parse_f64("NaN"), None);
    }
}
