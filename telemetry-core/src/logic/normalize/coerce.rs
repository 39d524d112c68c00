//! Tolerant value coercion
//!
//! Numbers may arrive as JSON numbers or as text with a unit suffix
//! (`"82.9C"`, `"66.4 °C"`, `"40%"`, `"82.9'C"`). Timestamps may be epoch
//! seconds (number or text) or structured date-time text.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::logic::error::CoercionError;

/// Leading number, optional degree mark (including the mis-decoded `Â°`), optional unit letters
static NUMBER_WITH_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)\s*(?:Â?[°º]|')?\s*[A-Za-z%]*$")
        .expect("unit-suffix pattern is valid")
});

/// Text values meaning "no value"
const EMPTY_MARKERS: &[&str] = &["", "nan", "null", "none", "n/a", "na", "-"];

/// Epoch values above this are milliseconds
const EPOCH_MILLIS_THRESHOLD: f64 = 1.0e11;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

// ============================================================================
// NUMBERS
// ============================================================================

/// Parse a numeric field. Failure means the field is absent.
pub fn parse_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number_text(s),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn parse_number_text(text: &str) -> Option<f64> {
    let text = text.trim();
    if is_empty_marker(text) {
        return None;
    }
    let caps = NUMBER_WITH_UNIT.captures(text)?;
    caps.get(1)?.as_str().parse::<f64>().ok()
}

fn is_empty_marker(text: &str) -> bool {
    EMPTY_MARKERS.iter().any(|m| text.eq_ignore_ascii_case(m))
}

// ============================================================================
// TEXT
// ============================================================================

/// Parse a short category string
pub fn parse_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!is_empty_marker(s)).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Discriminator text, if any
pub fn parse_tag(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.as_str()),
        _ => None,
    }
}

// ============================================================================
// TIMESTAMPS
// ============================================================================

/// Parse a timestamp value.
///
/// Offsets in structured text are converted to UTC and dropped; epoch values
/// are interpreted as UTC.
pub fn parse_timestamp(value: &Value) -> Result<NaiveDateTime, CoercionError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(from_epoch)
            .ok_or_else(|| CoercionError::InvalidTimestamp(n.to_string())),
        Value::String(s) => parse_timestamp_text(s),
        Value::Null => Err(CoercionError::MissingTimestamp),
        other => Err(CoercionError::InvalidTimestamp(other.to_string())),
    }
}

fn parse_timestamp_text(text: &str) -> Result<NaiveDateTime, CoercionError> {
    let trimmed = text.trim();
    if is_empty_marker(trimmed) {
        return Err(CoercionError::MissingTimestamp);
    }

    if let Ok(epoch) = trimmed.parse::<f64>() {
        return from_epoch(epoch).ok_or_else(|| CoercionError::InvalidTimestamp(text.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| CoercionError::InvalidTimestamp(text.to_string()))
}

fn from_epoch(value: f64) -> Option<NaiveDateTime> {
    if !value.is_finite() {
        return None;
    }
    let secs = if value.abs() > EPOCH_MILLIS_THRESHOLD { value / 1000.0 } else { value };
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos).map(|dt| dt.naive_utc())
}
