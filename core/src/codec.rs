//! Conversions between Pinboard's wire representations and native types.
//!
//! # Design
//! Pinboard encodes booleans as `"yes"`/`"no"`, many integers as numeric
//! strings, note timestamps as `YYYY-MM-DD HH:MM:SS` and everything else as
//! RFC3339. Two of these conversions are deliberately lenient: an unparsable
//! count becomes `0` and an unparsable fixed-width timestamp becomes `None`.
//! Both outcomes are ambiguous (`0` may be a real count), which callers that
//! need certainty must keep in mind.
//!
//! The three envelope decoders check the root JSON shape before handing the
//! value to serde, so an array where an object was expected is a decode error
//! rather than a positional struct match.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// Layout of note timestamps, e.g. `2015-04-20 13:51:58`.
pub const FIXED_DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Layout of date histogram keys, e.g. `2015-07-03`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const FIXED_DATE_TIME_LEN: usize = 19;

pub fn yes_no_to_bool(s: &str) -> bool {
    s == "yes"
}

pub fn bool_to_yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

/// Parse a decimal count, returning 0 when the string is not a number.
pub fn parse_count(s: &str) -> u64 {
    s.parse().unwrap_or(0)
}

/// Parse a `YYYY-MM-DD HH:MM:SS` timestamp as UTC.
///
/// Anything that is not exactly 19 characters, or does not match the layout,
/// yields `None` instead of an error.
pub fn parse_fixed_date_time(s: &str) -> Option<DateTime<Utc>> {
    if s.len() != FIXED_DATE_TIME_LEN {
        return None;
    }
    NaiveDateTime::parse_from_str(s, FIXED_DATE_TIME_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Format as RFC3339 in UTC with second precision, e.g. `2015-07-02T17:03:45Z`.
pub fn format_rfc3339(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_date(s: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| ApiError::decode(format!("invalid date {s:?}: {e}")))
}

/// Join tags with commas for a request parameter.
///
/// Tags are trimmed and empty ones dropped; `None` means the parameter should
/// be left out entirely.
pub fn join_tags<S: AsRef<str>>(tags: &[S]) -> Option<String> {
    let joined = tags
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// Split the space-separated tag string of a post object.
pub fn split_tags(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

/// Decode an object whose values are all strings.
pub fn decode_string_map(body: &[u8]) -> Result<HashMap<String, String>, ApiError> {
    decode_object(body)
}

/// Decode an object with mixed value types into an endpoint's wire struct.
pub fn decode_object<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let value: Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(ApiError::decode(format!(
            "expected a JSON object, found {}",
            shape(&value)
        )));
    }
    Ok(serde_json::from_value(value)?)
}

/// Decode a top-level array, each element into `T`.
pub fn decode_array<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, ApiError> {
    let value: Value = serde_json::from_slice(body)?;
    if !value.is_array() {
        return Err(ApiError::decode(format!(
            "expected a JSON array, found {}",
            shape(&value)
        )));
    }
    Ok(serde_json::from_value(value)?)
}

fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
