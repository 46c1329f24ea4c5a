//! Lenient field readers for raw records.
//!
//! Records are not schema-validated: a missing field or one with an
//! unexpected type reads as `None`.

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::Record;

/// TeamCity timestamp format, e.g. `20160812T094312-0700`.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%z";

pub(crate) fn text(record: &Record, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn integer(record: &Record, key: &str) -> Option<i64> {
    match record.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn flag(record: &Record, key: &str) -> Option<bool> {
    match record.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub(crate) fn object<'a>(record: &'a Record, key: &str) -> Option<&'a Record> {
    record.get(key).and_then(Value::as_object)
}

pub(crate) fn timestamp(record: &Record, key: &str) -> Option<DateTime<FixedOffset>> {
    let raw = text(record, key)?;
    DateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).ok()
}
