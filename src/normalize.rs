//! DTO normalization.
//!
//! The backend mixes PascalCase and camelCase DTOs (sometimes within one
//! response). Each canonical field declares its alternate keys in an
//! explicit table; the first non-null value among them wins, and a missing
//! field falls back to its zero value. Normalizing never fails.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

/// Alternate keys for one canonical field, in lookup order.
pub type Keys = &'static [&'static str];

/// Keys under which the backend wraps a payload.
const ENVELOPE_KEYS: Keys = &["data", "Data", "result", "Result", "items", "Items"];

/// Types that can be built from an arbitrarily-cased JSON value.
pub trait Normalize: Sized {
    fn normalize(value: &Value) -> Self;
}

/// Strip one level of `{ "data": ... }`-style envelope, if present.
///
/// Only objects whose envelope value is itself an object or array are
/// unwrapped, so a DTO that merely has a scalar `data` field is left alone.
pub fn unwrap_envelope(value: &Value) -> &Value {
    if let Value::Object(obj) = value {
        for key in ENVELOPE_KEYS {
            if let Some(inner @ (Value::Object(_) | Value::Array(_))) = obj.get(*key) {
                return inner;
            }
        }
    }
    value
}

/// Normalize a single (possibly enveloped) payload.
pub fn normalize_one<T: Normalize>(value: &Value) -> T {
    T::normalize(unwrap_envelope(value))
}

/// Normalize a (possibly enveloped) list payload. Anything that is not an
/// array after unwrapping yields an empty list.
pub fn normalize_list<T: Normalize>(value: &Value) -> Vec<T> {
    match unwrap_envelope(value) {
        Value::Array(items) => items.iter().map(T::normalize).collect(),
        _ => Vec::new(),
    }
}

/// Read-only view over a JSON object with alternate-key lookups.
pub struct Fields<'a> {
    obj: Option<&'a Map<String, Value>>,
}

impl<'a> Fields<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self {
            obj: value.as_object(),
        }
    }

    /// First non-null value among `keys`.
    pub fn first(&self, keys: Keys) -> Option<&'a Value> {
        let obj = self.obj?;
        keys.iter()
            .filter_map(|k| obj.get(*k))
            .find(|v| !v.is_null())
    }

    pub fn i64(&self, keys: Keys) -> i64 {
        self.first(keys).and_then(as_i64).unwrap_or(0)
    }

    pub fn opt_i64(&self, keys: Keys) -> Option<i64> {
        self.first(keys).and_then(as_i64)
    }

    pub fn f64(&self, keys: Keys) -> f64 {
        self.first(keys).and_then(as_f64).unwrap_or(0.0)
    }

    pub fn decimal(&self, keys: Keys) -> Decimal {
        self.first(keys).and_then(as_decimal).unwrap_or_default()
    }

    /// String value; numbers are rendered so numeric ids survive.
    pub fn string(&self, keys: Keys) -> String {
        self.opt_string(keys).unwrap_or_default()
    }

    pub fn opt_string(&self, keys: Keys) -> Option<String> {
        match self.first(keys)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn bool(&self, keys: Keys) -> bool {
        match self.first(keys) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true") || s == "1",
            _ => false,
        }
    }

    pub fn datetime(&self, keys: Keys) -> Option<DateTime<Utc>> {
        self.first(keys).and_then(as_datetime)
    }

    pub fn list<T: Normalize>(&self, keys: Keys) -> Vec<T> {
        match self.first(keys) {
            Some(Value::Array(items)) => items.iter().map(T::normalize).collect(),
            _ => Vec::new(),
        }
    }

    pub fn string_list(&self, keys: Keys) -> Vec<String> {
        match self.first(keys) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Nested object normalized as `T`, or `None` when absent.
    pub fn nested<T: Normalize>(&self, keys: Keys) -> Option<T> {
        self.first(keys).filter(|v| v.is_object()).map(T::normalize)
    }
}

fn as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => {
            Decimal::from_str(&n.to_string())
                .ok()
                .or_else(|| n.as_f64().and_then(Decimal::from_f64))
        }
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// RFC 3339, zone-less ISO-8601 (taken as UTC), or epoch milliseconds.
pub(crate) fn as_datetime(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TOTAL: Keys = &["total", "Total"];
    const NAME: Keys = &["name", "Name"];

    #[test]
    fn test_first_non_null_wins() {
        let v = json!({"total": null, "Total": 7});
        assert_eq!(Fields::new(&v).i64(TOTAL), 7);

        let v = json!({"total": 3, "Total": 7});
        assert_eq!(Fields::new(&v).i64(TOTAL), 3);
    }

    #[test]
    fn test_missing_fields_default_to_zero_values() {
        let v = json!({});
        let f = Fields::new(&v);
        assert_eq!(f.i64(TOTAL), 0);
        assert_eq!(f.f64(TOTAL), 0.0);
        assert_eq!(f.decimal(TOTAL), Decimal::ZERO);
        assert_eq!(f.string(NAME), "");
        assert!(!f.bool(NAME));
        assert!(f.datetime(NAME).is_none());
        assert!(f.string_list(NAME).is_empty());
    }

    #[test]
    fn test_non_object_input_is_all_defaults() {
        let v = json!([1, 2, 3]);
        assert_eq!(Fields::new(&v).i64(TOTAL), 0);
        let v = Value::Null;
        assert_eq!(Fields::new(&v).string(NAME), "");
    }

    #[test]
    fn test_numeric_strings_are_tolerated() {
        let v = json!({"Total": "42", "name": 17});
        let f = Fields::new(&v);
        assert_eq!(f.i64(TOTAL), 42);
        assert_eq!(f.string(NAME), "17");
    }

    #[test]
    fn test_decimal_keeps_precision() {
        let v = json!({"total": 1234.56});
        assert_eq!(Fields::new(&v).decimal(TOTAL), Decimal::from_str("1234.56").unwrap());
    }

    #[test]
    fn test_timestamps_with_and_without_zone() {
        let a = parse_timestamp("2024-05-01T10:00:00Z").unwrap();
        let b = parse_timestamp("2024-05-01T10:00:00").unwrap();
        let c = parse_timestamp("2024-05-01T12:00:00.000+02:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_envelope_unwrapping() {
        let v = json!({"success": true, "data": {"total": 1}});
        assert_eq!(unwrap_envelope(&v), &json!({"total": 1}));

        // scalar `data` is a real field, not an envelope
        let v = json!({"data": "payload", "total": 1});
        assert_eq!(unwrap_envelope(&v), &v);
    }
}
