//! Cell values.
//!
//! A closed variant over the kinds a column can hold. All comparators and
//! coercions match exhaustively on it.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use super::DataType;

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Date(DateTime<Utc>),
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the variant, used in type mismatch messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    /// String form used by regex and `$contains` matching.
    ///
    /// Integral numbers print without a fractional part; dates print as
    /// RFC 3339; null prints as the empty string.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Date(d) => d.to_rfc3339(),
        }
    }

    /// Coerce this value to a column's declared type.
    ///
    /// Null passes through untouched (nullability is checked separately).
    /// Date columns accept date values and date-like strings. On failure the
    /// value's own kind is returned so the caller can build the error.
    pub fn coerce(self, data_type: DataType) -> Result<Value, &'static str> {
        match (data_type, self) {
            (_, Value::Null) => Ok(Value::Null),
            (DataType::Unspecified, v) => Ok(v),
            (DataType::String, v @ Value::String(_)) => Ok(v),
            (DataType::Number, v @ Value::Number(_)) => Ok(v),
            (DataType::Boolean, v @ Value::Boolean(_)) => Ok(v),
            (DataType::Date, v @ Value::Date(_)) => Ok(v),
            (DataType::Date, Value::String(s)) => parse_datetime(&s).map(Value::Date).ok_or("string"),
            (_, v) => Err(v.kind()),
        }
    }

    /// Convert from JSON. Arrays and objects have no cell representation and
    /// yield `None`.
    pub fn from_json(json: &JsonValue) -> Option<Value> {
        match json {
            JsonValue::Null => Some(Value::Null),
            JsonValue::Bool(b) => Some(Value::Boolean(*b)),
            JsonValue::Number(n) => n.as_f64().map(Value::Number),
            JsonValue::String(s) => Some(Value::String(s.clone())),
            JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::Number(n) => JsonValue::Number(number_from_f64(*n)),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Date(d) => JsonValue::String(d.to_rfc3339()),
        }
    }
}

/// Parse a date-like string: RFC 3339, `YYYY-MM-DD HH:MM:SS`, or `YYYY-MM-DD`.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

/// Create a serde_json::Number from an f64, keeping integral values integral.
#[inline]
fn number_from_f64(n: f64) -> serde_json::Number {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        serde_json::Number::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).unwrap_or_else(|| serde_json::Number::from(0))
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::String(s) => write!(f, "\"{}\"", s),
            other => f.write_str(&other.to_display_string()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = JsonValue::deserialize(deserializer)?;
        Value::from_json(&json)
            .ok_or_else(|| serde::de::Error::custom("arrays and objects are not cell values"))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(f64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Number(f64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Date(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
