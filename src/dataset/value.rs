use std::fmt;
use chrono::NaiveDateTime;
use serde::Serialize;
use super::schema::ColumnType;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// A single cell of a loaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
    Str(String),
}

impl Value {
    /// Parse a raw CSV cell as the given column type. Empty cells are null.
    pub fn parse(raw: &str, column_type: ColumnType) -> Value {
        if raw.is_empty() {
            return Value::Null;
        }

        match column_type {
            ColumnType::String => Value::Str(raw.to_string()),
            ColumnType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .unwrap_or_else(|_| Value::Str(raw.to_string())),
            ColumnType::Double => parse_number(raw)
                .map(Value::Float)
                .unwrap_or_else(|| Value::Str(raw.to_string())),
            ColumnType::Boolean => parse_bool(raw)
                .map(Value::Bool)
                .unwrap_or_else(|| Value::Str(raw.to_string())),
            ColumnType::Timestamp => parse_timestamp(raw)
                .map(Value::Timestamp)
                .unwrap_or_else(|| Value::Str(raw.to_string())),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value. Strings count when they read as a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Str(s) => parse_number(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "double",
            Value::Timestamp(_) => "timestamp",
            Value::Str(_) => "string",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Timestamp(ts) => serde_json::Value::String(ts.to_string()),
            Value::Str(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Loose equality against a JSON literal from a value set: numbers compare
    /// numerically, everything else by its text form.
    pub fn matches_json(&self, literal: &serde_json::Value) -> bool {
        match literal {
            serde_json::Value::Null => self.is_null(),
            serde_json::Value::Bool(b) => match self {
                Value::Bool(v) => v == b,
                Value::Str(s) => parse_bool(s) == Some(*b),
                _ => false,
            },
            serde_json::Value::Number(n) => match (self.as_f64(), n.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            serde_json::Value::String(s) => !self.is_null() && self.to_string() == *s,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Timestamp(ts) => write!(f, "{}", ts),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    // f64::from_str also accepts "inf" and "NaN"
    if !trimmed.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cell_is_null() {
        assert_eq!(Value::parse("", ColumnType::Integer), Value::Null);
        assert_eq!(Value::parse("", ColumnType::String), Value::Null);
    }

    #[test]
    fn test_parse_typed_cells() {
        assert_eq!(Value::parse("42", ColumnType::Integer), Value::Int(42));
        assert_eq!(Value::parse("2.5", ColumnType::Double), Value::Float(2.5));
        assert_eq!(Value::parse("TRUE", ColumnType::Boolean), Value::Bool(true));
        assert!(matches!(
            Value::parse("2019-01-01 00:46:40", ColumnType::Timestamp),
            Value::Timestamp(_)
        ));
    }

    #[test]
    fn test_string_numbers_are_numeric() {
        assert_eq!(Value::Str("1.5".into()).as_f64(), Some(1.5));
        assert_eq!(Value::Str("abc".into()).as_f64(), None);
        assert_eq!(Value::Str("inf".into()).as_f64(), None);
        assert_eq!(Value::Str("NaN".into()).as_f64(), None);
    }

    #[test]
    fn test_matches_json() {
        assert!(Value::Int(1).matches_json(&serde_json::json!(1.0)));
        assert!(Value::Str("2".into()).matches_json(&serde_json::json!(2)));
        assert!(Value::Str("N".into()).matches_json(&serde_json::json!("N")));
        assert!(!Value::Null.matches_json(&serde_json::json!("null")));
        assert!(Value::Bool(false).matches_json(&serde_json::json!(false)));
    }
}
