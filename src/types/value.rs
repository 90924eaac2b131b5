use serde::Serialize;
use std::fmt;

/// A value as it crosses the driver boundary, either as a bound parameter or
/// as a scanned column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Name of the runtime representation, used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Int(_) => "int64",
            SqlValue::Float(_) => "float64",
            SqlValue::Text(_) => "string",
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Int(i) => write!(f, "{i}"),
            SqlValue::Float(v) => write!(f, "{v}"),
            SqlValue::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

/// The nullable native slot a column is scanned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanType {
    Int,
    Float,
    Text,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Int => "int64",
            ScanType::Float => "float64",
            ScanType::Text => "string",
        }
    }
}
