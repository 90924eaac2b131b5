//! Temporal variants: `date` (stored as `YYYY-MM-DD` text) and `timestamp`
//! (stored as Unix seconds).

use super::convert::{mismatch, to_i64};
use super::decl::{PlainDecl, TimestampDecl};
use super::{Context, FieldType, ScanType, SqlValue};
use crate::error::{Result, SchemaqlError};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

pub const NOW_TOKEN: &str = "#now";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default)]
pub struct DateField;

impl DateField {
    pub fn init(_decl: &PlainDecl) -> Result<Self> {
        Ok(Self)
    }

    fn parse(value: &Value) -> Result<NaiveDate> {
        match value {
            Value::String(s) if s.starts_with(NOW_TOKEN) => Ok(Utc::now().date_naive()),
            Value::String(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                .or_else(|_| DateTime::parse_from_rfc3339(s.trim()).map(|dt| dt.date_naive()))
                .map_err(|e| {
                    SchemaqlError::conversion("date", format!("could not parse '{s}': {e}"))
                }),
            Value::Number(_) => {
                let secs = to_i64(value, "date")?;
                DateTime::from_timestamp(secs, 0)
                    .map(|dt| dt.date_naive())
                    .ok_or_else(|| {
                        SchemaqlError::conversion("date", format!("{secs} is out of range"))
                    })
            }
            other => Err(SchemaqlError::conversion(
                "date",
                format!("cannot convert {other}"),
            )),
        }
    }
}

impl FieldType for DateField {
    fn type_name(&self) -> &'static str {
        "date"
    }

    fn to_storage(&self, value: &Value, _context: &dyn Context) -> Result<SqlValue> {
        if value.is_null() {
            return Ok(SqlValue::Null);
        }
        let date = Self::parse(value)?;
        Ok(SqlValue::Text(date.format(DATE_FORMAT).to_string()))
    }

    fn from_storage(&self, stored: SqlValue) -> Result<Value> {
        match stored {
            SqlValue::Null => Ok(Value::Null),
            SqlValue::Text(s) => Ok(Value::String(s)),
            other => Err(mismatch("string", &other)),
        }
    }

    fn scan_receiver(&self) -> ScanType {
        ScanType::Text
    }

    fn ddl_fragment(&self) -> String {
        "DATE NULL".to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimestampField {
    pub on_create: bool,
    pub on_update: bool,
}

impl TimestampField {
    pub fn init(decl: &TimestampDecl) -> Result<Self> {
        Ok(Self {
            on_create: decl.on_create,
            on_update: decl.on_update,
        })
    }

    /// The `auto_timestamp` declaration: set once on insert.
    pub fn auto() -> Self {
        Self {
            on_create: true,
            on_update: false,
        }
    }
}

impl FieldType for TimestampField {
    fn type_name(&self) -> &'static str {
        "timestamp"
    }

    fn to_storage(&self, value: &Value, _context: &dyn Context) -> Result<SqlValue> {
        match value {
            Value::Null => Ok(SqlValue::Null),
            Value::String(s) if s.starts_with(NOW_TOKEN) => Ok(SqlValue::Int(Utc::now().timestamp())),
            other => to_i64(other, "timestamp").map(SqlValue::Int),
        }
    }

    fn from_storage(&self, stored: SqlValue) -> Result<Value> {
        match stored {
            SqlValue::Null => Ok(Value::Null),
            SqlValue::Int(i) => Ok(Value::from(i)),
            other => Err(mismatch("int64", &other)),
        }
    }

    fn scan_receiver(&self) -> ScanType {
        ScanType::Int
    }

    fn ddl_fragment(&self) -> String {
        let mut def = "TIMESTAMP".to_string();
        if self.on_create {
            def.push_str(" DEFAULT CURRENT_TIMESTAMP");
        }
        if self.on_update {
            def.push_str(" ON UPDATE CURRENT_TIMESTAMP");
        }
        if def == "TIMESTAMP" {
            def.push_str(" NULL");
        }
        def
    }

    fn implicit_default(&self, _context: &dyn Context) -> Result<Option<SqlValue>> {
        if self.on_create {
            Ok(Some(SqlValue::Int(Utc::now().timestamp())))
        } else {
            Ok(None)
        }
    }
}
