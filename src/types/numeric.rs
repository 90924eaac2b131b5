//! Numeric variants: `id`, `reference`, `integer`, `float` and `boolean`.

use super::convert::{float_value, mismatch, to_bool, to_f64, to_i64, to_u64};
use super::decl::{PlainDecl, ReferenceDecl};
use super::{Context, FieldType, ScanType, SqlValue};
use crate::error::{Result, SchemaqlError};
use serde_json::Value;

fn unsigned_to_storage(value: &Value, expected: &str) -> Result<SqlValue> {
    if value.is_null() {
        return Ok(SqlValue::Null);
    }
    let unsigned = to_u64(value, expected)?;
    i64::try_from(unsigned)
        .map(SqlValue::Int)
        .map_err(|_| SchemaqlError::conversion(expected, format!("{unsigned} is out of range")))
}

fn unsigned_from_storage(stored: SqlValue, expected: &str) -> Result<Value> {
    match stored {
        SqlValue::Null => Ok(Value::Null),
        SqlValue::Int(i) => u64::try_from(i)
            .map(Value::from)
            .map_err(|_| SchemaqlError::conversion(expected, format!("negative value {i} in db"))),
        other => Err(mismatch(expected, &other)),
    }
}

/// Primary key column.
#[derive(Debug, Clone, Default)]
pub struct IdField;

impl IdField {
    pub fn init(_decl: &PlainDecl) -> Result<Self> {
        Ok(Self)
    }
}

impl FieldType for IdField {
    fn type_name(&self) -> &'static str {
        "id"
    }

    fn to_storage(&self, value: &Value, _context: &dyn Context) -> Result<SqlValue> {
        unsigned_to_storage(value, "unsigned integer")
    }

    fn from_storage(&self, stored: SqlValue) -> Result<Value> {
        unsigned_from_storage(stored, "uint64")
    }

    fn scan_receiver(&self) -> ScanType {
        ScanType::Int
    }

    fn ddl_fragment(&self) -> String {
        "INT(11) UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY".to_string()
    }
}

/// Foreign key pointing at the primary key of `collection`.
#[derive(Debug, Clone)]
pub struct ReferenceField {
    pub collection: String,
}

impl ReferenceField {
    pub fn init(decl: &ReferenceDecl) -> Result<Self> {
        if decl.collection.trim().is_empty() {
            return Err(SchemaqlError::schema("reference", "Field has no collection"));
        }
        Ok(Self {
            collection: decl.collection.clone(),
        })
    }
}

impl FieldType for ReferenceField {
    fn type_name(&self) -> &'static str {
        "reference"
    }

    fn to_storage(&self, value: &Value, _context: &dyn Context) -> Result<SqlValue> {
        unsigned_to_storage(value, "unsigned integer")
    }

    fn from_storage(&self, stored: SqlValue) -> Result<Value> {
        unsigned_from_storage(stored, "uint64")
    }

    fn scan_receiver(&self) -> ScanType {
        ScanType::Int
    }

    fn ddl_fragment(&self) -> String {
        "INT(11) UNSIGNED NULL".to_string()
    }

    fn reference_target(&self) -> Option<&str> {
        Some(&self.collection)
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntegerField;

impl IntegerField {
    pub fn init(_decl: &PlainDecl) -> Result<Self> {
        Ok(Self)
    }
}

impl FieldType for IntegerField {
    fn type_name(&self) -> &'static str {
        "integer"
    }

    fn to_storage(&self, value: &Value, _context: &dyn Context) -> Result<SqlValue> {
        if value.is_null() {
            return Ok(SqlValue::Null);
        }
        to_i64(value, "integer").map(SqlValue::Int)
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
        "INT(11) NULL".to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FloatField;

impl FloatField {
    pub fn init(_decl: &PlainDecl) -> Result<Self> {
        Ok(Self)
    }
}

impl FieldType for FloatField {
    fn type_name(&self) -> &'static str {
        "float"
    }

    fn to_storage(&self, value: &Value, _context: &dyn Context) -> Result<SqlValue> {
        if value.is_null() {
            return Ok(SqlValue::Null);
        }
        to_f64(value, "float").map(SqlValue::Float)
    }

    fn from_storage(&self, stored: SqlValue) -> Result<Value> {
        match stored {
            SqlValue::Null => Ok(Value::Null),
            SqlValue::Float(f) => float_value(f),
            other => Err(mismatch("float64", &other)),
        }
    }

    fn scan_receiver(&self) -> ScanType {
        ScanType::Float
    }

    fn ddl_fragment(&self) -> String {
        "FLOAT NULL".to_string()
    }
}

/// Stored as a 0/1 integer.
#[derive(Debug, Clone, Default)]
pub struct BooleanField;

impl BooleanField {
    pub fn init(_decl: &PlainDecl) -> Result<Self> {
        Ok(Self)
    }
}

impl FieldType for BooleanField {
    fn type_name(&self) -> &'static str {
        "boolean"
    }

    fn to_storage(&self, value: &Value, _context: &dyn Context) -> Result<SqlValue> {
        if value.is_null() {
            return Ok(SqlValue::Null);
        }
        to_bool(value, "boolean").map(|b| SqlValue::Int(i64::from(b)))
    }

    fn from_storage(&self, stored: SqlValue) -> Result<Value> {
        match stored {
            SqlValue::Null => Ok(Value::Null),
            SqlValue::Int(i) => Ok(Value::Bool(i != 0)),
            other => Err(mismatch("int64", &other)),
        }
    }

    fn scan_receiver(&self) -> ScanType {
        ScanType::Int
    }

    fn ddl_fragment(&self) -> String {
        "TINYINT(1) NOT NULL DEFAULT 0".to_string()
    }
}
