//! Free-text variants: `string`, `text` and `file`. These are the only
//! searchable kinds.

use super::convert::{mismatch, to_text};
use super::decl::{PlainDecl, StringDecl};
use super::{Context, FieldType, ScanType, SqlValue};
use crate::error::{Result, SchemaqlError};
use serde_json::Value;

const DEFAULT_STRING_LENGTH: u32 = 255;

fn text_to_storage(value: &Value, expected: &str) -> Result<SqlValue> {
    if value.is_null() {
        return Ok(SqlValue::Null);
    }
    to_text(value, expected).map(SqlValue::Text)
}

fn text_from_storage(stored: SqlValue, expected: &str) -> Result<Value> {
    match stored {
        SqlValue::Null => Ok(Value::Null),
        SqlValue::Text(s) => Ok(Value::String(s)),
        other => Err(mismatch(expected, &other)),
    }
}

#[derive(Debug, Clone)]
pub struct StringField {
    pub length: u32,
}

impl StringField {
    pub fn init(decl: &StringDecl) -> Result<Self> {
        let length = decl.length.unwrap_or(DEFAULT_STRING_LENGTH);
        if length == 0 {
            return Err(SchemaqlError::schema(
                "string",
                "length must be greater than zero",
            ));
        }
        Ok(Self { length })
    }
}

impl FieldType for StringField {
    fn type_name(&self) -> &'static str {
        "string"
    }

    fn to_storage(&self, value: &Value, _context: &dyn Context) -> Result<SqlValue> {
        text_to_storage(value, "string")
    }

    fn from_storage(&self, stored: SqlValue) -> Result<Value> {
        text_from_storage(stored, "string")
    }

    fn scan_receiver(&self) -> ScanType {
        ScanType::Text
    }

    fn is_searchable(&self) -> bool {
        true
    }

    fn ddl_fragment(&self) -> String {
        format!("VARCHAR({}) NULL", self.length)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextField;

impl TextField {
    pub fn init(_decl: &PlainDecl) -> Result<Self> {
        Ok(Self)
    }
}

impl FieldType for TextField {
    fn type_name(&self) -> &'static str {
        "text"
    }

    fn to_storage(&self, value: &Value, _context: &dyn Context) -> Result<SqlValue> {
        text_to_storage(value, "text")
    }

    fn from_storage(&self, stored: SqlValue) -> Result<Value> {
        text_from_storage(stored, "text")
    }

    fn scan_receiver(&self) -> ScanType {
        ScanType::Text
    }

    fn is_searchable(&self) -> bool {
        true
    }

    fn ddl_fragment(&self) -> String {
        "TEXT NULL".to_string()
    }
}

/// A stored file reference (path or key into a file store).
#[derive(Debug, Clone, Default)]
pub struct FileField;

impl FileField {
    pub fn init(_decl: &PlainDecl) -> Result<Self> {
        Ok(Self)
    }
}

impl FieldType for FileField {
    fn type_name(&self) -> &'static str {
        "file"
    }

    fn to_storage(&self, value: &Value, _context: &dyn Context) -> Result<SqlValue> {
        text_to_storage(value, "file")
    }

    fn from_storage(&self, stored: SqlValue) -> Result<Value> {
        text_from_storage(stored, "file")
    }

    fn scan_receiver(&self) -> ScanType {
        ScanType::Text
    }

    fn is_searchable(&self) -> bool {
        true
    }

    fn ddl_fragment(&self) -> String {
        "VARCHAR(255) NULL".to_string()
    }
}
