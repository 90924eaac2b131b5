//! One-way salted password storage.
//!
//! Stored form: base64(salt || sha256(salt || plaintext)) with a 256 byte
//! random salt. The reverse conversion never yields the stored value.

use super::convert::{mismatch, to_text};
use super::decl::PlainDecl;
use super::{Context, FieldType, ScanType, SqlValue};
use crate::error::Result;
use base64::prelude::*;
use rand::RngCore;
use serde_json::Value;
use sha2::{Digest, Sha256};

pub const SALT_LENGTH: usize = 256;
pub const REDACTED: &str = "********";

fn digest(salt: &[u8], plaintext: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(plaintext.as_bytes());
    hasher.finalize().to_vec()
}

pub fn hash_password(plaintext: &str) -> String {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut stored = salt.to_vec();
    stored.extend(digest(&salt, plaintext));
    BASE64_STANDARD.encode(stored)
}

/// Check a plaintext candidate against a stored hash.
pub fn verify_password(plaintext: &str, stored: &str) -> bool {
    let Ok(decoded) = BASE64_STANDARD.decode(stored.as_bytes()) else {
        return false;
    };
    if decoded.len() <= SALT_LENGTH {
        return false;
    }
    let (salt, expected) = decoded.split_at(SALT_LENGTH);
    digest(salt, plaintext) == expected
}

#[derive(Debug, Clone, Default)]
pub struct PasswordField;

impl PasswordField {
    pub fn init(_decl: &PlainDecl) -> Result<Self> {
        Ok(Self)
    }
}

impl FieldType for PasswordField {
    fn type_name(&self) -> &'static str {
        "password"
    }

    fn to_storage(&self, value: &Value, _context: &dyn Context) -> Result<SqlValue> {
        if value.is_null() {
            return Ok(SqlValue::Null);
        }
        let plaintext = to_text(value, "password")?;
        Ok(SqlValue::Text(hash_password(&plaintext)))
    }

    fn from_storage(&self, stored: SqlValue) -> Result<Value> {
        match stored {
            SqlValue::Null => Ok(Value::Null),
            SqlValue::Text(_) => Ok(Value::String(REDACTED.to_string())),
            other => Err(mismatch("string", &other)),
        }
    }

    fn scan_receiver(&self) -> ScanType {
        ScanType::Text
    }

    fn ddl_fragment(&self) -> String {
        "VARCHAR(400) NULL".to_string()
    }
}
