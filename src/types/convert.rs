//! Coercion of loosely typed application values into storage primitives.
//!
//! Numeric targets accept strings, signed/unsigned integers and floats with a
//! zero fractional part.

use crate::error::{Result, SchemaqlError};
use crate::types::SqlValue;
use serde_json::{Number, Value};

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("bool {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string '{s}'"),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

pub(crate) fn to_i64(value: &Value, expected: &str) -> Result<i64> {
    match value {
        Value::String(s) => s.trim().parse::<i64>().map_err(|e| {
            SchemaqlError::conversion(expected, format!("could not parse string '{s}': {e}"))
        }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if n.as_u64().is_some() {
                Err(SchemaqlError::conversion(expected, format!("{n} is out of range")))
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                    Ok(f as i64)
                } else {
                    Err(SchemaqlError::conversion(
                        expected,
                        format!("float {n} has a fractional part"),
                    ))
                }
            }
        }
        other => Err(SchemaqlError::conversion(
            expected,
            format!("cannot convert {}", describe(other)),
        )),
    }
}

pub(crate) fn to_u64(value: &Value, expected: &str) -> Result<u64> {
    if let Value::Number(n) = value {
        if let Some(u) = n.as_u64() {
            return Ok(u);
        }
    }
    let signed = to_i64(value, expected)?;
    u64::try_from(signed).map_err(|_| {
        SchemaqlError::conversion(expected, format!("negative value {signed} for unsigned field"))
    })
}

pub(crate) fn to_f64(value: &Value, expected: &str) -> Result<f64> {
    match value {
        Value::String(s) => s.trim().parse::<f64>().map_err(|e| {
            SchemaqlError::conversion(expected, format!("could not parse string '{s}': {e}"))
        }),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| SchemaqlError::conversion(expected, format!("{n} is not representable"))),
        other => Err(SchemaqlError::conversion(
            expected,
            format!("cannot convert {}", describe(other)),
        )),
    }
}

pub(crate) fn to_bool(value: &Value, expected: &str) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(_) => match to_i64(value, expected)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(SchemaqlError::conversion(
                expected,
                format!("{other} is not 0 or 1"),
            )),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" | "" => Ok(false),
            _ => Err(SchemaqlError::conversion(
                expected,
                format!("could not parse string '{s}'"),
            )),
        },
        other => Err(SchemaqlError::conversion(
            expected,
            format!("cannot convert {}", describe(other)),
        )),
    }
}

pub(crate) fn to_text(value: &Value, expected: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(SchemaqlError::conversion(
            expected,
            format!("cannot convert {}", describe(other)),
        )),
    }
}

pub(crate) fn float_value(f: f64) -> Result<Value> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| SchemaqlError::conversion("float64", format!("{f} is not finite")))
}

/// Reverse-conversion guard: the scanned value must be of the kind the
/// variant scans into.
pub(crate) fn mismatch(expected: &str, stored: &SqlValue) -> SchemaqlError {
    SchemaqlError::conversion(
        expected,
        format!("incorrect type in db (got {})", stored.kind()),
    )
}
