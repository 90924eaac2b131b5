//! Field-set entry definitions.
//!
//! An entry is either a bare dotted path or an object whose `type` key picks
//! a computed-column strategy. Walking lives in `query_builder::walker`.

use crate::error::{Result, SchemaqlError};
use crate::types::{Field, FieldDecl};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone)]
pub enum FieldSetEntry {
    Direct(DirectEntry),
    Raw(RawEntry),
    Aggregate(AggregateEntry),
    TimeDuration(TimeDurationEntry),
}

impl FieldSetEntry {
    /// Parse one declared entry.
    pub fn parse(raw: &Value) -> Result<Self> {
        match raw {
            Value::String(path) => Ok(FieldSetEntry::direct(path)),
            Value::Object(map) => {
                if !map.contains_key("type") {
                    return Err(SchemaqlError::schema(
                        "fieldset",
                        "Fieldset entry was a map without a 'type' key",
                    ));
                }
                let decl: ComputedEntryDecl = serde_json::from_value(raw.clone())
                    .map_err(|e| SchemaqlError::schema("fieldset", e.to_string()))?;
                decl.into_entry()
            }
            other => Err(SchemaqlError::schema(
                "fieldset",
                format!("Fieldset entry {other} couldn't be resolved"),
            )),
        }
    }

    pub fn direct(path: &str) -> Self {
        FieldSetEntry::Direct(DirectEntry {
            path: path.to_string(),
            segments: split_path(path),
        })
    }

    /// The full path the entry's projected column is keyed by.
    pub fn path(&self) -> &str {
        match self {
            FieldSetEntry::Direct(e) => &e.path,
            FieldSetEntry::Raw(e) => &e.path,
            FieldSetEntry::Aggregate(e) => &e.path,
            FieldSetEntry::TimeDuration(e) => &e.path,
        }
    }
}

pub(crate) fn split_path(path: &str) -> Vec<String> {
    path.split('.').map(str::to_string).collect()
}

fn data_type_field(data_type: &str) -> Result<Field> {
    let decl = FieldDecl::of(data_type).ok_or_else(|| {
        SchemaqlError::schema("fieldset", format!("Invalid dataType '{data_type}'"))
    })?;
    Field::from_decl(&decl)
}

fn non_empty_path(path: &str, kind: &str) -> Result<()> {
    if path.is_empty() || path.split('.').any(str::is_empty) {
        return Err(SchemaqlError::schema(
            "fieldset",
            format!("{kind} entry has an invalid path '{path}'"),
        ));
    }
    Ok(())
}

/// A dotted path of field names, every segment but the last a reference.
#[derive(Debug, Clone)]
pub struct DirectEntry {
    pub path: String,
    pub segments: Vec<String>,
}

/// A literal SQL expression with `[a.b.c]` path tokens, and an optional
/// join template with `[collection]` tokens.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub query: String,
    pub data_type: Field,
    pub path: String,
    pub join: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// `FUNC(dep.field)` over a dependent collection that points back at the
/// walked table.
#[derive(Debug, Clone)]
pub struct AggregateEntry {
    pub path: String,
    pub segments: Vec<String>,
    pub function: AggregateFunction,
    pub data_type: Option<Field>,
}

/// `SUM(dep.stop - dep.start)/3600.0` over a dependent collection. The
/// result is a float unless `dataType` says otherwise.
#[derive(Debug, Clone)]
pub struct TimeDurationEntry {
    pub path: String,
    pub segments: Vec<String>,
    pub label: Option<String>,
    pub start: String,
    pub stop: String,
    pub data_type: Option<Field>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ComputedEntryDecl {
    Raw(RawEntryDecl),
    Aggregate(AggregateEntryDecl),
    #[serde(alias = "timeduration")]
    TotalDuration(TimeDurationDecl),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawEntryDecl {
    query: String,
    data_type: String,
    path: String,
    join: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct AggregateEntryDecl {
    path: String,
    function: AggregateFunction,
    data_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct TimeDurationDecl {
    path: String,
    label: Option<String>,
    data_type: Option<String>,
    start: String,
    stop: String,
}

impl ComputedEntryDecl {
    fn into_entry(self) -> Result<FieldSetEntry> {
        match self {
            ComputedEntryDecl::Raw(d) => {
                non_empty_path(&d.path, "raw")?;
                Ok(FieldSetEntry::Raw(RawEntry {
                    data_type: data_type_field(&d.data_type)?,
                    query: d.query,
                    path: d.path,
                    join: d.join,
                }))
            }
            ComputedEntryDecl::Aggregate(d) => {
                non_empty_path(&d.path, "aggregate")?;
                let segments = split_path(&d.path);
                if segments.len() < 2 {
                    return Err(SchemaqlError::schema(
                        "fieldset",
                        format!("aggregate path '{}' needs a collection and a field", d.path),
                    ));
                }
                Ok(FieldSetEntry::Aggregate(AggregateEntry {
                    data_type: d.data_type.as_deref().map(data_type_field).transpose()?,
                    function: d.function,
                    segments,
                    path: d.path,
                }))
            }
            ComputedEntryDecl::TotalDuration(d) => {
                non_empty_path(&d.path, "totalduration")?;
                Ok(FieldSetEntry::TimeDuration(TimeDurationEntry {
                    data_type: d.data_type.as_deref().map(data_type_field).transpose()?,
                    segments: split_path(&d.path),
                    path: d.path,
                    label: d.label,
                    start: d.start,
                    stop: d.stop,
                }))
            }
        }
    }
}
