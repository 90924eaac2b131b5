//! Strongly-typed field declarations, validated once at load.
//!
//! The `type` key selects the variant; each variant rejects keys it doesn't
//! know. Historical aliases (`ref`, `int`, `bool`, ...) are accepted.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldDecl {
    #[serde(alias = "enum", alias = "array")]
    String(StringDecl),
    #[serde(alias = "address")]
    Text(PlainDecl),
    Id(PlainDecl),
    #[serde(alias = "ref")]
    Reference(ReferenceDecl),
    #[serde(alias = "int")]
    Integer(PlainDecl),
    Float(PlainDecl),
    #[serde(alias = "bool")]
    Boolean(PlainDecl),
    Date(PlainDecl),
    #[serde(alias = "datetime")]
    Timestamp(TimestampDecl),
    AutoTimestamp(PlainDecl),
    Password(PlainDecl),
    File(PlainDecl),
}

impl FieldDecl {
    /// Insert default. A `#name` string resolves through the request context.
    pub fn default_value(&self) -> Option<&Value> {
        match self {
            FieldDecl::String(d) => d.default.as_ref(),
            FieldDecl::Reference(d) => d.default.as_ref(),
            FieldDecl::Timestamp(d) => d.default.as_ref(),
            FieldDecl::Text(d)
            | FieldDecl::Id(d)
            | FieldDecl::Integer(d)
            | FieldDecl::Float(d)
            | FieldDecl::Boolean(d)
            | FieldDecl::Date(d)
            | FieldDecl::AutoTimestamp(d)
            | FieldDecl::Password(d)
            | FieldDecl::File(d) => d.default.as_ref(),
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            FieldDecl::String(d) => d.label.as_deref(),
            FieldDecl::Reference(d) => d.label.as_deref(),
            FieldDecl::Timestamp(d) => d.label.as_deref(),
            FieldDecl::Text(d)
            | FieldDecl::Id(d)
            | FieldDecl::Integer(d)
            | FieldDecl::Float(d)
            | FieldDecl::Boolean(d)
            | FieldDecl::Date(d)
            | FieldDecl::AutoTimestamp(d)
            | FieldDecl::Password(d)
            | FieldDecl::File(d) => d.label.as_deref(),
        }
    }

    /// Declaration for a parameterless variant, by type name.
    pub fn of(type_name: &str) -> Option<Self> {
        serde_json::from_value(serde_json::json!({ "type": type_name })).ok()
    }

    pub fn reference(collection: &str) -> Self {
        FieldDecl::Reference(ReferenceDecl {
            label: None,
            default: None,
            collection: collection.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlainDecl {
    pub label: Option<String>,
    pub default: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StringDecl {
    pub label: Option<String>,
    pub default: Option<Value>,
    pub length: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceDecl {
    pub label: Option<String>,
    pub default: Option<Value>,
    pub collection: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct TimestampDecl {
    pub label: Option<String>,
    pub default: Option<Value>,
    #[serde(default)]
    pub on_create: bool,
    #[serde(default)]
    pub on_update: bool,
}
