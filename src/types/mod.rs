//! # Field Type Registry
//!
//! A fixed catalog of field kinds behind one conversion contract.
//!
//! ## Overview
//!
//! Every variant converts application values (`serde_json::Value`) to bound
//! parameters ([`SqlValue`]) and back, describes the nullable slot its column
//! is scanned into ([`ScanType`]), reports whether free-text search applies and
//! supplies the column DDL fragment consumed by schema synchronisation.
//!
//! | type         | storage | searchable |
//! |--------------|---------|------------|
//! | `string`     | text    | yes        |
//! | `text`       | text    | yes        |
//! | `file`       | text    | yes        |
//! | `id`         | int     | no         |
//! | `reference`  | int     | no         |
//! | `integer`    | int     | no         |
//! | `float`      | float   | no         |
//! | `boolean`    | int     | no         |
//! | `date`       | text    | no         |
//! | `timestamp`  | int     | no         |
//! | `password`   | text    | no         |
//!
//! The `password` variant hashes on the way in and redacts on the way out, so
//! it never round-trips.

pub mod context;
pub(crate) mod convert;
pub mod decl;
pub mod numeric;
pub mod password;
pub mod temporal;
pub mod text;
pub mod value;

pub use context::{resolve_indirection, Context, MapContext};
pub use decl::FieldDecl;
pub use value::{ScanType, SqlValue};

use crate::error::Result;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// The conversion contract every field variant implements.
pub trait FieldType: fmt::Debug + Send + Sync {
    fn type_name(&self) -> &'static str;

    /// Application value to bound parameter.
    fn to_storage(&self, value: &Value, context: &dyn Context) -> Result<SqlValue>;

    /// Scanned column to application value. `Null` maps to `Value::Null`.
    fn from_storage(&self, stored: SqlValue) -> Result<Value>;

    fn scan_receiver(&self) -> ScanType;

    fn is_searchable(&self) -> bool {
        false
    }

    fn ddl_fragment(&self) -> String;

    /// Target collection of a reference field.
    fn reference_target(&self) -> Option<&str> {
        None
    }

    /// A default the variant supplies on insert without an explicit
    /// declaration (timestamps with `onCreate`).
    fn implicit_default(&self, _context: &dyn Context) -> Result<Option<SqlValue>> {
        Ok(None)
    }
}

/// A declared field: a shared variant implementation plus the declaration
/// keys common to every variant.
#[derive(Debug, Clone)]
pub struct Field {
    kind: Arc<dyn FieldType>,
    label: Option<String>,
    default: Option<Value>,
}

impl Field {
    /// Validate a declaration and build the matching variant.
    pub fn from_decl(decl: &FieldDecl) -> Result<Self> {
        let kind: Arc<dyn FieldType> = match decl {
            FieldDecl::String(d) => Arc::new(text::StringField::init(d)?),
            FieldDecl::Text(d) => Arc::new(text::TextField::init(d)?),
            FieldDecl::File(d) => Arc::new(text::FileField::init(d)?),
            FieldDecl::Id(d) => Arc::new(numeric::IdField::init(d)?),
            FieldDecl::Reference(d) => Arc::new(numeric::ReferenceField::init(d)?),
            FieldDecl::Integer(d) => Arc::new(numeric::IntegerField::init(d)?),
            FieldDecl::Float(d) => Arc::new(numeric::FloatField::init(d)?),
            FieldDecl::Boolean(d) => Arc::new(numeric::BooleanField::init(d)?),
            FieldDecl::Date(d) => Arc::new(temporal::DateField::init(d)?),
            FieldDecl::Timestamp(d) => Arc::new(temporal::TimestampField::init(d)?),
            FieldDecl::AutoTimestamp(_) => Arc::new(temporal::TimestampField::auto()),
            FieldDecl::Password(d) => Arc::new(password::PasswordField::init(d)?),
        };
        Ok(Self {
            kind,
            label: decl.label().map(str::to_string),
            default: decl.default_value().cloned(),
        })
    }

    /// Wrap a variant implementation directly.
    pub fn from_kind(kind: Arc<dyn FieldType>) -> Self {
        Self {
            kind,
            label: None,
            default: None,
        }
    }

    pub fn id() -> Self {
        Self::from_kind(Arc::new(numeric::IdField))
    }

    pub fn integer() -> Self {
        Self::from_kind(Arc::new(numeric::IntegerField))
    }

    pub fn float() -> Self {
        Self::from_kind(Arc::new(numeric::FloatField))
    }

    pub fn kind(&self) -> &dyn FieldType {
        self.kind.as_ref()
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn to_storage(&self, value: &Value, context: &dyn Context) -> Result<SqlValue> {
        self.kind.to_storage(value, context)
    }

    pub fn from_storage(&self, stored: SqlValue) -> Result<Value> {
        self.kind.from_storage(stored)
    }

    pub fn scan_receiver(&self) -> ScanType {
        self.kind.scan_receiver()
    }

    pub fn is_searchable(&self) -> bool {
        self.kind.is_searchable()
    }

    pub fn ddl_fragment(&self) -> String {
        self.kind.ddl_fragment()
    }

    pub fn reference_target(&self) -> Option<&str> {
        self.kind.reference_target()
    }

    /// The value to insert when the field is absent from an insert map, if
    /// any rule applies. An explicit `default` wins over the variant's own.
    pub fn default_value(&self, context: &dyn Context) -> Result<Option<SqlValue>> {
        match &self.default {
            Some(declared) => {
                let resolved = resolve_indirection(declared, context);
                self.kind.to_storage(&resolved, context).map(Some)
            }
            None => self.kind.implicit_default(context),
        }
    }
}
