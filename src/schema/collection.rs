use super::fieldset::FieldSetEntry;
use super::hooks::Hook;
use crate::error::{Result, SchemaqlError};
use crate::types::Field;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

pub const DEFAULT_FIELDSET: &str = "default";
pub const IDENTITY_FIELDSET: &str = "identity";
pub const PRIMARY_KEY: &str = "id";

/// A named record type backed by one table.
#[derive(Debug, Clone)]
pub struct Collection {
    pub table_name: String,
    pub fields: IndexMap<String, Field>,
    pub field_sets: IndexMap<String, Vec<FieldSetEntry>>,
    pub hooks: Vec<Hook>,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.table_name
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Resolve a field set by name, `default` when none is given.
    pub fn field_set(&self, name: Option<&str>) -> Result<&[FieldSetEntry]> {
        let name = name.unwrap_or(DEFAULT_FIELDSET);
        let entries = self
            .field_sets
            .get(name)
            .ok_or_else(|| SchemaqlError::UnknownFieldSet {
                collection: self.table_name.clone(),
                fieldset: name.to_string(),
            })?;
        debug!(collection = %self.table_name, fieldset = %name, "Using fieldset");
        Ok(entries)
    }

    /// Hooks triggered by writing `changeset` to this collection.
    pub fn triggered_hooks<'a>(&'a self, changeset: &'a IndexMap<String, Value>) -> impl Iterator<Item = &'a Hook> + 'a {
        self.hooks.iter().filter(move |h| h.matches(changeset))
    }
}
