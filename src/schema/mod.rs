//! # Schema Model
//!
//! Parses a declarative model into collections, typed fields, named field
//! sets, custom queries and lifecycle hooks.
//!
//! ## Declaration shape
//!
//! ```json
//! {
//!   "collections": {
//!     "user": {
//!       "fields": {"name": {"type": "string"}, "age": {"type": "int"}},
//!       "fieldsets": {"summary": ["name"]}
//!     }
//!   },
//!   "customQueries": {
//!     "adults": {
//!       "query": "SELECT name FROM user WHERE age >= ?",
//!       "parameters": [{"type": "int"}],
//!       "columns": {"name": {"type": "string"}}
//!     }
//!   },
//!   "hooks": []
//! }
//! ```
//!
//! ## Guarantees after load
//!
//! - Every collection has an `id` field (implicit if undeclared).
//! - Every collection has a `default` field set (all declared fields when
//!   none is given) and an `identity` field set (falls back to `name`).
//! - Every field set ends with an `id` entry.
//!
//! Loading is all-or-nothing: any invalid declaration fails the whole model.

pub mod collection;
pub mod custom_query;
pub mod fieldset;
pub mod hooks;

pub use collection::{Collection, DEFAULT_FIELDSET, IDENTITY_FIELDSET, PRIMARY_KEY};
pub use custom_query::{CustomQuery, CustomQueryKind};
pub use fieldset::{
    AggregateEntry, AggregateFunction, DirectEntry, FieldSetEntry, RawEntry, TimeDurationEntry,
};
pub use hooks::{Hook, HookEmail, HookWhen};

use crate::error::{Result, SchemaqlError};
use crate::types::{Field, FieldDecl};
use custom_query::CustomQueryDecl;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ModelDecl {
    #[serde(default)]
    collections: IndexMap<String, CollectionDecl>,
    #[serde(default)]
    custom_queries: IndexMap<String, CustomQueryDecl>,
    #[serde(default)]
    hooks: Vec<Hook>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CollectionDecl {
    #[serde(default)]
    fields: IndexMap<String, Value>,
    #[serde(default)]
    fieldsets: IndexMap<String, Vec<Value>>,
}

/// The loaded model. Immutable after load and safe to share.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub collections: IndexMap<String, Collection>,
    pub custom_queries: IndexMap<String, CustomQuery>,
}

impl Model {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            SchemaqlError::configuration(format!("opening model {}: {e}", path.display()))
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let decl: ModelDecl = serde_json::from_reader(reader)
            .map_err(|e| SchemaqlError::schema("model", e.to_string()))?;
        Self::from_decl(decl)
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        let decl: ModelDecl =
            serde_json::from_str(source).map_err(|e| SchemaqlError::schema("model", e.to_string()))?;
        Self::from_decl(decl)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let decl: ModelDecl =
            serde_json::from_value(value).map_err(|e| SchemaqlError::schema("model", e.to_string()))?;
        Self::from_decl(decl)
    }

    fn from_decl(decl: ModelDecl) -> Result<Self> {
        info!("Begin model init");

        let mut custom_queries = IndexMap::new();
        for (name, raw) in decl.custom_queries {
            debug!(custom_query = %name, "Read custom query");
            let query = CustomQuery::from_decl(&name, raw)?;
            custom_queries.insert(name, query);
        }

        let mut collections = IndexMap::new();
        for (name, raw) in decl.collections {
            debug!(collection = %name, "Read collection");
            let collection = load_collection(&name, raw)?;
            collections.insert(name, collection);
        }

        for (name, collection) in &collections {
            for (field_name, field) in &collection.fields {
                if let Some(target) = field.reference_target() {
                    if !collections.contains_key(target) {
                        return Err(SchemaqlError::schema(
                            format!("{name}.{field_name}"),
                            format!("reference to unknown collection '{target}'"),
                        ));
                    }
                }
            }
        }

        for hook in decl.hooks {
            let collection = collections.get_mut(&hook.collection).ok_or_else(|| {
                SchemaqlError::schema(
                    "hooks",
                    format!("Hook on non existing collection {}", hook.collection),
                )
            })?;
            collection.hooks.push(hook);
        }

        info!(
            collections = collections.len(),
            custom_queries = custom_queries.len(),
            "End model init"
        );
        Ok(Self {
            collections,
            custom_queries,
        })
    }

    pub fn collection(&self, name: &str) -> Result<&Collection> {
        self.collections
            .get(name)
            .ok_or_else(|| SchemaqlError::UnknownCollection {
                collection: name.to_string(),
            })
    }

    pub fn custom_query(&self, name: &str) -> Result<&CustomQuery> {
        self.custom_queries
            .get(name)
            .ok_or_else(|| SchemaqlError::UnknownCustomQuery {
                name: name.to_string(),
            })
    }
}

fn load_collection(name: &str, raw: CollectionDecl) -> Result<Collection> {
    let mut fields = IndexMap::new();
    for (field_name, raw_field) in &raw.fields {
        let decl: FieldDecl = serde_json::from_value(raw_field.clone()).map_err(|e| {
            SchemaqlError::schema(format!("{name}.{field_name}"), e.to_string())
        })?;
        let field = Field::from_decl(&decl)
            .map_err(|e| SchemaqlError::schema(format!("{name}.{field_name}"), e.to_string()))?;
        fields.insert(field_name.clone(), field);
    }
    if !fields.contains_key(PRIMARY_KEY) {
        fields.insert(PRIMARY_KEY.to_string(), Field::id());
    }

    let mut raw_sets = raw.fieldsets;
    if !raw_sets.contains_key(DEFAULT_FIELDSET) {
        let all_fields = raw
            .fields
            .keys()
            .filter(|f| f.as_str() != PRIMARY_KEY)
            .map(|f| Value::String(f.clone()))
            .collect();
        raw_sets.insert(DEFAULT_FIELDSET.to_string(), all_fields);
    }
    if !raw_sets.contains_key(IDENTITY_FIELDSET) {
        if !fields.contains_key("name") {
            return Err(SchemaqlError::schema(
                name,
                format!(
                    "No identity fieldset, and collection ({name}) doesn't have a 'name' field to fall back upon."
                ),
            ));
        }
        raw_sets.insert(
            IDENTITY_FIELDSET.to_string(),
            vec![Value::String("name".to_string())],
        );
    }

    let mut field_sets = IndexMap::new();
    for (set_name, raw_entries) in raw_sets {
        debug!(collection = %name, fieldset = %set_name, "Evaluate fieldset");
        let mut entries = raw_entries
            .iter()
            .map(FieldSetEntry::parse)
            .collect::<Result<Vec<_>>>()
            .map_err(|e| SchemaqlError::schema(format!("{name}.fieldsets.{set_name}"), e.to_string()))?;
        if !entries.iter().any(|e| e.path() == PRIMARY_KEY) {
            entries.push(FieldSetEntry::direct(PRIMARY_KEY));
        }
        field_sets.insert(set_name, entries);
    }

    Ok(Collection {
        table_name: name.to_string(),
        fields,
        field_sets,
        hooks: Vec::new(),
    })
}
