use super::conditions::QueryConditions;
use super::joins::Join;
use super::walker;
use crate::error::{Result, SchemaqlError};
use crate::schema::{Collection, FieldSetEntry, Model};
use crate::types::{Context, Field};
use indexmap::IndexMap;
use tracing::debug;

/// Alias of the root table in every generated statement.
pub const ROOT_ALIAS: &str = "t0";

/// How a mapped field reaches the select list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// `alias.column AS f<n>`
    Column,
    /// `<expression> AS f<n>`, from a raw entry.
    Expression(String),
    /// Rendered into the extra select list and grouped; only usable in HAVING.
    Aggregate,
}

/// A table included in one query, keyed by its join path (`""` for the root).
#[derive(Debug, Clone)]
pub struct MappedTable<'a> {
    pub path: String,
    pub alias: String,
    pub collection: &'a Collection,
}

/// A projected field, keyed by its full path.
#[derive(Debug, Clone)]
pub struct MappedField {
    pub path: String,
    pub alias: String,
    pub table_alias: String,
    pub column: String,
    pub field: Field,
    pub projection: Projection,
}

impl MappedField {
    /// The SQL expression the field is compared against in conditions.
    /// Computed fields are compared by their projected alias.
    pub fn condition_expression(&self) -> String {
        match &self.projection {
            Projection::Column => format!("{}.{}", self.table_alias, self.column),
            Projection::Expression(_) | Projection::Aggregate => self.alias.clone(),
        }
    }

    /// Raw expressions may aggregate, so they are treated like aggregates
    /// and only filtered in HAVING.
    pub fn is_computed(&self) -> bool {
        self.projection != Projection::Column
    }

    pub fn is_root_column(&self) -> bool {
        self.table_alias == ROOT_ALIAS && self.projection == Projection::Column
    }
}

/// One compiled request against one collection.
///
/// A query is built by a single caller and driven through at most one build;
/// alias counters and maps are not shared.
pub struct Query<'a> {
    model: &'a Model,
    collection: &'a Collection,
    entries: &'a [FieldSetEntry],
    pub(crate) conditions: QueryConditions,
    pub(crate) context: &'a dyn Context,
    table_counter: usize,
    field_counter: usize,
    tables: IndexMap<String, MappedTable<'a>>,
    fields: IndexMap<String, MappedField>,
    pub(crate) joins: Vec<Join>,
    pub(crate) extra_selects: Vec<String>,
    walked: bool,
}

impl<'a> Query<'a> {
    pub fn new(model: &'a Model, conditions: QueryConditions, context: &'a dyn Context) -> Result<Self> {
        let collection = model.collection(&conditions.collection)?;
        let entries = collection.field_set(conditions.fieldset.as_deref())?;
        Ok(Self {
            model,
            collection,
            entries,
            conditions,
            context,
            table_counter: 0,
            field_counter: 0,
            tables: IndexMap::new(),
            fields: IndexMap::new(),
            joins: Vec::new(),
            extra_selects: Vec::new(),
            walked: false,
        })
    }

    pub fn collection(&self) -> &'a Collection {
        self.collection
    }

    pub fn conditions(&self) -> &QueryConditions {
        &self.conditions
    }

    /// Walk every entry of the selected field set once, allocating tables,
    /// joins and projected fields.
    pub fn walk(&mut self) -> Result<()> {
        if self.walked {
            return Ok(());
        }
        let (root, _) = self.include_collection("", self.collection.name())?;
        let entries = self.entries;
        for entry in entries {
            walker::walk_entry(self, entry, &root)?;
        }
        self.walked = true;
        debug!(
            collection = %self.collection.name(),
            tables = self.tables.len(),
            fields = self.fields.len(),
            "Walked fieldset"
        );
        Ok(())
    }

    /// Include a collection under a join path. Idempotent by path: the
    /// returned flag is `true` only when the table is new.
    pub fn include_collection(&mut self, path: &str, collection_name: &str) -> Result<(MappedTable<'a>, bool)> {
        if let Some(existing) = self.tables.get(path) {
            return Ok((existing.clone(), false));
        }
        let collection = self.model.collection(collection_name)?;
        let table = MappedTable {
            path: path.to_string(),
            alias: format!("t{}", self.table_counter),
            collection,
        };
        self.table_counter += 1;
        self.tables.insert(path.to_string(), table.clone());
        Ok((table, true))
    }

    /// Follow the reference field `field_name` of `base`, left-joining its
    /// target the first time the join path is seen.
    pub fn left_join(&mut self, base: &MappedTable<'a>, field_name: &str) -> Result<MappedTable<'a>> {
        let field = base
            .collection
            .field(field_name)
            .ok_or_else(|| SchemaqlError::UnknownField {
                collection: base.collection.name().to_string(),
                field: field_name.to_string(),
            })?;
        let target = field
            .reference_target()
            .ok_or_else(|| SchemaqlError::NotARelation {
                collection: base.collection.name().to_string(),
                field: field_name.to_string(),
            })?
            .to_string();
        let path = if base.path.is_empty() {
            field_name.to_string()
        } else {
            format!("{}.{}", base.path, field_name)
        };
        let (table, created) = self.include_collection(&path, &target)?;
        if created {
            self.joins.push(Join::reference(
                table.collection.name(),
                &table.alias,
                &base.alias,
                field_name,
            ));
        }
        Ok(table)
    }

    /// Register a projected field under `path`. Idempotent by path.
    pub fn include_field(
        &mut self,
        path: &str,
        field: Field,
        table: &MappedTable<'a>,
        projection: Projection,
    ) -> &MappedField {
        if !self.fields.contains_key(path) {
            let column = path.rsplit('.').next().unwrap_or(path).to_string();
            let mapped = MappedField {
                path: path.to_string(),
                alias: format!("f{}", self.field_counter),
                table_alias: table.alias.clone(),
                column,
                field,
                projection,
            };
            self.field_counter += 1;
            self.fields.insert(path.to_string(), mapped);
        }
        &self.fields[path]
    }

    pub fn mapped_table(&self, path: &str) -> Option<&MappedTable<'a>> {
        self.tables.get(path)
    }

    pub fn mapped_field(&self, path: &str) -> Option<&MappedField> {
        self.fields.get(path)
    }

    pub fn mapped_fields(&self) -> impl Iterator<Item = &MappedField> {
        self.fields.values()
    }

    pub fn tables(&self) -> impl Iterator<Item = &MappedTable<'a>> {
        self.tables.values()
    }

    /// Paths of every projected field, in field-set order.
    pub fn column_paths(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    /// Plain columns eligible for free-text search.
    pub fn searchable_fields(&self) -> Vec<&MappedField> {
        self.fields
            .values()
            .filter(|f| f.projection == Projection::Column && f.field.is_searchable())
            .collect()
    }
}
