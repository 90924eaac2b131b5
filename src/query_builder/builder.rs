use super::pagination::{order_by, Pagination};
use super::query::{Projection, Query, ROOT_ALIAS};
use super::search::compile_filters;
use crate::error::{Result, SchemaqlError};
use crate::schema::PRIMARY_KEY;
use crate::types::SqlValue;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

/// SQL text with its positional parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub fn new(sql: String, params: Vec<SqlValue>) -> Self {
        Self { sql, params }
    }
}

impl<'a> Query<'a> {
    fn join_sql(&self) -> String {
        self.joins
            .iter()
            .map(|j| format!(" {}", j.to_sql()))
            .collect()
    }

    /// `SELECT ... FROM table t0 [joins] [WHERE] GROUP BY t0.id [HAVING]
    /// [ORDER BY] [LIMIT] [OFFSET]`
    pub fn build_select(&mut self) -> Result<Statement> {
        self.walk()?;

        let mut selects: Vec<String> = self
            .mapped_fields()
            .filter_map(|f| match &f.projection {
                Projection::Column => Some(format!("{}.{} AS {}", f.table_alias, f.column, f.alias)),
                Projection::Expression(expr) => Some(format!("{expr} AS {}", f.alias)),
                Projection::Aggregate => None,
            })
            .collect();
        selects.extend(self.extra_selects.iter().cloned());

        let filters = compile_filters(self)?;
        let conditions = self.conditions();
        let ordering = order_by(self, &conditions.sort)?;
        let page = Pagination::from_parts(conditions.limit, conditions.offset).to_sql();

        let sql = format!(
            "SELECT {} FROM {} {ROOT_ALIAS}{}{} GROUP BY {ROOT_ALIAS}.{PRIMARY_KEY}{}{}{}",
            selects.join(", "),
            self.collection().name(),
            self.join_sql(),
            filters.where_sql(),
            filters.having_sql(),
            ordering,
            page,
        );
        let mut params = Vec::new();
        for clause in [filters.where_clause, filters.having_clause].into_iter().flatten() {
            params.extend(clause.params);
        }
        debug!(sql = %sql, params = params.len(), "Built select");
        Ok(Statement::new(sql, params))
    }

    /// Update every row matching the request's conditions with `changeset`.
    ///
    /// Without an explicit limit the statement is capped at one row and no
    /// joins are emitted, so every changed field and every condition must
    /// live on the root table. A non-positive limit lifts the cap and emits
    /// the joins instead.
    pub fn build_update(&mut self, changeset: &IndexMap<String, Value>) -> Result<Statement> {
        self.walk()?;
        if changeset.is_empty() {
            return Err(SchemaqlError::invalid_condition("update with an empty changeset"));
        }
        let limit = self.conditions().limit;
        let capped = !matches!(limit, Some(l) if l <= 0);

        let mut assignments = Vec::with_capacity(changeset.len());
        let mut params = Vec::with_capacity(changeset.len());
        for (path, value) in changeset {
            let mapped = self
                .mapped_field(path)
                .ok_or_else(|| SchemaqlError::FieldNotInFieldSet { path: path.clone() })?;
            if mapped.projection != Projection::Column {
                return Err(SchemaqlError::invalid_condition(format!(
                    "computed field '{path}' cannot be updated"
                )));
            }
            if capped && mapped.table_alias != ROOT_ALIAS {
                return Err(SchemaqlError::invalid_condition(format!(
                    "updating joined field '{path}' requires a non-positive limit"
                )));
            }
            params.push(
                mapped
                    .field
                    .to_storage(value, self.context)
                    .map_err(|e| e.at_path(path))?,
            );
            assignments.push(format!("{}.{} = ?", mapped.table_alias, mapped.column));
        }

        let filters = compile_filters(self)?;
        if filters.having_clause.is_some() {
            return Err(SchemaqlError::invalid_condition(
                "conditions on computed fields are not allowed in an update",
            ));
        }
        if capped && filters.where_clause.as_ref().is_some_and(|w| w.joined) {
            return Err(SchemaqlError::invalid_condition(
                "conditions on joined fields require a non-positive update limit",
            ));
        }
        let (joins, tail) = match limit {
            None => (String::new(), " LIMIT 1".to_string()),
            Some(n) if n > 0 => (String::new(), format!(" LIMIT {n}")),
            Some(_) => (self.join_sql(), String::new()),
        };

        let sql = format!(
            "UPDATE {} {ROOT_ALIAS}{joins} SET {}{}{tail}",
            self.collection().name(),
            assignments.join(", "),
            filters.where_sql(),
        );
        if let Some(clause) = filters.where_clause {
            params.extend(clause.params);
        }
        debug!(sql = %sql, params = params.len(), "Built update");
        Ok(Statement::new(sql, params))
    }

    /// Insert one row into the root table. Declared fields absent from
    /// `values` get their default when one applies.
    pub fn build_insert(&mut self, values: &IndexMap<String, Value>) -> Result<Statement> {
        self.walk()?;
        let collection = self.collection();

        let mut columns: Vec<String> = Vec::with_capacity(values.len());
        let mut params = Vec::with_capacity(values.len());
        for (path, value) in values {
            let (column, field) = match self.mapped_field(path) {
                Some(mapped) if mapped.is_root_column() => (mapped.column.clone(), &mapped.field),
                Some(_) => return Err(SchemaqlError::NotRootField { path: path.clone() }),
                None if path.contains('.') => {
                    return Err(SchemaqlError::NotRootField { path: path.clone() })
                }
                None => {
                    let field = collection.field(path).ok_or_else(|| SchemaqlError::UnknownField {
                        collection: collection.name().to_string(),
                        field: path.clone(),
                    })?;
                    (path.clone(), field)
                }
            };
            params.push(field.to_storage(value, self.context).map_err(|e| e.at_path(path))?);
            columns.push(column);
        }

        for (name, field) in &collection.fields {
            if columns.iter().any(|c| c == name) {
                continue;
            }
            match field.default_value(self.context) {
                Ok(Some(default)) => {
                    columns.push(name.clone());
                    params.push(default);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(collection = %collection.name(), field = %name, error = %e, "Skipping default value");
                }
            }
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            collection.name(),
            columns.join(", "),
            vec!["?"; columns.len()].join(", ")
        );
        debug!(sql = %sql, params = params.len(), "Built insert");
        Ok(Statement::new(sql, params))
    }

    /// Delete one row by primary key.
    pub fn build_delete(&mut self, id: u64) -> Result<Statement> {
        self.walk()?;
        let id = i64::try_from(id).map_err(|_| {
            SchemaqlError::conversion("id", format!("{id} is out of range")).at_path(PRIMARY_KEY)
        })?;
        let sql = format!(
            "DELETE FROM {} WHERE {PRIMARY_KEY} = ? LIMIT 1",
            self.collection().name()
        );
        Ok(Statement::new(sql, vec![SqlValue::Int(id)]))
    }
}
