//! Statement execution and row conversion.

use super::connection::DatabaseConnection;
use super::pool::Pool;
use crate::config::{DatabaseConfig, SchemaqlConfig};
use crate::error::{Result, SchemaqlError};
use crate::logging::{log_error, log_statement};
use crate::query_builder::{Query, QueryConditions, Statement};
use crate::schema::{Collection, CustomQueryKind, Hook, Model, IDENTITY_FIELDSET, PRIMARY_KEY};
use crate::types::{Context, Field, ScanType, SqlValue};
use indexmap::IndexMap;
use serde_json::Value;
use sqlx::any::{Any, AnyArguments, AnyQueryResult, AnyRow};
use sqlx::{AnyConnection, Row};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One converted result row, keyed by field path.
pub type Record = IndexMap<String, Value>;

type AnyQuery<'q> = sqlx::query::Query<'q, Any, AnyArguments<'q>>;

fn bind_params<'q>(mut query: AnyQuery<'q>, params: &[SqlValue]) -> AnyQuery<'q> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.clone()),
        };
    }
    query
}

/// Scan one column by name into the slot its field describes. `None` when
/// the column is NULL.
///
/// Float slots also take integer columns: `SUM` over integers stays an
/// integer on most engines.
fn scan_column(row: &AnyRow, column: &str, scan: ScanType) -> std::result::Result<Option<SqlValue>, sqlx::Error> {
    Ok(match scan {
        ScanType::Int => row.try_get::<Option<i64>, _>(column)?.map(SqlValue::Int),
        ScanType::Float => match row.try_get::<Option<f64>, _>(column) {
            Ok(value) => value.map(SqlValue::Float),
            Err(float_err) => row
                .try_get::<Option<i64>, _>(column)
                .map_err(|_| float_err)?
                .map(|i| SqlValue::Float(i as f64)),
        },
        ScanType::Text => row.try_get::<Option<String>, _>(column)?.map(SqlValue::Text),
    })
}

fn convert_column(row: &AnyRow, column: &str, path: &str, field: &Field) -> Result<Option<Value>> {
    let scan = field.scan_receiver();
    let stored = scan_column(row, column, scan)
        .map_err(|e| SchemaqlError::conversion(scan.as_str(), e.to_string()).at_path(path))?;
    stored
        .map(|v| field.from_storage(v).map_err(|e| e.at_path(path)))
        .transpose()
}

/// Convert a result row of a compiled select. NULL columns are omitted.
pub fn convert_row(query: &Query<'_>, row: &AnyRow) -> Result<Record> {
    let mut record = IndexMap::new();
    for mapped in query.mapped_fields() {
        if let Some(value) = convert_column(row, &mapped.alias, &mapped.path, &mapped.field)? {
            record.insert(mapped.path.clone(), value);
        }
    }
    Ok(record)
}

/// Rows touched by an update, and the model hooks its changeset triggers.
/// Acting on the hooks is left to the caller.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub rows_affected: u64,
    pub triggered_hooks: Vec<Hook>,
}

impl UpdateOutcome {
    fn new(collection: &Collection, changeset: &IndexMap<String, Value>, rows_affected: u64) -> Self {
        Self {
            rows_affected,
            triggered_hooks: collection.triggered_hooks(changeset).cloned().collect(),
        }
    }
}

/// The primary key a driver reported for an insert.
fn generated_id(collection: &str, last_insert_id: Option<i64>) -> Result<u64> {
    let id = last_insert_id.ok_or_else(|| {
        SchemaqlError::conversion("id", format!("insert into '{collection}' reported no generated id"))
            .at_path(PRIMARY_KEY)
    })?;
    u64::try_from(id).map_err(|_| {
        SchemaqlError::conversion("id", format!("generated id {id} is negative")).at_path(PRIMARY_KEY)
    })
}

/// Compiles requests against a shared model and runs them on a pooled
/// connection.
#[derive(Clone)]
pub struct Database {
    model: Arc<Model>,
    pool: Pool<AnyConnection>,
}

impl Database {
    pub fn new(model: Arc<Model>, pool: Pool<AnyConnection>) -> Self {
        Self { model, pool }
    }

    /// Load the configured model file and open the pool.
    pub async fn connect(config: &SchemaqlConfig) -> Result<Self> {
        config.validate()?;
        let model_path = config
            .model_path
            .as_ref()
            .ok_or_else(|| SchemaqlError::configuration("model_path is not set"))?;
        let model = Model::from_file(model_path)?;
        Self::open(Arc::new(model), &config.database).await
    }

    /// Open the pool for an already loaded model. A private in-memory SQLite
    /// URL gets a single connection so every statement sees the same data.
    pub async fn open(model: Arc<Model>, database: &DatabaseConfig) -> Result<Self> {
        let pool_size = database.effective_pool_size();
        if pool_size != database.pool_size {
            warn!(
                requested = database.pool_size,
                pool_size, "In-memory SQLite database, opening a single connection"
            );
        }
        let pool = DatabaseConnection::new(&database.url).pool(pool_size).await?;
        info!(
            collections = model.collections.len(),
            pool_size,
            "Database ready"
        );
        Ok(Self::new(model, pool))
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn pool(&self) -> &Pool<AnyConnection> {
        &self.pool
    }

    async fn fetch(&self, operation: &str, collection: &str, statement: &Statement) -> Result<Vec<AnyRow>> {
        log_statement(operation, Some(collection), &statement.sql, &statement.params);
        let mut conn = self.pool.checkout().await?;
        let query = bind_params(sqlx::query(&statement.sql), &statement.params);
        query.fetch_all(&mut *conn).await.map_err(|source| {
            log_error("executor", operation, &source.to_string(), Some(&statement.sql));
            SchemaqlError::Execution {
                sql: statement.sql.clone(),
                source,
            }
        })
    }

    async fn execute(&self, operation: &str, collection: &str, statement: &Statement) -> Result<AnyQueryResult> {
        log_statement(operation, Some(collection), &statement.sql, &statement.params);
        let mut conn = self.pool.checkout().await?;
        let query = bind_params(sqlx::query(&statement.sql), &statement.params);
        query.execute(&mut *conn).await.map_err(|source| {
            log_error("executor", operation, &source.to_string(), Some(&statement.sql));
            SchemaqlError::Execution {
                sql: statement.sql.clone(),
                source,
            }
        })
    }

    /// Every row matching `conditions`, keyed by field path.
    pub async fn select(&self, conditions: QueryConditions, context: &dyn Context) -> Result<Vec<Record>> {
        let mut query = Query::new(&self.model, conditions, context)?;
        let statement = query.build_select()?;
        let rows = self.fetch("select", query.collection().name(), &statement).await?;
        let records = rows
            .iter()
            .map(|row| convert_row(&query, row))
            .collect::<Result<Vec<_>>>()?;
        debug!(collection = %query.collection().name(), rows = records.len(), "Selected");
        Ok(records)
    }

    /// Exactly one matching row.
    pub async fn select_one(&self, conditions: QueryConditions, context: &dyn Context) -> Result<Record> {
        let mut records = self.select(conditions, context).await?;
        if records.len() != 1 {
            return Err(SchemaqlError::UnexpectedRowCount {
                expected: 1,
                actual: records.len(),
            });
        }
        Ok(records.remove(0))
    }

    /// Insert one row; returns the generated primary key.
    pub async fn insert(
        &self,
        conditions: QueryConditions,
        values: &IndexMap<String, Value>,
        context: &dyn Context,
    ) -> Result<u64> {
        let mut query = Query::new(&self.model, conditions, context)?;
        let statement = query.build_insert(values)?;
        let collection = query.collection().name();
        let result = self.execute("insert", collection, &statement).await?;
        generated_id(collection, result.last_insert_id())
    }

    /// Apply `changeset` to the rows matching `conditions`.
    pub async fn update(
        &self,
        conditions: QueryConditions,
        changeset: &IndexMap<String, Value>,
        context: &dyn Context,
    ) -> Result<UpdateOutcome> {
        let mut query = Query::new(&self.model, conditions, context)?;
        let statement = query.build_update(changeset)?;
        let collection = query.collection();
        let result = self.execute("update", collection.name(), &statement).await?;
        let outcome = UpdateOutcome::new(collection, changeset, result.rows_affected());
        if !outcome.triggered_hooks.is_empty() {
            debug!(
                collection = %collection.name(),
                hooks = outcome.triggered_hooks.len(),
                "Update triggered hooks"
            );
        }
        Ok(outcome)
    }

    pub async fn delete(&self, collection: &str, id: u64, context: &dyn Context) -> Result<u64> {
        let mut query = Query::new(&self.model, QueryConditions::new(collection), context)?;
        let statement = query.build_delete(id)?;
        let result = self.execute("delete", collection, &statement).await?;
        Ok(result.rows_affected())
    }

    /// The row's identity field set, non-id values joined with `", "`.
    pub async fn identity_string(&self, collection: &str, id: u64, context: &dyn Context) -> Result<String> {
        let conditions = QueryConditions::new(collection)
            .fieldset(IDENTITY_FIELDSET)
            .pk(id);
        let record = self.select_one(conditions, context).await?;
        let parts: Vec<String> = record
            .iter()
            .filter(|(path, _)| path.as_str() != PRIMARY_KEY)
            .map(|(_, value)| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        Ok(parts.join(", "))
    }

    /// Run a named custom query. `select` queries return rows keyed by
    /// declared column; `exec` queries return one row with `insertId` and
    /// `rowsAffected`.
    pub async fn custom_query(&self, name: &str, inputs: &[Value], context: &dyn Context) -> Result<Vec<Record>> {
        let custom = self.model.custom_query(name)?;
        let (sql, params) = custom.bind(inputs, context)?;
        let statement = Statement::new(sql, params);

        match custom.kind {
            CustomQueryKind::Exec => {
                let result = self.execute("custom_exec", name, &statement).await?;
                let mut record = IndexMap::new();
                record.insert(
                    "insertId".to_string(),
                    Value::from(result.last_insert_id()),
                );
                record.insert("rowsAffected".to_string(), Value::from(result.rows_affected()));
                Ok(vec![record])
            }
            CustomQueryKind::Select => {
                let rows = self.fetch("custom_select", name, &statement).await?;
                rows.iter()
                    .map(|row| {
                        let mut record = IndexMap::new();
                        for (column, field) in &custom.columns {
                            if let Some(value) = convert_column(row, column, column, field)? {
                                record.insert(column.clone(), value);
                            }
                        }
                        Ok(record)
                    })
                    .collect()
            }
        }
    }
}
