use super::pagination::Pagination;
use super::query::{Query, ROOT_ALIAS};
use crate::error::{Result, SchemaqlError};
use crate::types::{resolve_indirection, SqlValue};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Comparison operators accepted in where conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Comparator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "LIKE", alias = "like")]
    Like,
    #[serde(rename = "IS NULL", alias = "is null")]
    IsNull,
    #[serde(rename = "IS NOT NULL", alias = "is not null")]
    IsNotNull,
    #[serde(rename = "IN", alias = "in")]
    In,
}

impl Comparator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Ne => "!=",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Like => "LIKE",
            Comparator::IsNull => "IS NULL",
            Comparator::IsNotNull => "IS NOT NULL",
            Comparator::In => "IN",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Comparator {
    type Err = SchemaqlError;

    fn from_str(s: &str) -> Result<Self> {
        let cmp = match s.trim().to_ascii_uppercase().as_str() {
            "=" => Comparator::Eq,
            "!=" | "<>" => Comparator::Ne,
            "<" => Comparator::Lt,
            "<=" => Comparator::Le,
            ">" => Comparator::Gt,
            ">=" => Comparator::Ge,
            "LIKE" => Comparator::Like,
            "IS NULL" => Comparator::IsNull,
            "IS NOT NULL" => Comparator::IsNotNull,
            "IN" => Comparator::In,
            other => {
                return Err(SchemaqlError::invalid_condition(format!(
                    "unknown comparator '{other}'"
                )))
            }
        };
        Ok(cmp)
    }
}

/// The request-facing shape of a where condition.
#[derive(Debug, Clone, Deserialize)]
pub struct WhereCondition {
    pub field: String,
    pub cmp: Comparator,
    #[serde(default)]
    pub val: Value,
}

/// A clause already rendered to SQL, with its bound parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedCondition {
    pub sql: String,
    pub params: Vec<SqlValue>,
    /// References a computed projection, so it belongs in HAVING.
    pub aggregate: bool,
    /// References a column of a joined table.
    pub joined: bool,
}

/// A node of the condition tree.
///
/// Only [`Condition::Where`] can be deserialized from a request; raw clauses
/// are built internally.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "WhereCondition")]
pub enum Condition {
    Where {
        field: String,
        cmp: Comparator,
        val: Value,
    },
    Raw(RenderedCondition),
}

impl From<WhereCondition> for Condition {
    fn from(c: WhereCondition) -> Self {
        Condition::Where {
            field: c.field,
            cmp: c.cmp,
            val: c.val,
        }
    }
}

impl Condition {
    pub fn new(field: &str, cmp: Comparator, val: Value) -> Self {
        Condition::Where {
            field: field.to_string(),
            cmp,
            val,
        }
    }

    /// Render against a walked query.
    pub fn render(&self, query: &Query<'_>) -> Result<RenderedCondition> {
        let (field_path, cmp, val) = match self {
            Condition::Raw(rendered) => return Ok(rendered.clone()),
            Condition::Where { field, cmp, val } => (field, *cmp, val),
        };
        let mapped = query
            .mapped_field(field_path)
            .ok_or_else(|| SchemaqlError::UnknownField {
                collection: query.collection().name().to_string(),
                field: field_path.clone(),
            })?;
        let column = mapped.condition_expression();
        let aggregate = mapped.is_computed();
        let joined = !aggregate && mapped.table_alias != ROOT_ALIAS;
        let context = query.context;
        let convert = |value: &Value| {
            let resolved = resolve_indirection(value, context);
            mapped
                .field
                .to_storage(&resolved, context)
                .map_err(|e| e.at_path(field_path))
        };

        let (sql, params) = match cmp {
            Comparator::IsNull | Comparator::IsNotNull => (format!("{column} {cmp}"), Vec::new()),
            Comparator::In => {
                let resolved = resolve_indirection(val, context);
                let items = match resolved {
                    Value::Array(items) if !items.is_empty() => items,
                    _ => {
                        return Err(SchemaqlError::invalid_condition(format!(
                            "IN on '{field_path}' requires a non-empty array value"
                        )))
                    }
                };
                let params = items.iter().map(&convert).collect::<Result<Vec<_>>>()?;
                let placeholders = vec!["?"; params.len()].join(",");
                (format!("{column} IN ({placeholders})"), params)
            }
            Comparator::Like => {
                let pattern = match convert(val)? {
                    SqlValue::Text(s) => s,
                    SqlValue::Null => {
                        return Err(SchemaqlError::invalid_condition(format!(
                            "LIKE on '{field_path}' requires a value"
                        )))
                    }
                    other => other.to_string(),
                };
                (
                    format!("{column} LIKE ?"),
                    vec![SqlValue::Text(format!("%{pattern}%"))],
                )
            }
            _ => (format!("{column} {cmp} ?"), vec![convert(val)?]),
        };
        Ok(RenderedCondition {
            sql,
            params,
            aggregate,
            joined,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

/// Represents a group of conditions joined by one operator
#[derive(Debug, Clone)]
pub struct WhereClause {
    pub conditions: Vec<Condition>,
    pub operator: LogicalOperator,
}

impl WhereClause {
    /// Combine multiple conditions with OR
    pub fn or(conditions: Vec<Condition>) -> Self {
        Self {
            conditions,
            operator: LogicalOperator::Or,
        }
    }

    /// Render every member and join them. `None` when the group is empty.
    pub fn render(&self, query: &Query<'_>) -> Result<Option<RenderedCondition>> {
        let rendered = self
            .conditions
            .iter()
            .map(|c| c.render(query))
            .collect::<Result<Vec<_>>>()?;
        Ok(join_rendered(rendered, self.operator))
    }
}

/// Join already rendered clauses. OR groups of more than one member are
/// parenthesised.
pub fn join_rendered(
    rendered: Vec<RenderedCondition>,
    operator: LogicalOperator,
) -> Option<RenderedCondition> {
    if rendered.is_empty() {
        return None;
    }
    let count = rendered.len();
    let separator = match operator {
        LogicalOperator::And => " AND ",
        LogicalOperator::Or => " OR ",
    };
    let mut sqls = Vec::with_capacity(count);
    let mut params = Vec::new();
    let mut aggregate = false;
    let mut joined = false;
    for r in rendered {
        sqls.push(r.sql);
        params.extend(r.params);
        aggregate |= r.aggregate;
        joined |= r.joined;
    }
    let mut sql = sqls.join(separator);
    if operator == LogicalOperator::Or && count > 1 {
        sql = format!("({sql})");
    }
    Some(RenderedCondition {
        sql,
        params,
        aggregate,
        joined,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySort {
    pub field_name: String,
    /// Negative sorts descending.
    #[serde(default)]
    pub direction: i32,
}

/// Everything a caller can ask of one collection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryConditions {
    pub collection: String,
    #[serde(default)]
    pub fieldset: Option<String>,
    #[serde(default, rename = "where")]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub pk: Option<u64>,
    #[serde(default)]
    pub filter: IndexMap<String, Value>,
    #[serde(default)]
    pub search: IndexMap<String, String>,
    #[serde(default)]
    pub sort: Vec<QuerySort>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl QueryConditions {
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            ..Default::default()
        }
    }

    pub fn fieldset(mut self, name: &str) -> Self {
        self.fieldset = Some(name.to_string());
        self
    }

    pub fn where_condition(mut self, field: &str, cmp: Comparator, val: Value) -> Self {
        self.conditions.push(Condition::new(field, cmp, val));
        self
    }

    pub fn where_eq(self, field: &str, val: Value) -> Self {
        self.where_condition(field, Comparator::Eq, val)
    }

    pub fn where_in(self, field: &str, values: Vec<Value>) -> Self {
        self.where_condition(field, Comparator::In, Value::Array(values))
    }

    pub fn pk(mut self, id: u64) -> Self {
        self.pk = Some(id);
        self
    }

    pub fn filter(mut self, field: &str, val: Value) -> Self {
        self.filter.insert(field.to_string(), val);
        self
    }

    pub fn search(mut self, field: &str, term: &str) -> Self {
        self.search.insert(field.to_string(), term.to_string());
        self
    }

    pub fn sort(mut self, field: &str, direction: i32) -> Self {
        self.sort.push(QuerySort {
            field_name: field.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Page-based limit and offset, pages counted from 1
    pub fn paginate(mut self, page: u32, per_page: u32) -> Self {
        let pagination = Pagination::new(page, per_page);
        self.limit = pagination.limit;
        self.offset = pagination.offset;
        self
    }
}
