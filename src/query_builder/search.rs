//! WHERE and HAVING compilation: explicit conditions, primary key, equality
//! filters and free-text search, AND'ed together.

use super::conditions::{join_rendered, Comparator, Condition, LogicalOperator, RenderedCondition, WhereClause};
use super::query::Query;
use crate::error::Result;
use crate::schema::PRIMARY_KEY;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

/// Every field, any table.
pub const SEARCH_ALL: &str = "*";

static NOT_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("token split pattern is valid"));
static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("numeric pattern is valid"));

/// The compiled filter clauses of one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    pub where_clause: Option<RenderedCondition>,
    pub having_clause: Option<RenderedCondition>,
}

impl Filters {
    /// ` WHERE ...` or nothing at all.
    pub fn where_sql(&self) -> String {
        self.where_clause
            .as_ref()
            .map(|w| format!(" WHERE {}", w.sql))
            .unwrap_or_default()
    }

    pub fn having_sql(&self) -> String {
        self.having_clause
            .as_ref()
            .map(|h| format!(" HAVING {}", h.sql))
            .unwrap_or_default()
    }
}

pub fn tokenize(term: &str) -> Vec<&str> {
    NOT_ALPHANUMERIC
        .split(term)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Collect every top-level condition of the request, render it, and split
/// aggregate predicates into HAVING.
pub fn compile_filters(query: &Query<'_>) -> Result<Filters> {
    let request = query.conditions();
    let mut conditions: Vec<Condition> = request.conditions.clone();

    if let Some(pk) = request.pk {
        conditions.push(Condition::new(PRIMARY_KEY, Comparator::Eq, Value::from(pk)));
    }
    for (field, value) in &request.filter {
        conditions.push(Condition::new(field, Comparator::Eq, value.clone()));
    }
    for (field, term) in &request.search {
        if let Some(condition) = search_condition(query, field, term)? {
            conditions.push(condition);
        }
    }

    let mut where_parts = Vec::new();
    let mut having_parts = Vec::new();
    for condition in &conditions {
        let rendered = condition.render(query)?;
        if rendered.aggregate {
            having_parts.push(rendered);
        } else {
            where_parts.push(rendered);
        }
    }
    Ok(Filters {
        where_clause: join_rendered(where_parts, LogicalOperator::And),
        having_clause: join_rendered(having_parts, LogicalOperator::And),
    })
}

fn search_condition(query: &Query<'_>, field: &str, term: &str) -> Result<Option<Condition>> {
    let tokens = tokenize(term);
    if tokens.is_empty() {
        return Ok(None);
    }

    if field == SEARCH_ALL {
        if NUMERIC.is_match(term) {
            if let Ok(id) = term.parse::<u64>() {
                return Ok(Some(Condition::new(PRIMARY_KEY, Comparator::Eq, Value::from(id))));
            }
        }
        let searchable: Vec<String> = query
            .searchable_fields()
            .into_iter()
            .map(|f| f.path.clone())
            .collect();
        if searchable.is_empty() {
            debug!(collection = %query.collection().name(), "No searchable fields, skipping search");
            return Ok(None);
        }
        let mut per_token = Vec::with_capacity(tokens.len());
        for token in tokens {
            let group = WhereClause::or(
                searchable
                    .iter()
                    .map(|path| Condition::new(path, Comparator::Like, Value::from(token)))
                    .collect(),
            );
            if let Some(rendered) = group.render(query)? {
                per_token.push(rendered);
            }
        }
        return Ok(join_rendered(per_token, LogicalOperator::And).map(Condition::Raw));
    }

    let group = WhereClause::or(
        tokens
            .into_iter()
            .map(|token| Condition::new(field, Comparator::Like, Value::from(token)))
            .collect(),
    );
    Ok(group.render(query)?.map(Condition::Raw))
}
