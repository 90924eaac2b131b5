use super::conditions::QuerySort;
use super::query::Query;
use crate::error::{Result, SchemaqlError};

/// Represents pagination parameters for SQL queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    /// Create pagination with page number and per-page count
    pub fn new(page: u32, per_page: u32) -> Self {
        let offset = if page > 0 {
            Some(i64::from(page - 1) * i64::from(per_page))
        } else {
            None
        };
        Self {
            limit: Some(i64::from(per_page)),
            offset,
        }
    }

    pub fn from_parts(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self { limit, offset }
    }

    /// Convert to SQL string. Non-positive limits and offsets are ignored; an
    /// offset without a limit gets the largest one so the clause stays valid.
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        let limit = self.limit.filter(|l| *l > 0);
        let offset = self.offset.filter(|o| *o > 0);

        match (limit, offset) {
            (Some(limit), _) => sql.push_str(&format!(" LIMIT {limit}")),
            (None, Some(_)) => sql.push_str(&format!(" LIMIT {}", i64::MAX)),
            (None, None) => {}
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        sql
    }
}

/// Resolve every requested sort field to its projected alias.
pub fn order_by(query: &Query<'_>, sort: &[QuerySort]) -> Result<String> {
    if sort.is_empty() {
        return Ok(String::new());
    }
    let parts = sort
        .iter()
        .map(|s| {
            let mapped = query
                .mapped_field(&s.field_name)
                .ok_or_else(|| SchemaqlError::UnknownSortField {
                    field: s.field_name.clone(),
                })?;
            let direction = if s.direction < 0 { "DESC" } else { "ASC" };
            Ok(format!("{} {direction}", mapped.alias))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(" ORDER BY {}", parts.join(", ")))
}
