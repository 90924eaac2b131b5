//! JOIN clauses produced while walking field paths.
//!
//! Relations always compile to `LEFT JOIN` so that a row whose reference
//! is null still comes back. Raw field-set entries may carry their own
//! join text, which is kept as written.

use std::fmt;

/// A single JOIN in a compiled statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Join {
    /// `LEFT JOIN <table> <alias> ON <alias>.<column> = <source>`
    Left {
        table: String,
        alias: String,
        column: String,
        source: String,
    },
    /// A pre-expanded join template from a raw field-set entry.
    Raw(String),
}

impl Join {
    /// Follow a relation field forward: the joined row's id equals the
    /// reference stored on `base_alias.field`.
    pub fn reference(table: &str, alias: &str, base_alias: &str, field: &str) -> Self {
        Join::Left {
            table: table.to_string(),
            alias: alias.to_string(),
            column: "id".to_string(),
            source: format!("{base_alias}.{field}"),
        }
    }

    /// Follow a relation backwards: rows of `table` whose `link_column`
    /// points at `link_alias.id`.
    pub fn dependent(table: &str, alias: &str, link_column: &str, link_alias: &str) -> Self {
        Join::Left {
            table: table.to_string(),
            alias: alias.to_string(),
            column: link_column.to_string(),
            source: format!("{link_alias}.id"),
        }
    }

    pub fn raw(sql: &str) -> Self {
        Join::Raw(sql.trim().to_string())
    }

    pub fn to_sql(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Join::Left {
                table,
                alias,
                column,
                source,
            } => write!(f, "LEFT JOIN {table} {alias} ON {alias}.{column} = {source}"),
            Join::Raw(sql) => f.write_str(sql),
        }
    }
}
