//! # Query Compiler
//!
//! Compiles a [`QueryConditions`] request against a loaded model into
//! parameterised SQL.
//!
//! ## Overview
//!
//! A [`Query`] walks the requested field set once, allocating a table alias
//! (`t0`, `t1`, ...) per join path and a column alias (`f0`, `f1`, ...) per
//! projected field, then assembles one of four statements:
//!
//! - [`Query::build_select`] - projected columns, left joins, WHERE, `GROUP BY
//!   t0.id`, HAVING, ORDER BY, LIMIT/OFFSET
//! - [`Query::build_update`] - `SET` from a changeset, capped at one row unless
//!   a non-positive limit asks for a joined multi-row update
//! - [`Query::build_insert`] - root-table columns plus declared defaults
//! - [`Query::build_delete`] - one row by primary key
//!
//! ## Key Components
//!
//! - [`query`] - alias allocation and the mapped table/field registry
//! - [`walker`] - field-set entry walking (direct, raw, aggregate, duration)
//! - [`conditions`] - the condition tree and request shape
//! - [`search`] - WHERE/HAVING compilation including free-text search
//! - [`joins`] - JOIN clause rendering
//! - [`pagination`] - ORDER BY and LIMIT/OFFSET
//!
//! Every request value reaches the database as a bound parameter.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use schemaql::query_builder::{Query, QueryConditions};
//!
//! let conditions = QueryConditions::new("user").search("*", "alice").limit(20);
//! let mut query = Query::new(&model, conditions, &context)?;
//! let statement = query.build_select()?;
//! ```

pub mod builder;
pub mod conditions;
pub mod joins;
pub mod pagination;
pub mod query;
pub mod search;
pub(crate) mod walker;

pub use builder::Statement;
pub use conditions::{
    Comparator, Condition, LogicalOperator, QueryConditions, QuerySort, RenderedCondition,
    WhereClause, WhereCondition,
};
pub use joins::Join;
pub use pagination::Pagination;
pub use query::{MappedField, MappedTable, Projection, Query, ROOT_ALIAS};
pub use search::{Filters, SEARCH_ALL};
