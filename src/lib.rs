#![allow(clippy::doc_markdown)] // Allow technical terms like MySQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # schemaql
//!
//! Schema-driven SQL query compiler.
//!
//! ## Overview
//!
//! A declarative model names collections, their typed fields and named field
//! sets. Requests ask for a field set of one collection with conditions,
//! search, sorting and paging; the compiler walks relation paths into left
//! joins, allocates aliases and emits parameterised SQL. Results come back
//! as maps keyed by field path, converted through each field's type.
//!
//! ## Module Organization
//!
//! - [`types`] - field type registry and value conversion
//! - [`schema`] - model loading: collections, field sets, custom queries, hooks
//! - [`query_builder`] - field-set walking and statement compilation
//! - [`database`] - connection pool, execution and row conversion
//! - [`config`] - configuration management
//! - [`logging`] - structured logging setup
//! - [`error`] - structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use schemaql::{Database, DatabaseConfig, MapContext, Model, QueryConditions};
//! use std::sync::Arc;
//!
//! # async fn example() -> schemaql::Result<()> {
//! let model = Model::from_json_str(r#"{
//!     "collections": {
//!         "user": {"fields": {"name": {"type": "string"}, "age": {"type": "int"}}}
//!     }
//! }"#)?;
//! let db = Database::open(Arc::new(model), &DatabaseConfig::default()).await?;
//! let adults = db
//!     .select(
//!         QueryConditions::new("user").where_condition(
//!             "age",
//!             schemaql::Comparator::Ge,
//!             serde_json::json!(18),
//!         ),
//!         &MapContext::new(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod query_builder;
pub mod schema;
pub mod types;

pub use config::{DatabaseConfig, SchemaqlConfig};
pub use database::{Database, Pool, Record, UpdateOutcome};
pub use error::{Result, SchemaqlError};
pub use query_builder::{Comparator, Condition, Query, QueryConditions, Statement};
pub use schema::{Collection, FieldSetEntry, Model};
pub use types::{Context, Field, FieldType, MapContext, SqlValue};
