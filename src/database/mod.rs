//! # Database Operations
//!
//! Connection pooling and statement execution over sqlx's `Any` driver.
//!
//! ## Key Components
//!
//! - [`pool`] - fixed-capacity pool with blocking checkout
//! - [`connection`] - `AnyConnection` opening and health checks
//! - [`executor`] - runs compiled statements and converts rows back to
//!   application values
//!
//! Statements are not wrapped in transactions; each call checks out one
//! connection and returns it on every exit path.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use schemaql::config::SchemaqlConfig;
//! use schemaql::database::Database;
//! use schemaql::query_builder::QueryConditions;
//! use schemaql::types::MapContext;
//!
//! # async fn example() -> Result<(), schemaql::SchemaqlError> {
//! let config = SchemaqlConfig::from_env()?;
//! let db = Database::connect(&config).await?;
//! let rows = db.select(QueryConditions::new("user").limit(10), &MapContext::new()).await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod executor;
pub mod pool;

pub use connection::{health_check, install_drivers, DatabaseConnection};
pub use executor::{convert_row, Database, Record, UpdateOutcome};
pub use pool::{Connector, Pool, PooledConnection};
