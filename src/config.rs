//! # Configuration
//!
//! Connection and model settings, from defaults, an optional file and
//! `SCHEMAQL_`-prefixed environment variables.

use crate::error::{Result, SchemaqlError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";
pub const DEFAULT_POOL_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    /// Fixed number of connections opened up front.
    pub pool_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl DatabaseConfig {
    /// Unless the cache is shared, every connection to an in-memory SQLite
    /// URL opens its own empty database.
    pub fn is_in_memory(&self) -> bool {
        let url = self.url.trim();
        url.starts_with("sqlite:") && (url.contains(":memory:") || url.contains("mode=memory"))
    }

    /// Connections actually opened: one for private in-memory SQLite,
    /// `pool_size` otherwise.
    pub fn effective_pool_size(&self) -> usize {
        if self.is_in_memory() && !self.url.contains("cache=shared") {
            1
        } else {
            self.pool_size
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SchemaqlConfig {
    pub database: DatabaseConfig,
    pub model_path: Option<PathBuf>,
}

impl SchemaqlConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(db_url) = std::env::var("DATABASE_URL") {
            config.database.url = db_url;
        }

        if let Ok(pool_size) = std::env::var("SCHEMAQL_POOL_SIZE") {
            config.database.pool_size = pool_size.parse().map_err(|e| {
                SchemaqlError::configuration(format!("Invalid SCHEMAQL_POOL_SIZE: {e}"))
            })?;
        }

        if let Ok(model_path) = std::env::var("SCHEMAQL_MODEL_PATH") {
            config.model_path = Some(PathBuf::from(model_path));
        }

        config.validate()?;
        Ok(config)
    }

    /// Layer a configuration file (any format the `config` crate detects from
    /// the extension) under `SCHEMAQL_` environment overrides, where nested
    /// keys use `__` (`SCHEMAQL_DATABASE__POOL_SIZE`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("SCHEMAQL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(SchemaqlError::configuration("database url is empty"));
        }
        if self.database.pool_size == 0 {
            return Err(SchemaqlError::configuration("pool size must be at least 1"));
        }
        Ok(())
    }
}
