//! # Error Types
//!
//! Structured error handling for model loading, query compilation and
//! execution using thiserror.
//!
//! Load-time failures (`SchemaDefinition`) abort model construction. Everything
//! else is a request-level failure surfaced to the caller; nothing is retried.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaqlError {
    #[error("Schema definition error in {context}: {message}")]
    SchemaDefinition { context: String, message: String },

    #[error("No collection named '{collection}'")]
    UnknownCollection { collection: String },

    #[error("Fieldset '{fieldset}' doesn't exist on collection '{collection}'")]
    UnknownFieldSet { collection: String, fieldset: String },

    #[error("Field '{field}' does not exist in '{collection}'")]
    UnknownField { collection: String, field: String },

    #[error("Field '{field}' in '{collection}' is not a reference and cannot be walked")]
    NotARelation { collection: String, field: String },

    #[error("Sort referenced non mapped field '{field}'")]
    UnknownSortField { field: String },

    #[error("No custom query named '{name}'")]
    UnknownCustomQuery { name: String },

    #[error("Attempt to update field not in fieldset: '{path}'")]
    FieldNotInFieldSet { path: String },

    #[error("Field '{path}' doesn't belong to the root table and cannot be inserted")]
    NotRootField { path: String },

    #[error("Error converting '{path}': expected {expected}: {message}")]
    Conversion {
        path: String,
        expected: String,
        message: String,
    },

    #[error("Invalid condition: {message}")]
    InvalidCondition { message: String },

    #[error("Expected {expected} row(s), got {actual}")]
    UnexpectedRowCount { expected: usize, actual: usize },

    #[error("Statement failed: {source} (sql: {sql})")]
    Execution {
        sql: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Could not open database connection: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl SchemaqlError {
    pub fn schema(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaDefinition {
            context: context.into(),
            message: message.into(),
        }
    }

    /// A conversion failure not yet attributed to a field path.
    pub fn conversion(expected: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            path: String::new(),
            expected: expected.into(),
            message: message.into(),
        }
    }

    pub fn invalid_condition(message: impl Into<String>) -> Self {
        Self::InvalidCondition {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Attach the offending field path to a conversion error. Other kinds pass
    /// through untouched.
    pub fn at_path(self, field_path: &str) -> Self {
        match self {
            Self::Conversion {
                path,
                expected,
                message,
            } if path.is_empty() => Self::Conversion {
                path: field_path.to_string(),
                expected,
                message,
            },
            other => other,
        }
    }

    /// Whether this error was caused by the request rather than the model or
    /// the database.
    pub fn is_request_error(&self) -> bool {
        !matches!(
            self,
            Self::SchemaDefinition { .. }
                | Self::Execution { .. }
                | Self::Connection(_)
                | Self::Configuration { .. }
        )
    }
}

impl From<config::ConfigError> for SchemaqlError {
    fn from(err: config::ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SchemaqlError>;
