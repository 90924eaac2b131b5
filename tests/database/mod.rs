//! Database integration tests
//!
//! Pool behaviour and end-to-end execution against SQLite, including
//! computed field sets.

pub mod computed;
pub mod pool;
