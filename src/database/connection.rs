use super::pool::{Connector, Pool};
use crate::error::{Result, SchemaqlError};
use async_trait::async_trait;
use sqlx::{AnyConnection, Connection, Row};
use std::sync::Once;
use tracing::debug;

static DRIVERS: Once = Once::new();

/// Register the compiled-in sqlx drivers (MySQL, SQLite) with `Any`.
pub fn install_drivers() {
    DRIVERS.call_once(sqlx::any::install_default_drivers);
}

/// Opens `AnyConnection`s against one URL.
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    url: String,
}

impl DatabaseConnection {
    pub fn new(url: impl Into<String>) -> Self {
        install_drivers();
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open a pool of `size` connections.
    pub async fn pool(&self, size: usize) -> Result<Pool<AnyConnection>> {
        Pool::open(self, size).await
    }
}

#[async_trait]
impl Connector for DatabaseConnection {
    type Connection = AnyConnection;

    async fn connect(&self) -> Result<AnyConnection> {
        debug!(url = %redact(&self.url), "Opening connection");
        AnyConnection::connect(&self.url)
            .await
            .map_err(SchemaqlError::Connection)
    }
}

/// Round-trip a trivial statement on one handle.
pub async fn health_check(conn: &mut AnyConnection) -> Result<bool> {
    let row = sqlx::query("SELECT 1 AS health")
        .fetch_one(&mut *conn)
        .await
        .map_err(|source| SchemaqlError::Execution {
            sql: "SELECT 1 AS health".to_string(),
            source,
        })?;
    let health: i64 = row.try_get("health").map_err(SchemaqlError::Connection)?;
    Ok(health == 1)
}

/// Hide credentials in a connection URL for logging.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme), Some(at)) if at > scheme => format!("{}://***{}", &url[..scheme], &url[at..]),
        _ => url.to_string(),
    }
}
