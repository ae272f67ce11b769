//! Connection trait

use crate::{QueryResult, Result, SqlMonError};
use async_trait::async_trait;

/// An open database connection owned by a single monitor invocation
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "sqlite", "postgres", "mysql")
    fn driver_name(&self) -> &str;

    /// Execute a query that returns rows and fetch the whole result.
    ///
    /// The statement and cursor backing the result are released before this
    /// returns, whether it succeeds or fails.
    async fn query(&self, sql: &str) -> Result<QueryResult>;

    /// Select the catalog (database or schema) subsequent queries run against.
    async fn set_catalog(&self, catalog: &str) -> Result<()> {
        Err(SqlMonError::NotSupported(format!(
            "{} does not support switching catalog to '{}'",
            self.driver_name(),
            catalog
        )))
    }

    /// Close the connection
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;
}
