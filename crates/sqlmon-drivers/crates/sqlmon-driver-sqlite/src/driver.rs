//! SQLite driver implementation

use async_trait::async_trait;
use std::sync::Arc;
use sqlmon_core::{Connection, ConnectionConfig, DatabaseDriver, Result, SqlMonError, strip_jdbc_prefix};

use crate::SqliteConnection;

/// SQLite database driver
pub struct SqliteDriver;

impl SqliteDriver {
    /// Create a new SQLite driver instance
    pub fn new() -> Self {
        tracing::debug!("SQLite driver initialized");
        Self
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for SqliteDriver {
    fn id(&self) -> &'static str {
        "sqlite"
    }

    fn display_name(&self) -> &'static str {
        "SQLite"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["sqlite3", "org.sqlite.JDBC"]
    }

    fn url_schemes(&self) -> &'static [&'static str] {
        &["sqlite", "sqlite3"]
    }

    fn connection_string_help(&self) -> &'static str {
        "sqlite:/path/to/database.db, sqlite:///abs/path.db?mode=ro or sqlite::memory:"
    }

    #[tracing::instrument(skip(self, config), fields(url = %config.redacted_url()))]
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let path = parse_sqlite_url(&config.url)?;

        let conn = SqliteConnection::open(&path).inspect_err(|e| {
            tracing::error!(error = %e, "failed to connect to SQLite database");
        })?;

        tracing::info!(path = %path, "SQLite connection created");
        Ok(Arc::new(conn))
    }
}

/// Turn a `sqlite:` connection URL into the path or URI handed to SQLite.
///
/// - `sqlite::memory:` opens an in-memory database
/// - `sqlite:/abs/path.db` and `sqlite:///abs/path.db` open an absolute path
/// - `sqlite://relative.db` opens a path relative to the working directory
/// - a query string is kept by rewriting the target as a `file:` URI
pub fn parse_sqlite_url(url: &str) -> Result<String> {
    let url = strip_jdbc_prefix(url);
    let rest = url
        .split_once(':')
        .filter(|(scheme, _)| {
            scheme.eq_ignore_ascii_case("sqlite") || scheme.eq_ignore_ascii_case("sqlite3")
        })
        .map(|(_, rest)| rest)
        .ok_or_else(|| {
            SqlMonError::Configuration(format!("not a SQLite URL: '{}'", url))
        })?;

    let rest = rest.strip_prefix("//").unwrap_or(rest);
    if rest.is_empty() {
        return Err(SqlMonError::Configuration(
            "SQLite URL does not name a database file".into(),
        ));
    }
    if rest == ":memory:" {
        return Ok(":memory:".to_string());
    }

    match rest.split_once('?') {
        Some((path, query)) if !path.is_empty() => Ok(format!("file:{}?{}", path, query)),
        Some(_) => Err(SqlMonError::Configuration(
            "SQLite URL does not name a database file".into(),
        )),
        None => Ok(rest.to_string()),
    }
}
