//! SQLite connection implementation

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection as RusqliteConnection, OpenFlags};
use sqlmon_core::{ColumnMeta, Connection, QueryResult, Result, Row, SqlMonError, Value};

/// SQLite connection wrapper
///
/// The database is opened read-write but never created: pointing the monitor
/// at a missing file is a connection error, not a new empty database.
pub struct SqliteConnection {
    conn: Mutex<Option<RusqliteConnection>>,
}

impl SqliteConnection {
    /// Open a SQLite database
    pub fn open(path: &str) -> Result<Self> {
        tracing::info!(path = %path, "opening SQLite database");
        let expanded_path = Self::expand_path(path)?;

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = if path == ":memory:" {
            RusqliteConnection::open_in_memory().map_err(|e| {
                SqlMonError::Connection(format!("Failed to open in-memory database: {}", e))
            })?
        } else {
            if !expanded_path.starts_with("file:") && !std::path::Path::new(&expanded_path).exists()
            {
                return Err(SqlMonError::Connection(format!(
                    "SQLite database does not exist: {}",
                    expanded_path
                )));
            }

            RusqliteConnection::open_with_flags(&expanded_path, flags).map_err(|e| {
                SqlMonError::Connection(format!(
                    "Failed to open SQLite database at '{}': {}",
                    expanded_path, e
                ))
            })?
        };

        tracing::info!(path = %expanded_path, "SQLite database connection established");
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Expand path to handle ~ (home directory) and relative paths
    fn expand_path(path: &str) -> Result<String> {
        if path == ":memory:" || path.starts_with("file:") {
            return Ok(path.to_string());
        }

        let expanded = if let Some(rest) = path.strip_prefix("~/") {
            match std::env::var_os("HOME") {
                Some(home) => std::path::PathBuf::from(home)
                    .join(rest)
                    .to_string_lossy()
                    .to_string(),
                None => {
                    return Err(SqlMonError::Configuration(
                        "Unable to determine HOME directory".into(),
                    ));
                }
            }
        } else {
            path.to_string()
        };

        let path_buf = std::path::PathBuf::from(&expanded);
        let result = if path_buf.is_relative() {
            std::env::current_dir()?
                .join(path_buf)
                .to_string_lossy()
                .to_string()
        } else {
            expanded
        };

        Ok(result)
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    fn driver_name(&self) -> &str {
        "sqlite"
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str) -> Result<QueryResult> {
        let start_time = std::time::Instant::now();

        let guard = self.conn.lock();
        let conn = guard
            .as_ref()
            .ok_or_else(|| SqlMonError::Connection("SQLite connection is closed".into()))?;

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| SqlMonError::Query(format!("Failed to prepare query: {}", e)))?;

        let columns: Vec<ColumnMeta> = stmt
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                // decl_type is the type from CREATE TABLE; expressions have none
                ColumnMeta::new(col.name(), col.decl_type().unwrap_or("DYNAMIC"), idx)
            })
            .collect();

        let mut rows = Vec::new();
        let mut query_rows = stmt
            .query([])
            .map_err(|e| SqlMonError::Query(format!("Failed to execute query: {}", e)))?;

        while let Some(row) = query_rows
            .next()
            .map_err(|e| SqlMonError::Query(format!("Failed to fetch row: {}", e)))?
        {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(rusqlite_to_value(row, i)?);
            }
            rows.push(Row::new(values));
        }

        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::debug!(
            row_count = rows.len(),
            execution_time_ms = execution_time_ms,
            "query executed successfully"
        );

        Ok(QueryResult::new(columns, rows))
    }

    async fn set_catalog(&self, catalog: &str) -> Result<()> {
        // SQLite has a single catalog per connection, always named "main"
        if catalog.eq_ignore_ascii_case("main") {
            tracing::debug!("SQLite catalog is already 'main'");
            return Ok(());
        }
        Err(SqlMonError::NotSupported(format!(
            "SQLite cannot switch catalog to '{}'",
            catalog
        )))
    }

    async fn close(&self) -> Result<()> {
        tracing::info!("closing SQLite connection");
        let Some(conn) = self.conn.lock().take() else {
            return Ok(());
        };
        conn.close().map_err(|(_, e)| {
            SqlMonError::Connection(format!("Failed to close SQLite connection: {}", e))
        })
    }

    fn is_closed(&self) -> bool {
        self.conn.lock().is_none()
    }
}

/// Convert rusqlite row value to our Value type
fn rusqlite_to_value(row: &rusqlite::Row, idx: usize) -> Result<Value> {
    use rusqlite::types::ValueRef;

    let value_ref = row
        .get_ref(idx)
        .map_err(|e| SqlMonError::Query(e.to_string()))?;

    let value = match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int64(i),
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).to_string()),
        // Text is often stored in untyped columns as a BLOB
        ValueRef::Blob(b) => match std::str::from_utf8(b) {
            Ok(s) => Value::String(s.to_string()),
            Err(_) => Value::Bytes(b.to_vec()),
        },
    };

    Ok(value)
}
