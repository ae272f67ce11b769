//! PostgreSQL connection implementation

use async_trait::async_trait;
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use sqlmon_core::{ColumnMeta, Connection, QueryResult, Result, Row, SqlMonError};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_postgres::config::SslMode;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

use crate::value::{has_binary_decoder, postgres_to_value, text_to_value};

pub(crate) fn format_postgres_error(error: &tokio_postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut message = db_error.message().to_string();
    if let Some(detail) = db_error.detail()
        && !detail.trim().is_empty()
    {
        message.push_str(&format!(" (detail: {})", detail));
    }
    if let Some(hint) = db_error.hint()
        && !hint.trim().is_empty()
    {
        message.push_str(&format!(" (hint: {})", hint));
    }

    match db_error.code().code() {
        "42P01" => format!("undefined table: {}", message),
        "42703" => format!("undefined column: {}", message),
        "42601" => format!("syntax error: {}", message),
        "3F000" => format!("invalid schema name: {}", message),
        code => format!("{} (code: {})", message, code),
    }
}

/// Quote an identifier for PostgreSQL
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// PostgreSQL connection wrapper
///
/// The wire protocol runs on a task spawned onto the current runtime; it ends
/// when the client is dropped.
pub struct PostgresConnection {
    client: Mutex<Option<Client>>,
    driver_task: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl PostgresConnection {
    /// Connect to a PostgreSQL database
    pub async fn connect(config: tokio_postgres::Config) -> Result<Self> {
        let ssl_mode = config.get_ssl_mode();
        tracing::info!(
            hosts = config.get_hosts().len(),
            dbname = ?config.get_dbname(),
            ssl_mode = ?ssl_mode,
            "connecting to PostgreSQL"
        );

        let (client, driver_task) = if matches!(ssl_mode, SslMode::Disable) {
            let (client, connection) = config.connect(NoTls).await.map_err(|e| {
                SqlMonError::Connection(format!(
                    "Failed to connect to PostgreSQL: {}",
                    format_postgres_error(&e)
                ))
            })?;
            let task = tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!(error = %e, "PostgreSQL connection error");
                }
            });
            (client, task)
        } else {
            // prefer/require encrypt but do not verify, matching libpq
            let tls_connector = TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
                .map_err(|e| {
                    SqlMonError::Connection(format!("Failed to build TLS connector: {}", e))
                })?;
            let tls = MakeTlsConnector::new(tls_connector);

            let (client, connection) = config.connect(tls).await.map_err(|e| {
                SqlMonError::Connection(format!(
                    "Failed to connect to PostgreSQL: {}",
                    format_postgres_error(&e)
                ))
            })?;
            let task = tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!(error = %e, "PostgreSQL connection error");
                }
            });
            (client, task)
        };

        tracing::info!("PostgreSQL connection established");
        Ok(Self {
            client: Mutex::new(Some(client)),
            driver_task: Mutex::new(Some(driver_task)),
            closed: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    fn driver_name(&self) -> &str {
        "postgres"
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str) -> Result<QueryResult> {
        let start_time = std::time::Instant::now();

        let guard = self.client.lock().await;
        let client = guard
            .as_ref()
            .ok_or_else(|| SqlMonError::Connection("PostgreSQL connection is closed".into()))?;

        let statement = client.prepare(sql).await.map_err(|e| {
            SqlMonError::Query(format!("Failed to prepare query: {}", format_postgres_error(&e)))
        })?;

        let columns: Vec<ColumnMeta> = statement
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| ColumnMeta::new(col.name(), col.type_().name(), idx))
            .collect();

        let rows: Vec<Row> = if statement
            .columns()
            .iter()
            .all(|col| has_binary_decoder(col.type_()))
        {
            let pg_rows = client.query(&statement, &[]).await.map_err(|e| {
                SqlMonError::Query(format!("Failed to execute query: {}", format_postgres_error(&e)))
            })?;
            pg_rows
                .iter()
                .map(|pg_row| Row::new((0..columns.len()).map(|i| postgres_to_value(pg_row, i)).collect()))
                .collect()
        } else {
            tracing::debug!("result has types without a binary decoder, fetching as text");
            let messages = client.simple_query(sql).await.map_err(|e| {
                SqlMonError::Query(format!("Failed to execute query: {}", format_postgres_error(&e)))
            })?;
            messages
                .iter()
                .filter_map(|message| match message {
                    SimpleQueryMessage::Row(row) => Some(row),
                    _ => None,
                })
                .map(|row| Row::new((0..row.len()).map(|i| text_to_value(row.get(i))).collect()))
                .collect()
        };

        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::debug!(
            row_count = rows.len(),
            execution_time_ms = execution_time_ms,
            "query executed successfully"
        );

        Ok(QueryResult::new(columns, rows))
    }

    async fn set_catalog(&self, catalog: &str) -> Result<()> {
        // A PostgreSQL session is bound to one database; the catalog selects the schema path
        let guard = self.client.lock().await;
        let client = guard
            .as_ref()
            .ok_or_else(|| SqlMonError::Connection("PostgreSQL connection is closed".into()))?;

        let statement = format!("SET search_path TO {}", quote_ident(catalog));
        client.batch_execute(&statement).await.map_err(|e| {
            SqlMonError::Query(format!(
                "Failed to switch catalog to '{}': {}",
                catalog,
                format_postgres_error(&e)
            ))
        })?;

        tracing::debug!(catalog = %catalog, "PostgreSQL search_path switched");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::info!("closing PostgreSQL connection");

        drop(self.client.lock().await.take());
        if let Some(task) = self.driver_task.lock().await.take()
            && let Err(e) = task.await
        {
            return Err(SqlMonError::Connection(format!(
                "PostgreSQL connection task failed: {}",
                e
            )));
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("public"), "\"public\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        // Port 1 is never a PostgreSQL server
        let mut config = tokio_postgres::Config::new();
        config
            .host("127.0.0.1")
            .port(1)
            .user("monitor")
            .dbname("metrics")
            .ssl_mode(SslMode::Disable)
            .connect_timeout(std::time::Duration::from_secs(2));

        let err = match PostgresConnection::connect(config).await {
            Ok(_) => panic!("connection to port 1 must fail"),
            Err(err) => err,
        };
        assert!(matches!(err, SqlMonError::Connection(_)));
    }
}
