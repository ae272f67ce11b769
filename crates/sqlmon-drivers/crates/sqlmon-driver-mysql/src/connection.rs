//! MySQL connection implementation

use async_trait::async_trait;
use mysql_async::consts::ColumnType;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts, Row as MySqlRow};
use sqlmon_core::{ColumnMeta, Connection, QueryResult, Result, Row, SqlMonError, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// Quote an identifier for MySQL
fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Type name of a column without the protocol prefix, e.g. `LONGLONG`
fn column_type_name(col_type: ColumnType) -> String {
    let name = format!("{:?}", col_type);
    name.strip_prefix("MYSQL_TYPE_").unwrap_or(&name).to_string()
}

/// MySQL connection wrapper holding a single session
pub struct MySqlConnection {
    conn: Mutex<Option<Conn>>,
    closed: AtomicBool,
}

impl MySqlConnection {
    /// Connect to a MySQL database
    pub async fn connect(opts: Opts) -> Result<Self> {
        tracing::info!(
            host = %opts.ip_or_hostname(),
            port = opts.tcp_port(),
            database = ?opts.db_name(),
            "connecting to MySQL database"
        );

        let conn = Conn::new(opts)
            .await
            .map_err(|e| SqlMonError::Connection(format!("Failed to connect to MySQL: {}", e)))?;

        tracing::info!("MySQL connection established");
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            closed: AtomicBool::new(false),
        })
    }
}

fn mysql_value_to_value(val: mysql_async::Value, col_type: ColumnType) -> Value {
    match val {
        mysql_async::Value::NULL => Value::Null,
        // Text protocol delivers every non-null value as bytes
        mysql_async::Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(s) => match col_type {
                ColumnType::MYSQL_TYPE_TINY
                | ColumnType::MYSQL_TYPE_SHORT
                | ColumnType::MYSQL_TYPE_LONG
                | ColumnType::MYSQL_TYPE_LONGLONG
                | ColumnType::MYSQL_TYPE_INT24
                | ColumnType::MYSQL_TYPE_YEAR => {
                    s.parse::<i64>().map(Value::Int64).unwrap_or(Value::String(s))
                }
                ColumnType::MYSQL_TYPE_FLOAT => {
                    s.parse::<f32>().map(Value::Float32).unwrap_or(Value::String(s))
                }
                ColumnType::MYSQL_TYPE_DOUBLE => {
                    s.parse::<f64>().map(Value::Float64).unwrap_or(Value::String(s))
                }
                // Exact text keeps trailing scale, e.g. "12.50"
                ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
                    Value::Decimal(s)
                }
                _ => Value::String(s),
            },
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        mysql_async::Value::Int(i) => Value::Int64(i),
        mysql_async::Value::UInt(u) => {
            if u <= i64::MAX as u64 {
                Value::Int64(u as i64)
            } else {
                Value::Decimal(u.to_string())
            }
        }
        mysql_async::Value::Float(f) => Value::Float32(f),
        mysql_async::Value::Double(d) => Value::Float64(d),
        mysql_async::Value::Date(year, month, day, hour, min, sec, micro) => {
            let date = chrono::NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32);
            if hour == 0 && min == 0 && sec == 0 && micro == 0 {
                match date {
                    Some(date) => Value::Date(date),
                    None => Value::String(format!("{:04}-{:02}-{:02}", year, month, day)),
                }
            } else {
                match date.and_then(|d| d.and_hms_micro_opt(hour as u32, min as u32, sec as u32, micro)) {
                    Some(dt) => Value::DateTime(dt),
                    None => Value::String(format!(
                        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                        year, month, day, hour, min, sec
                    )),
                }
            }
        }
        mysql_async::Value::Time(negative, days, hours, mins, secs, micros) => {
            let total_hours = days * 24 + hours as u32;
            let sign = if negative { "-" } else { "" };
            Value::String(format!(
                "{}{:02}:{:02}:{:02}.{:06}",
                sign, total_hours, mins, secs, micros
            ))
        }
    }
}

#[async_trait]
impl Connection for MySqlConnection {
    fn driver_name(&self) -> &str {
        "mysql"
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str) -> Result<QueryResult> {
        let start_time = std::time::Instant::now();

        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| SqlMonError::Connection("MySQL connection is closed".into()))?;

        let mut result = conn
            .query_iter(sql)
            .await
            .map_err(|e| SqlMonError::Query(format!("Failed to execute query: {}", e)))?;

        // Column metadata comes from the result set header, so it survives zero rows
        let mysql_columns = result.columns().unwrap_or_default();
        let columns: Vec<ColumnMeta> = mysql_columns
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                ColumnMeta::new(col.name_str(), column_type_name(col.column_type()), idx)
            })
            .collect();
        let column_types: Vec<ColumnType> =
            mysql_columns.iter().map(|col| col.column_type()).collect();

        let mysql_rows: Vec<MySqlRow> = result
            .collect()
            .await
            .map_err(|e| SqlMonError::Query(format!("Failed to fetch rows: {}", e)))?;
        result
            .drop_result()
            .await
            .map_err(|e| SqlMonError::Query(format!("Failed to finish result: {}", e)))?;

        let rows: Vec<Row> = mysql_rows
            .into_iter()
            .map(|mut mysql_row| {
                let values = column_types
                    .iter()
                    .enumerate()
                    .map(|(idx, col_type)| {
                        let raw = mysql_row
                            .take::<mysql_async::Value, _>(idx)
                            .unwrap_or(mysql_async::Value::NULL);
                        mysql_value_to_value(raw, *col_type)
                    })
                    .collect();
                Row::new(values)
            })
            .collect();

        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::debug!(
            row_count = rows.len(),
            execution_time_ms = execution_time_ms,
            "query executed successfully"
        );

        Ok(QueryResult::new(columns, rows))
    }

    async fn set_catalog(&self, catalog: &str) -> Result<()> {
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| SqlMonError::Connection("MySQL connection is closed".into()))?;

        conn.query_drop(format!("USE {}", quote_ident(catalog)))
            .await
            .map_err(|e| {
                SqlMonError::Query(format!("Failed to switch catalog to '{}': {}", catalog, e))
            })?;

        tracing::debug!(catalog = %catalog, "MySQL default database switched");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::info!("closing MySQL connection");

        let Some(conn) = self.conn.lock().await.take() else {
            return Ok(());
        };
        conn.disconnect().await.map_err(|e| {
            SqlMonError::Connection(format!("Failed to close MySQL connection: {}", e))
        })
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_escapes_backticks() {
        assert_eq!(quote_ident("controller"), "`controller`");
        assert_eq!(quote_ident("odd`name"), "`odd``name`");
    }

    #[test]
    fn test_column_type_name() {
        assert_eq!(column_type_name(ColumnType::MYSQL_TYPE_LONGLONG), "LONGLONG");
        assert_eq!(column_type_name(ColumnType::MYSQL_TYPE_VAR_STRING), "VAR_STRING");
    }

    #[test]
    fn test_text_protocol_values_follow_column_type() {
        let bytes = |s: &str| mysql_async::Value::Bytes(s.as_bytes().to_vec());

        assert_eq!(
            mysql_value_to_value(bytes("42"), ColumnType::MYSQL_TYPE_LONGLONG),
            Value::Int64(42)
        );
        assert_eq!(
            mysql_value_to_value(bytes("12.50"), ColumnType::MYSQL_TYPE_NEWDECIMAL),
            Value::Decimal("12.50".into())
        );
        assert_eq!(
            mysql_value_to_value(bytes("db1"), ColumnType::MYSQL_TYPE_VAR_STRING),
            Value::String("db1".into())
        );
        assert_eq!(
            mysql_value_to_value(mysql_async::Value::NULL, ColumnType::MYSQL_TYPE_LONG),
            Value::Null
        );
    }

    #[test]
    fn test_binary_values() {
        assert_eq!(
            mysql_value_to_value(mysql_async::Value::UInt(u64::MAX), ColumnType::MYSQL_TYPE_LONGLONG),
            Value::Decimal(u64::MAX.to_string())
        );
        assert_eq!(
            mysql_value_to_value(
                mysql_async::Value::Date(2024, 3, 1, 0, 0, 0, 0),
                ColumnType::MYSQL_TYPE_DATE
            ),
            Value::Date(chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert_eq!(
            mysql_value_to_value(
                mysql_async::Value::Time(true, 1, 2, 3, 4, 0),
                ColumnType::MYSQL_TYPE_TIME
            ),
            Value::String("-26:03:04.000000".into())
        );
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        let opts = Opts::from_url("mysql://monitor@127.0.0.1:1/metrics").unwrap();
        let err = match MySqlConnection::connect(opts).await {
            Ok(_) => panic!("connection to port 1 must fail"),
            Err(err) => err,
        };
        assert!(matches!(err, SqlMonError::Connection(_)));
    }
}
