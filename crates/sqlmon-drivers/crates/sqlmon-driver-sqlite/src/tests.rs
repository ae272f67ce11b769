use super::*;
use sqlmon_core::{Connection, ConnectionConfig, DatabaseDriver, SqlMonError, Value};

mod url_tests {
    use super::*;

    #[test]
    fn test_memory_url() {
        assert_eq!(parse_sqlite_url("sqlite::memory:").unwrap(), ":memory:");
        assert_eq!(parse_sqlite_url("jdbc:sqlite::memory:").unwrap(), ":memory:");
    }

    #[test]
    fn test_path_urls() {
        assert_eq!(parse_sqlite_url("sqlite:/var/db/app.db").unwrap(), "/var/db/app.db");
        assert_eq!(parse_sqlite_url("sqlite:///var/db/app.db").unwrap(), "/var/db/app.db");
        assert_eq!(parse_sqlite_url("sqlite://app.db").unwrap(), "app.db");
        assert_eq!(parse_sqlite_url("jdbc:sqlite:app.db").unwrap(), "app.db");
    }

    #[test]
    fn test_query_string_becomes_uri() {
        assert_eq!(
            parse_sqlite_url("sqlite:///var/db/app.db?mode=ro").unwrap(),
            "file:/var/db/app.db?mode=ro"
        );
    }

    #[test]
    fn test_rejects_foreign_and_empty_urls() {
        assert!(matches!(
            parse_sqlite_url("postgres://h/db"),
            Err(SqlMonError::Configuration(_))
        ));
        assert!(matches!(
            parse_sqlite_url("sqlite:"),
            Err(SqlMonError::Configuration(_))
        ));
        assert!(matches!(
            parse_sqlite_url("sqlite://?mode=ro"),
            Err(SqlMonError::Configuration(_))
        ));
    }
}

mod connection_tests {
    use super::*;

    #[tokio::test]
    async fn test_query_reports_columns_and_values() {
        let conn = SqliteConnection::open(":memory:").expect("Failed to open in-memory db");

        let result = conn
            .query("SELECT 'db1' AS Name, 10 AS A, 2.5 AS B, NULL AS C")
            .await
            .expect("Failed to query");

        let names: Vec<_> = result.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Name", "A", "B", "C"]);
        assert_eq!(result.rows.len(), 1);

        let row = &result.rows[0];
        assert_eq!(row.get(0), Some(&Value::String("db1".into())));
        assert_eq!(row.get(1), Some(&Value::Int64(10)));
        assert_eq!(row.get(2), Some(&Value::Float64(2.5)));
        assert_eq!(row.get(3), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_empty_result_keeps_column_metadata() {
        let conn = SqliteConnection::open(":memory:").unwrap();
        let result = conn
            .query("SELECT 'x' AS Name, 1 AS A WHERE 1 = 0")
            .await
            .unwrap();

        assert_eq!(result.rows.len(), 0);
        assert_eq!(result.columns.len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_sql_is_query_error() {
        let conn = SqliteConnection::open(":memory:").unwrap();
        let err = conn.query("SELEC nonsense").await.unwrap_err();
        assert!(matches!(err, SqlMonError::Query(_)));
    }

    #[tokio::test]
    async fn test_catalog_switch() {
        let conn = SqliteConnection::open(":memory:").unwrap();
        assert!(conn.set_catalog("main").await.is_ok());
        assert!(matches!(
            conn.set_catalog("controller").await,
            Err(SqlMonError::NotSupported(_))
        ));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_blocks_queries() {
        let conn = SqliteConnection::open(":memory:").unwrap();
        assert!(!conn.is_closed());

        conn.close().await.unwrap();
        conn.close().await.unwrap();
        assert!(conn.is_closed());

        let err = conn.query("SELECT 1").await.unwrap_err();
        assert!(matches!(err, SqlMonError::Connection(_)));
    }

    #[test]
    fn test_missing_file_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let err = match SqliteConnection::open(path.to_str().unwrap()) {
            Ok(_) => panic!("missing database must not be created"),
            Err(err) => err,
        };
        assert!(matches!(err, SqlMonError::Connection(_)));
        assert!(!path.exists());
    }
}

mod driver_tests {
    use super::*;

    #[test]
    fn test_driver_identity() {
        let driver = SqliteDriver::new();
        assert_eq!(driver.id(), "sqlite");
        assert!(driver.answers_to("org.sqlite.JDBC"));
        assert!(driver.accepts_url("sqlite::memory:"));
        assert!(driver.accepts_url("jdbc:sqlite:/tmp/x.db"));
        assert!(!driver.accepts_url("mysql://localhost"));
    }

    #[tokio::test]
    async fn test_connect_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.db");
        {
            let setup = rusqlite::Connection::open(&path).unwrap();
            setup
                .execute_batch(
                    "CREATE TABLE stats (name TEXT, hits INTEGER);
                     INSERT INTO stats VALUES ('a', 1), ('b', 2);",
                )
                .unwrap();
        }

        let url = format!("sqlite:{}", path.display());
        let conn = SqliteDriver::new()
            .connect(&ConnectionConfig::new(&url))
            .await
            .expect("existing file opens");

        let result = conn.query("SELECT name, hits FROM stats ORDER BY name").await.unwrap();
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.columns[1].data_type, "INTEGER");
        conn.close().await.unwrap();
    }
}
