use super::*;
use clap::Parser;
use pretty_assertions::assert_eq;

mod parse_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_task_flags() {
        let cli = Cli::try_parse_from([
            "sqlmon",
            "--url",
            "jdbc:mysql://localhost:3388",
            "--sql",
            "SELECT 1",
            "--driver-class",
            "com.mysql.jdbc.Driver",
            "--database",
            "controller",
            "--metric-path",
            "Server|Component:SqlMonitor",
            "--clean-field-names",
            "false",
        ])
        .unwrap();

        let params = cli.task_parameters().unwrap();
        assert_eq!(params["url"], "jdbc:mysql://localhost:3388");
        assert_eq!(params["driver-class"], "com.mysql.jdbc.Driver");
        assert_eq!(params["database"], "controller");
        assert_eq!(params["metric-path"], "Server|Component:SqlMonitor");
        assert_eq!(params["clean-field-names"], "false");
        assert!(!params.contains_key("password"));
    }

    #[test]
    fn test_output_and_logging_options() {
        let cli = Cli::try_parse_from([
            "sqlmon",
            "--format",
            "json",
            "--log-format",
            "json",
            "-v",
            "--log-dir",
            "/var/log/sqlmon",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        let logging = cli.logging_config();
        assert_eq!(logging.format, LogFormat::Json);
        assert_eq!(logging.default_filter, "debug");
        assert_eq!(logging.log_dir, Some(PathBuf::from("/var/log/sqlmon")));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["sqlmon"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Agent);
        assert_eq!(cli.log_format, LogFormat::Pretty);
        assert!(!cli.list_drivers);
        assert!(cli.logging_config().default_filter.starts_with("warn,"));
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["sqlmon", "--format", "xml"]).is_err());
    }
}

mod config_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_parse_task_arguments() {
        let params = config_file::parse_task_arguments(
            r#"
            [task-arguments]
            url = "sqlite::memory:"
            sql = "SELECT 'a', 1"
            clean-field-names = false
            port-hint = 3388
            "#,
        )
        .unwrap();

        assert_eq!(params["url"], "sqlite::memory:");
        assert_eq!(params["clean-field-names"], "false");
        assert_eq!(params["port-hint"], "3388");
    }

    #[test]
    fn test_missing_table_is_empty() {
        let params = config_file::parse_task_arguments("").unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn test_nested_values_are_rejected() {
        let err = config_file::parse_task_arguments(
            r#"
            [task-arguments]
            sql = ["SELECT 1"]
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("sql"));
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[task-arguments]\nurl = \"sqlite::memory:\"\nsql = \"SELECT 1\"\nmetric-path = \"From|File\""
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let cli = Cli::try_parse_from([
            "sqlmon",
            "--config",
            path.as_str(),
            "--metric-path",
            "From|Flag",
        ])
        .unwrap();

        let params = cli.task_parameters().unwrap();
        assert_eq!(params["url"], "sqlite::memory:");
        assert_eq!(params["sql"], "SELECT 1");
        assert_eq!(params["metric-path"], "From|Flag");
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let cli = Cli::try_parse_from([
            "sqlmon",
            "--config",
            missing.to_str().unwrap(),
        ])
        .unwrap();

        assert!(cli.task_parameters().is_err());
    }
}

mod driver_listing_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_driver_table_lists_aliases() {
        let rendered = driver_table(&DriverRegistry::with_defaults()).to_string();
        assert!(rendered.contains("sqlite"));
        assert!(rendered.contains("org.postgresql.Driver"));
        assert!(rendered.contains("com.mysql.cj.jdbc.Driver"));
    }
}
