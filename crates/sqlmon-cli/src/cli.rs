//! `sqlmon` - run one SQL monitor invocation
//!
//! Metrics are written to stdout, logs to stderr. The exit status is 0 when
//! the invocation succeeded and 1 otherwise, so an external scheduler can
//! call this binary on its own interval.

mod config_file;
mod logging;

#[cfg(test)]
mod tests;

use clap::{Parser, ValueEnum};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use sqlmon_drivers::DriverRegistry;
use sqlmon_monitor::{
    AgentLineSink, JsonLinesSink, MetricSink, PARAM_CLEAN_FIELD_NAMES, PARAM_DATABASE,
    PARAM_DRIVER_CLASS, PARAM_METRIC_PATH, PARAM_PASSWORD, PARAM_SQL, PARAM_URL, PARAM_USERNAME,
    SqlMonitor, TaskParameters,
};
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use logging::{LogFormat, LoggingConfig};

/// Metric output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Machine agent text protocol, one `name=...,value=...` line per metric
    #[default]
    Agent,
    /// One JSON object per line
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "sqlmon")]
#[command(version, about = "Run a SQL query and report its result set as metrics", long_about = None)]
pub struct Cli {
    /// Database connection URL (a leading `jdbc:` is accepted)
    #[arg(long, env = "SQLMON_URL")]
    pub url: Option<String>,

    /// Query to execute; column 1 names the row, the rest become metrics
    #[arg(long, env = "SQLMON_SQL")]
    pub sql: Option<String>,

    /// Driver to load before connecting (id or legacy class name)
    #[arg(long = "driver-class", env = "SQLMON_DRIVER_CLASS")]
    pub driver_class: Option<String>,

    /// Database user
    #[arg(long, short = 'u', env = "SQLMON_USERNAME")]
    pub username: Option<String>,

    /// Database password
    #[arg(long, env = "SQLMON_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Catalog to select after connecting
    #[arg(long, env = "SQLMON_DATABASE")]
    pub database: Option<String>,

    /// Metric namespace prefix
    #[arg(long = "metric-path", env = "SQLMON_METRIC_PATH")]
    pub metric_path: Option<String>,

    /// Normalize dashes and underscores in metric paths ("true" enables)
    #[arg(long = "clean-field-names", env = "SQLMON_CLEAN_FIELD_NAMES")]
    pub clean_field_names: Option<String>,

    /// TOML file with a [task-arguments] table; flags override its values
    #[arg(long, short = 'c', env = "SQLMON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Metric output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Agent)]
    pub format: OutputFormat,

    /// Log format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Also write daily-rolling JSON logs to this directory
    #[arg(long, env = "SQLMON_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// List the registered drivers and exit
    #[arg(long)]
    pub list_drivers: bool,
}

impl Cli {
    /// Task parameters from the configuration file overlaid with flags
    pub fn task_parameters(&self) -> anyhow::Result<TaskParameters> {
        let mut params = match &self.config {
            Some(path) => config_file::load_task_arguments(path)?,
            None => TaskParameters::new(),
        };

        let flags = [
            (PARAM_URL, &self.url),
            (PARAM_SQL, &self.sql),
            (PARAM_DRIVER_CLASS, &self.driver_class),
            (PARAM_USERNAME, &self.username),
            (PARAM_PASSWORD, &self.password),
            (PARAM_DATABASE, &self.database),
            (PARAM_METRIC_PATH, &self.metric_path),
            (PARAM_CLEAN_FIELD_NAMES, &self.clean_field_names),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                params.insert(key.to_string(), value.clone());
            }
        }

        Ok(params)
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::new(self.log_format, self.verbose, self.log_dir.clone())
    }
}

fn metric_sink(format: OutputFormat) -> Box<dyn MetricSink> {
    let stdout = BufWriter::new(std::io::stdout());
    match format {
        OutputFormat::Agent => Box::new(AgentLineSink::new(stdout)),
        OutputFormat::Json => Box::new(JsonLinesSink::new(stdout)),
    }
}

fn driver_table(registry: &DriverRegistry) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Driver", "Name", "Aliases", "Connection string"]);

    for driver in registry.drivers() {
        table.add_row(vec![
            driver.id().to_string(),
            driver.display_name().to_string(),
            driver.aliases().join(", "),
            driver.connection_string_help().to_string(),
        ]);
    }
    table
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let monitor = SqlMonitor::new();

    if cli.list_drivers {
        println!("{}", driver_table(monitor.registry()));
        return Ok(ExitCode::SUCCESS);
    }

    let params = cli.task_parameters()?;
    let mut sink = metric_sink(cli.format);

    match monitor.execute_blocking(&params, sink.as_mut()) {
        Some(_) => Ok(ExitCode::SUCCESS),
        None => Ok(ExitCode::FAILURE),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match logging::init(&cli.logging_config()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "sqlmon failed");
            ExitCode::FAILURE
        }
    }
}
