//! Logging setup for the `sqlmon` binary
//!
//! Metrics own stdout, so every log layer writes to stderr or a file:
//! - Console output, pretty or JSON
//! - Optional daily-rolling JSON files
//! - `RUST_LOG` takes precedence over the built-in filter

use clap::ValueEnum;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Console log format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Directory for rolling JSON log files, if any
    pub log_dir: Option<PathBuf>,
    /// Default filter when `RUST_LOG` is unset
    pub default_filter: String,
}

impl LoggingConfig {
    pub fn new(format: LogFormat, verbose: bool, log_dir: Option<PathBuf>) -> Self {
        let default_filter = if verbose {
            "debug"
        } else {
            "warn,sqlmon=info,sqlmon_monitor=info,sqlmon_drivers=info"
        };
        Self {
            format,
            log_dir,
            default_filter: default_filter.to_string(),
        }
    }
}

/// Initialize the logging system.
///
/// The returned guard flushes the file writer when dropped and must be held
/// until the process exits.
pub fn init(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let mut layers = Vec::new();

    let console_layer = match config.format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(env_filter.clone())
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .with_filter(env_filter.clone())
            .boxed(),
    };
    layers.push(console_layer);

    let mut guard = None;
    if let Some(log_dir) = &config.log_dir {
        std::fs::create_dir_all(log_dir)?;

        let file_appender = tracing_appender::rolling::daily(log_dir, "sqlmon.log");
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker_guard);

        let json_layer = fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(non_blocking)
            .with_filter(env_filter)
            .boxed();
        layers.push(json_layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    tracing::debug!(
        log_dir = ?config.log_dir,
        format = ?config.format,
        "logging initialized"
    );

    Ok(guard)
}
