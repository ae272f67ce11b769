//! Invocation lifecycle

use sqlmon_core::{Connection, DatabaseDriver};
use sqlmon_drivers::{DriverRegistry, block_on_tokio};
use std::sync::Arc;
use std::time::Instant;

use super::{InvocationState, MonitorConfig, MonitorError, ResultTranslator, TaskParameters};
use crate::metrics::MetricSink;

/// Result signal handed back to the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutput(String);

impl TaskOutput {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn success() -> Self {
        Self::new("Success")
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

fn enter(state: InvocationState) {
    tracing::debug!(state = %state, "invocation state");
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Runs a query and reports its result set as metrics.
///
/// Holds no per-invocation state: every run gets its own `MonitorConfig`
/// and connection, and the connection is closed before the run returns.
pub struct SqlMonitor {
    registry: DriverRegistry,
}

impl SqlMonitor {
    /// Create a monitor with every built-in driver registered
    pub fn new() -> Self {
        Self::with_registry(DriverRegistry::with_defaults())
    }

    pub fn with_registry(registry: DriverRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    /// Run one invocation, blocking the calling thread until it finishes.
    ///
    /// Must not be called from within an async context.
    pub fn execute_blocking(
        &self,
        params: &TaskParameters,
        sink: &mut dyn MetricSink,
    ) -> Option<TaskOutput> {
        block_on_tokio(self.execute(params, sink))
    }

    /// Run one invocation, logging any failure.
    ///
    /// Returns `None` when the invocation failed; no error reaches the caller.
    pub async fn execute(
        &self,
        params: &TaskParameters,
        sink: &mut dyn MetricSink,
    ) -> Option<TaskOutput> {
        tracing::info!("starting SQL monitor invocation");
        match self.run(params, sink).await {
            Ok(output) => {
                tracing::info!("query completed successfully");
                Some(output)
            }
            Err(e @ MonitorError::MissingParameter(_)) => {
                tracing::error!(error = %e, "required parameter not specified in task arguments");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, state = %e.state(), "SQL monitor invocation failed");
                None
            }
        }
    }

    /// Validate `params` and run one invocation
    pub async fn run(
        &self,
        params: &TaskParameters,
        sink: &mut dyn MetricSink,
    ) -> Result<TaskOutput, MonitorError> {
        enter(InvocationState::Idle);
        let config = MonitorConfig::from_params(params)?;
        self.run_config(&config, sink).await
    }

    /// Run one invocation with an already validated configuration
    #[tracing::instrument(skip_all, fields(url = %config.redacted_url()))]
    pub async fn run_config(
        &self,
        config: &MonitorConfig,
        sink: &mut dyn MetricSink,
    ) -> Result<TaskOutput, MonitorError> {
        enter(InvocationState::ParamsValidated);
        let result = self.connect_and_report(config, sink).await;
        sink.flush();
        enter(InvocationState::Closed);
        result
    }

    async fn connect_and_report(
        &self,
        config: &MonitorConfig,
        sink: &mut dyn MetricSink,
    ) -> Result<TaskOutput, MonitorError> {
        let translator = ResultTranslator::from_config(config);

        let loaded = match &config.driver_class {
            Some(name) => {
                let driver = self.registry.load(name).map_err(|source| {
                    MonitorError::DriverLoad {
                        driver: name.clone(),
                        source,
                    }
                })?;
                enter(InvocationState::DriverLoaded);
                Some(driver)
            }
            None => None,
        };

        tracing::info!(url = %config.redacted_url(), "opening connection");
        let start = Instant::now();
        let driver = self.resolve_driver(loaded, &config.url)?;
        let conn = driver
            .connect(&config.connection_config())
            .await
            .map_err(MonitorError::Connection)?;
        enter(InvocationState::Connected);

        let result = self
            .report(config, &translator, conn.as_ref(), start, sink)
            .await;

        tracing::info!("closing connection");
        if let Err(e) = conn.close().await {
            let e = MonitorError::Cleanup(e);
            tracing::warn!(error = %e, "error cleaning up");
        }

        result
    }

    /// Prefer an explicitly loaded driver when it handles the URL, otherwise
    /// fall back to whichever registered driver does.
    fn resolve_driver(
        &self,
        loaded: Option<Arc<dyn DatabaseDriver>>,
        url: &str,
    ) -> Result<Arc<dyn DatabaseDriver>, MonitorError> {
        match loaded {
            Some(driver) if driver.accepts_url(url) => Ok(driver),
            _ => self.registry.for_url(url).map_err(MonitorError::Connection),
        }
    }

    async fn report(
        &self,
        config: &MonitorConfig,
        translator: &ResultTranslator,
        conn: &dyn Connection,
        connect_start: Instant,
        sink: &mut dyn MetricSink,
    ) -> Result<TaskOutput, MonitorError> {
        if let Some(catalog) = &config.database {
            tracing::info!(catalog = %catalog, "changing catalog");
            conn.set_catalog(catalog)
                .await
                .map_err(|source| MonitorError::Catalog {
                    catalog: catalog.clone(),
                    source,
                })?;
            enter(InvocationState::CatalogSet);
        }
        let connection_ms = elapsed_ms(connect_start);
        translator.emit_connection_time(sink, connection_ms);
        tracing::debug!(connection_ms, "connection time");

        tracing::info!(sql = %config.sql, "executing query");
        enter(InvocationState::QueryExecuting);
        let start = Instant::now();
        let result = conn.query(&config.sql).await.map_err(MonitorError::Query)?;

        enter(InvocationState::RowsStreaming);
        let row_count = translator.translate(&result, sink);

        let execution_ms = elapsed_ms(start);
        translator.emit_execution_time(sink, execution_ms);
        translator.emit_rows_returned(sink, row_count);
        tracing::debug!(execution_ms, row_count, "query finished");
        enter(InvocationState::SummaryEmitted);

        Ok(TaskOutput::success())
    }
}

impl Default for SqlMonitor {
    fn default() -> Self {
        Self::new()
    }
}
