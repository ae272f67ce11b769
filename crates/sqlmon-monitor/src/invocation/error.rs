//! Invocation error types

use sqlmon_core::SqlMonError;
use std::fmt;
use thiserror::Error;

/// Lifecycle states of a single invocation, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationState {
    Idle,
    ParamsValidated,
    DriverLoaded,
    Connected,
    CatalogSet,
    QueryExecuting,
    RowsStreaming,
    SummaryEmitted,
    Closed,
}

impl InvocationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ParamsValidated => "params-validated",
            Self::DriverLoaded => "driver-loaded",
            Self::Connected => "connected",
            Self::CatalogSet => "catalog-set",
            Self::QueryExecuting => "query-executing",
            Self::RowsStreaming => "rows-streaming",
            Self::SummaryEmitted => "summary-emitted",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that end an invocation
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("required parameter not specified: {0}")]
    MissingParameter(&'static str),

    #[error("unable to load driver '{driver}': {source}")]
    DriverLoad {
        driver: String,
        #[source]
        source: SqlMonError,
    },

    #[error("connection failed: {0}")]
    Connection(#[source] SqlMonError),

    #[error("unable to change catalog to '{catalog}': {source}")]
    Catalog {
        catalog: String,
        #[source]
        source: SqlMonError,
    },

    #[error("query failed: {0}")]
    Query(#[source] SqlMonError),

    /// Releasing the connection failed. Logged, never returned from a run.
    #[error("error cleaning up: {0}")]
    Cleanup(#[source] SqlMonError),
}

impl MonitorError {
    /// The lifecycle state the invocation failed to reach
    pub fn state(&self) -> InvocationState {
        match self {
            Self::MissingParameter(_) => InvocationState::ParamsValidated,
            Self::DriverLoad { .. } => InvocationState::DriverLoaded,
            Self::Connection(_) => InvocationState::Connected,
            Self::Catalog { .. } => InvocationState::CatalogSet,
            Self::Query(_) => InvocationState::QueryExecuting,
            Self::Cleanup(_) => InvocationState::Closed,
        }
    }
}
