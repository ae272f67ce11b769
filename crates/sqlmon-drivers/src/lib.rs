//! SQLMon Drivers - Database driver implementations
//!
//! This crate bundles the concrete drivers behind cargo features and provides
//! the `DriverRegistry` the monitor resolves drivers through.

#[cfg(feature = "mysql")]
pub use sqlmon_driver_mysql as mysql;
#[cfg(feature = "postgres")]
pub use sqlmon_driver_postgres as postgres;
#[cfg(feature = "sqlite")]
pub use sqlmon_driver_sqlite as sqlite;

mod registry;
mod runtime;

pub use registry::DriverRegistry;
pub use runtime::block_on_tokio;

/// Re-export commonly used types from sqlmon-core
pub use sqlmon_core::{
    ColumnMeta, Connection, ConnectionConfig, DatabaseDriver, QueryResult, Result, Row,
    SqlMonError, Value,
};
