//! SQLMon Core - Core abstractions shared by the monitor and its drivers
//!
//! This crate provides the fundamental traits and types that all other
//! SQLMon crates depend on. It defines:
//!
//! - `DatabaseDriver` - Trait for database driver implementations
//! - `Connection` - Trait for an open database connection
//! - `ConnectionConfig` - Everything a driver needs to open a connection
//! - Common types like `Value`, `Row`, `ColumnMeta` and `QueryResult`

mod connection;
mod driver;
mod error;
mod types;

pub use connection::*;
pub use driver::*;
pub use error::*;
pub use types::*;
