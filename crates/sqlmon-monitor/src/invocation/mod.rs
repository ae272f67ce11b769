//! Monitor invocation
//!
//! Provides parameter validation, the result-set translator and the
//! lifecycle that ties a single scheduled run together.

mod error;
mod monitor;
mod params;
mod translator;


pub use error::*;
pub use monitor::*;
pub use params::*;
pub use translator::*;
