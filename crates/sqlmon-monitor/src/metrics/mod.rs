//! Metric model and emission
//!
//! Provides the metric types reported to a monitoring backend, the field name
//! cleaner applied to path segments, and the sinks metrics are written to.

mod cleaner;
mod metric;
mod sink;

#[cfg(test)]
mod tests;

pub use cleaner::*;
pub use metric::*;
pub use sink::*;
