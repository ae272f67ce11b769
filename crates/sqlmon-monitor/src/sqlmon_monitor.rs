//! SQLMon Monitor - SQL result sets reported as metrics
//!
//! This crate provides the monitor an external scheduler invokes:
//! - Task parameter validation
//! - Field name cleaning and metric path composition
//! - Metric sinks for the agent text protocol and JSON lines
//! - The invocation lifecycle with timing and guaranteed cleanup

pub mod invocation;
pub mod metrics;

pub use invocation::*;
pub use metrics::*;
