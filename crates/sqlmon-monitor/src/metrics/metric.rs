//! Metric types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace used when no `metric-path` is configured
pub const DEFAULT_METRIC_PREFIX: &str = "Custom Metrics|SQLMonitor|";

/// Separator between metric path segments
pub const PATH_SEPARATOR: char = '|';

/// Wall-clock time to open the connection and select the catalog
pub const METRIC_CONNECTION_TIME: &str = "Connection Time (ms)";
/// Wall-clock time to run the query and read every row
pub const METRIC_EXECUTION_TIME: &str = "Execution Time (ms)";
/// Number of rows the query returned
pub const METRIC_ROWS_RETURNED: &str = "Rows Returned";

/// Normalize an operator-supplied prefix so it ends with the path separator.
///
/// `None` selects [`DEFAULT_METRIC_PREFIX`].
pub fn metric_prefix(metric_path: Option<&str>) -> String {
    match metric_path {
        Some(path) if path.ends_with(PATH_SEPARATOR) => path.to_string(),
        Some(path) => format!("{}{}", path, PATH_SEPARATOR),
        None => DEFAULT_METRIC_PREFIX.to_string(),
    }
}

/// How values reported within one interval combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregationType {
    Average,
    #[default]
    Observation,
    Sum,
}

impl AggregationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Average => "AVERAGE",
            Self::Observation => "OBSERVATION",
            Self::Sum => "SUM",
        }
    }
}

/// How a value is derived across time windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeRollupType {
    Average,
    #[default]
    Current,
    Sum,
}

impl TimeRollupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Average => "AVERAGE",
            Self::Current => "CURRENT",
            Self::Sum => "SUM",
        }
    }
}

/// How a value combines across reporting agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClusterRollupType {
    Individual,
    #[default]
    Collective,
}

impl ClusterRollupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "INDIVIDUAL",
            Self::Collective => "COLLECTIVE",
        }
    }
}

impl fmt::Display for AggregationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TimeRollupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ClusterRollupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregation and rollup settings attached to every emitted metric.
///
/// The default, observation/current/collective, is used for both the row
/// metrics and the summary metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricPolicy {
    pub aggregation: AggregationType,
    pub time_rollup: TimeRollupType,
    pub cluster_rollup: ClusterRollupType,
}

/// A single metric observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Full piped path, prefix included
    pub path: String,
    /// String form of the value; `None` for SQL NULL
    pub value: Option<String>,
    pub aggregation: AggregationType,
    pub time_rollup: TimeRollupType,
    pub cluster_rollup: ClusterRollupType,
}

impl Metric {
    /// Create a metric with the given policy
    pub fn new(path: impl Into<String>, value: Option<String>, policy: MetricPolicy) -> Self {
        Self {
            path: path.into(),
            value,
            aggregation: policy.aggregation,
            time_rollup: policy.time_rollup,
            cluster_rollup: policy.cluster_rollup,
        }
    }

    /// The policy this metric was emitted with
    pub fn policy(&self) -> MetricPolicy {
        MetricPolicy {
            aggregation: self.aggregation,
            time_rollup: self.time_rollup,
            cluster_rollup: self.cluster_rollup,
        }
    }

    /// Value as written to text sinks; NULL becomes the empty string
    pub fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.path, self.value_str())
    }
}
