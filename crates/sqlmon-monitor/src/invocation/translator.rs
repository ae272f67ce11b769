//! Result set to metric translation

use sqlmon_core::{QueryResult, Value};

use super::MonitorConfig;
use crate::metrics::{
    METRIC_CONNECTION_TIME, METRIC_EXECUTION_TIME, METRIC_ROWS_RETURNED, Metric, MetricPolicy,
    MetricSink, PATH_SEPARATOR, clean_field_name,
};

/// Maps query results onto the metric namespace.
///
/// Column 1 of every row is the row key; each further column becomes the
/// metric `<prefix><key>|<column name>`. Path separators inside keys or
/// column names are passed through, so such rows can share a path.
#[derive(Debug, Clone)]
pub struct ResultTranslator {
    prefix: String,
    clean_field_names: bool,
    policy: MetricPolicy,
}

impl ResultTranslator {
    /// Create a translator for an already normalized prefix
    pub fn new(prefix: impl Into<String>, clean_field_names: bool) -> Self {
        Self {
            prefix: prefix.into(),
            clean_field_names,
            policy: MetricPolicy::default(),
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.metric_prefix.clone(), config.clean_field_names)
    }

    /// Emit `name` under the prefix
    pub fn emit(&self, sink: &mut dyn MetricSink, name: &str, value: Option<String>) {
        let path = format!("{}{}", self.prefix, name);
        sink.emit(Metric::new(path, value, self.policy));
    }

    pub fn emit_connection_time(&self, sink: &mut dyn MetricSink, elapsed_ms: u64) {
        self.emit(sink, METRIC_CONNECTION_TIME, Some(elapsed_ms.to_string()));
    }

    pub fn emit_execution_time(&self, sink: &mut dyn MetricSink, elapsed_ms: u64) {
        self.emit(sink, METRIC_EXECUTION_TIME, Some(elapsed_ms.to_string()));
    }

    pub fn emit_rows_returned(&self, sink: &mut dyn MetricSink, rows: u64) {
        self.emit(sink, METRIC_ROWS_RETURNED, Some(rows.to_string()));
    }

    /// Emit one metric per non-key column of every row.
    ///
    /// Returns the number of rows read. Column names are cleaned once, not
    /// per row.
    pub fn translate(&self, result: &QueryResult, sink: &mut dyn MetricSink) -> u64 {
        let columns: Vec<String> = result
            .columns
            .iter()
            .skip(1)
            .map(|col| clean_field_name(&col.name, self.clean_field_names))
            .collect();

        let mut row_count = 0u64;
        for row in &result.rows {
            let key = row
                .get(0)
                .and_then(Value::to_metric_string)
                .unwrap_or_default();
            let key = clean_field_name(&key, self.clean_field_names);

            for (offset, column) in columns.iter().enumerate() {
                let value = row.get(offset + 1).and_then(Value::to_metric_string);
                let name = format!("{}{}{}", key, PATH_SEPARATOR, column);
                self.emit(sink, &name, value);
            }

            row_count += 1;
        }

        row_count
    }
}
