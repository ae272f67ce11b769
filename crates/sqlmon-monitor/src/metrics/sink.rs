//! Metric sinks

use std::io::Write;

use super::Metric;

/// Destination for emitted metrics.
///
/// Emission is infallible from the monitor's point of view: a sink that
/// cannot deliver a metric logs the failure and carries on.
pub trait MetricSink: Send {
    /// Deliver one metric
    fn emit(&mut self, metric: Metric);

    /// Push buffered output to its destination
    fn flush(&mut self) {}
}

impl<S: MetricSink + ?Sized> MetricSink for &mut S {
    fn emit(&mut self, metric: Metric) {
        (**self).emit(metric)
    }

    fn flush(&mut self) {
        (**self).flush()
    }
}

impl<S: MetricSink + ?Sized> MetricSink for Box<S> {
    fn emit(&mut self, metric: Metric) {
        (**self).emit(metric)
    }

    fn flush(&mut self) {
        (**self).flush()
    }
}

/// Collects metrics in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    metrics: Vec<Metric>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metrics in emission order
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// First metric emitted under `path`
    pub fn find(&self, path: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.path == path)
    }

    /// Whether any metric path ends with `suffix`
    pub fn contains_suffix(&self, suffix: &str) -> bool {
        self.metrics.iter().any(|m| m.path.ends_with(suffix))
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl MetricSink for MemorySink {
    fn emit(&mut self, metric: Metric) {
        tracing::debug!(path = %metric.path, value = ?metric.value, "metric collected");
        self.metrics.push(metric);
    }
}

/// Writes metrics in the machine agent text protocol, one per line:
///
/// ```text
/// name=<path>,aggregator=OBSERVATION,time-rollup=CURRENT,cluster-rollup=COLLECTIVE,value=<value>
/// ```
pub struct AgentLineSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> AgentLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Render a metric as one protocol line, without the trailing newline
    pub fn format_line(metric: &Metric) -> String {
        format!(
            "name={},aggregator={},time-rollup={},cluster-rollup={},value={}",
            metric.path,
            metric.aggregation,
            metric.time_rollup,
            metric.cluster_rollup,
            metric.value_str()
        )
    }
}

impl<W: Write + Send> MetricSink for AgentLineSink<W> {
    fn emit(&mut self, metric: Metric) {
        tracing::debug!(path = %metric.path, value = ?metric.value, "writing metric");
        if let Err(e) = writeln!(self.writer, "{}", Self::format_line(&metric)) {
            tracing::error!(path = %metric.path, error = %e, "failed to write metric");
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::error!(error = %e, "failed to flush metric output");
        }
    }
}

/// Writes each metric as a JSON object on its own line
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> MetricSink for JsonLinesSink<W> {
    fn emit(&mut self, metric: Metric) {
        tracing::debug!(path = %metric.path, value = ?metric.value, "writing metric");
        let written = serde_json::to_writer(&mut self.writer, &metric)
            .map_err(std::io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        if let Err(e) = written {
            tracing::error!(path = %metric.path, error = %e, "failed to write metric");
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::error!(error = %e, "failed to flush metric output");
        }
    }
}
