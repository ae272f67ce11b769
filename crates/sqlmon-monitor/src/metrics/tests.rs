//! Unit tests for metric cleaning, paths and sinks

use super::*;
use pretty_assertions::assert_eq;

mod cleaner_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dashes_and_underscores_are_normalized() {
        // hyphen-minus, en dash, em dash, underscore
        assert_eq!(clean_field_name("-\u{2013}\u{2014}_x", true), "--- x");
        assert_eq!(clean_field_name("Node_Count", true), "Node Count");
        assert_eq!(clean_field_name("app\u{2010}server_01", true), "app-server 01");
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        for input in ["-\u{2013}\u{2014}_x", "a__b", "plain", "", "\u{2E3A}_\u{FE58}"] {
            let once = clean_field_name(input, true);
            assert_eq!(clean_field_name(&once, true), once);
        }
    }

    #[test]
    fn test_disabled_cleaning_is_identity() {
        for input in ["-\u{2013}\u{2014}_x", "Node_Count", "", "pipe|inside"] {
            assert_eq!(clean_field_name(input, false), input);
        }
    }

    #[test]
    fn test_pipe_is_not_escaped() {
        assert_eq!(clean_field_name("a|b_c", true), "a|b c");
    }
}

mod metric_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_metric_prefix_defaults_and_normalizes() {
        assert_eq!(metric_prefix(None), "Custom Metrics|SQLMonitor|");
        assert_eq!(
            metric_prefix(Some("Server|Component:SqlMonitor|SolarWinds")),
            "Server|Component:SqlMonitor|SolarWinds|"
        );
        assert_eq!(metric_prefix(Some("Custom|DB|")), "Custom|DB|");
    }

    #[test]
    fn test_default_policy() {
        let policy = MetricPolicy::default();
        assert_eq!(policy.aggregation, AggregationType::Observation);
        assert_eq!(policy.time_rollup, TimeRollupType::Current);
        assert_eq!(policy.cluster_rollup, ClusterRollupType::Collective);
    }

    #[test]
    fn test_null_value_renders_empty() {
        let metric = Metric::new("P|k|c", None, MetricPolicy::default());
        assert_eq!(metric.value_str(), "");
        assert_eq!(metric.to_string(), "P|k|c=");
        assert_eq!(metric.policy(), MetricPolicy::default());
    }
}

mod sink_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Metric {
        Metric::new("Custom Metrics|SQLMonitor|db1|A", Some("10".into()), MetricPolicy::default())
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let mut sink = MemorySink::new();
        sink.emit(sample());
        sink.emit(Metric::new("x|B", None, MetricPolicy::default()));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.metrics()[1].path, "x|B");
        assert!(sink.contains_suffix("|A"));
        assert_eq!(
            sink.find("Custom Metrics|SQLMonitor|db1|A").and_then(|m| m.value.clone()),
            Some("10".to_string())
        );
    }

    #[test]
    fn test_agent_line_format() {
        let mut sink = AgentLineSink::new(Vec::new());
        sink.emit(sample());
        sink.emit(Metric::new("P|k|empty", None, MetricPolicy::default()));
        sink.flush();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            output,
            "name=Custom Metrics|SQLMonitor|db1|A,aggregator=OBSERVATION,time-rollup=CURRENT,cluster-rollup=COLLECTIVE,value=10\n\
             name=P|k|empty,aggregator=OBSERVATION,time-rollup=CURRENT,cluster-rollup=COLLECTIVE,value=\n"
        );
    }

    #[test]
    fn test_json_lines_sink() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.emit(sample());
        sink.emit(Metric::new("P|k|empty", None, MetricPolicy::default()));

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["path"], "Custom Metrics|SQLMonitor|db1|A");
        assert_eq!(lines[0]["value"], "10");
        assert_eq!(lines[0]["aggregation"], "OBSERVATION");
        assert_eq!(lines[0]["cluster_rollup"], "COLLECTIVE");
        assert!(lines[1]["value"].is_null());
    }

    struct BrokenWriter;

    impl std::io::Write for BrokenWriter {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_write_failures_do_not_panic() {
        let mut agent = AgentLineSink::new(BrokenWriter);
        agent.emit(sample());
        agent.flush();

        let mut json = JsonLinesSink::new(BrokenWriter);
        json.emit(sample());
        json.flush();
    }

    #[test]
    fn test_boxed_sink_forwards() {
        let mut inner = MemorySink::new();
        {
            let mut boxed: Box<dyn MetricSink + '_> = Box::new(&mut inner);
            boxed.emit(sample());
        }
        assert_eq!(inner.len(), 1);
    }
}
