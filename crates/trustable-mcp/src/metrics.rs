use std::collections::BTreeMap;

use parking_lot::Mutex;

// Calls to unlisted tool names share one label.
const UNKNOWN_TOOL_LABEL: &str = "unknown";

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ToolMetric {
    pub ok: u64,
    pub err: u64,
    pub total_latency_ms: f64,
    pub max_latency_ms: f64,
}

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    tools: Mutex<BTreeMap<String, ToolMetric>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tool(&self, tool: &str, known: bool, latency_ms: f64, is_error: bool) {
        let label = if known { tool } else { UNKNOWN_TOOL_LABEL };
        let mut locked = self.tools.lock();
        let metric = locked.entry(label.to_string()).or_default();
        if is_error {
            metric.err = metric.err.saturating_add(1);
        } else {
            metric.ok = metric.ok.saturating_add(1);
        }
        metric.total_latency_ms += latency_ms;
        metric.max_latency_ms = metric.max_latency_ms.max(latency_ms);
    }

    pub fn tool(&self, tool: &str) -> Option<ToolMetric> {
        self.tools.lock().get(tool).copied()
    }

    /// Prometheus text exposition.
    pub fn render_text(&self) -> String {
        let mut lines = vec![
            "# TYPE trustable_mcp_tool_calls_total counter".to_string(),
            "# TYPE trustable_mcp_tool_latency_ms_sum counter".to_string(),
            "# TYPE trustable_mcp_tool_latency_ms_max gauge".to_string(),
        ];
        for (tool, m) in self.tools.lock().iter() {
            lines.push(format!(
                "trustable_mcp_tool_calls_total{{tool=\"{tool}\",status=\"ok\"}} {}",
                m.ok
            ));
            lines.push(format!(
                "trustable_mcp_tool_calls_total{{tool=\"{tool}\",status=\"error\"}} {}",
                m.err
            ));
            lines.push(format!(
                "trustable_mcp_tool_latency_ms_sum{{tool=\"{tool}\"}} {:.3}",
                m.total_latency_ms
            ));
            lines.push(format!(
                "trustable_mcp_tool_latency_ms_max{{tool=\"{tool}\"}} {:.3}",
                m.max_latency_ms
            ));
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_ok_and_error_per_tool() {
        let metrics = MetricsRegistry::new();
        metrics.record_tool("check_ai_visibility", true, 1.5, false);
        metrics.record_tool("check_ai_visibility", true, 0.5, true);
        let m = metrics.tool("check_ai_visibility").expect("metric");
        assert_eq!((m.ok, m.err), (1, 1));
        assert!((m.total_latency_ms - 2.0).abs() < f64::EPSILON);
        assert!((m.max_latency_ms - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_tools_share_a_label() {
        let metrics = MetricsRegistry::new();
        metrics.record_tool("foo", false, 0.1, false);
        metrics.record_tool("bar\"}", false, 0.1, false);
        assert_eq!(metrics.tool(UNKNOWN_TOOL_LABEL).map(|m| m.ok), Some(2));
        let text = metrics.render_text();
        assert!(text.contains("trustable_mcp_tool_calls_total{tool=\"unknown\",status=\"ok\"} 2"));
        assert!(!text.contains("bar"));
    }
}
