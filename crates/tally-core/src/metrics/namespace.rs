//! Per-subsystem facade over the shared registry.

use std::sync::Arc;
use std::time::Instant;

use crate::error::Result;

use super::labels::LabelSet;
use super::registry::{elapsed_ms, MetricKey, MetricsRegistry, MetricsSnapshot};

/// Prefixes every metric name with `"<namespace>_"` before delegating to the
/// registry. Facades built from the same namespace address the same metrics;
/// different namespaces never collide.
///
/// Base labels set through [`with_labels`](Self::with_labels) are merged into
/// every update, with per-call labels taking precedence.
#[derive(Clone)]
pub struct Metrics {
    registry: MetricsRegistry,
    namespace: Arc<str>,
    base_labels: LabelSet,
}

impl Metrics {
    pub fn new(registry: MetricsRegistry, namespace: impl Into<String>) -> Self {
        Self {
            registry,
            namespace: Arc::from(namespace.into()),
            base_labels: LabelSet::default(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }

    /// Same namespace, with `labels` added to the base label set.
    pub fn with_labels(&self, labels: &[(&str, &str)]) -> Self {
        Self {
            registry: self.registry.clone(),
            namespace: Arc::clone(&self.namespace),
            base_labels: self.base_labels.merged(labels),
        }
    }

    fn key(&self, metric: &str, labels: &[(&str, &str)]) -> MetricKey {
        MetricKey::new(
            format!("{}_{}", self.namespace, metric),
            self.base_labels.merged(labels),
        )
    }

    pub fn increment_counter(&self, metric: &str, delta: f64, labels: &[(&str, &str)]) -> f64 {
        self.registry.add_counter(self.key(metric, labels), delta)
    }

    pub fn inc(&self, metric: &str, labels: &[(&str, &str)]) -> f64 {
        self.increment_counter(metric, 1.0, labels)
    }

    pub fn set_gauge(&self, metric: &str, value: f64, labels: &[(&str, &str)]) -> f64 {
        self.registry.put_gauge(self.key(metric, labels), value)
    }

    pub fn observe_histogram(&self, metric: &str, value: f64, labels: &[(&str, &str)]) -> Vec<f64> {
        self.registry.push_histogram(self.key(metric, labels), value)
    }

    /// Like [`observe_histogram`](Self::observe_histogram) without returning the series.
    pub fn observe(&self, metric: &str, value: f64, labels: &[(&str, &str)]) {
        self.registry.append_histogram(self.key(metric, labels), value, false);
    }

    pub fn record_timing(&self, metric: &str, start: Instant, labels: &[(&str, &str)]) -> Vec<f64> {
        self.observe_histogram(metric, elapsed_ms(start), labels)
    }

    /// Start timing `metric`; the histogram is fed when the timer is stopped.
    pub fn start_timer(&self, metric: &str) -> MetricsTimer {
        MetricsTimer {
            metrics: self.clone(),
            metric: metric.to_string(),
            start: Instant::now(),
        }
    }

    pub fn all_metrics(&self) -> MetricsSnapshot {
        self.registry.all_metrics()
    }

    pub fn enable_prometheus_mode(&self) -> &Self {
        self.registry.enable_prometheus_mode();
        self
    }

    pub fn prometheus_metrics(&self) -> Result<String> {
        self.registry.prometheus_metrics()
    }
}

/// Running timer from [`Metrics::start_timer`].
#[must_use = "a timer records nothing until stopped"]
pub struct MetricsTimer {
    metrics: Metrics,
    metric: String,
    start: Instant,
}

impl MetricsTimer {
    /// Observe the elapsed milliseconds and return them.
    pub fn stop(self, labels: &[(&str, &str)]) -> f64 {
        let ms = elapsed_ms(self.start);
        self.metrics.observe(&self.metric, ms, labels);
        ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_labels_are_overridden_per_call() {
        let reg = MetricsRegistry::new();
        let m = reg.namespaced("db").with_labels(&[("module", "db"), ("pool", "main")]);
        m.inc("queries", &[("pool", "replica")]);
        let snap = reg.all_metrics();
        assert_eq!(snap.counters[r#"db_queries{module="db",pool="replica"}"#], 1.0);
    }

    #[test]
    fn timer_feeds_histogram() {
        let reg = MetricsRegistry::new();
        let m = reg.namespaced("job");
        let ms = m.start_timer("run_ms").stop(&[("kind", "sync")]);
        assert!(ms >= 0.0);
        let snap = reg.all_metrics();
        assert_eq!(snap.histograms[r#"job_run_ms{kind="sync"}"#].len(), 1);
    }
}
