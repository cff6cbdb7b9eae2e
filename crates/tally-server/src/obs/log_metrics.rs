//! Counts log events per level and module.

use std::fmt;

use tally_core::{Metrics, MetricsRegistry};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Feeds `logger_logs_total{level,module}` for every event and
/// `logger_errors_total{error_type,module}` for error events.
///
/// `module` is taken from an event field of that name, else the event target.
pub struct LogMetricsLayer {
    metrics: Metrics,
}

impl LogMetricsLayer {
    pub fn new(registry: &MetricsRegistry) -> Self {
        Self {
            metrics: registry.namespaced("logger"),
        }
    }
}

#[derive(Default)]
struct LogFields {
    module: Option<String>,
    error_type: Option<String>,
}

impl LogFields {
    fn slot(&mut self, field: &Field) -> Option<&mut Option<String>> {
        match field.name() {
            "module" => Some(&mut self.module),
            "error_type" => Some(&mut self.error_type),
            _ => None,
        }
    }
}

impl Visit for LogFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        if let Some(slot) = self.slot(field) {
            *slot = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if let Some(slot) = self.slot(field) {
            *slot = Some(format!("{value:?}"));
        }
    }
}

fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        _ => "error",
    }
}

impl<S: Subscriber> Layer<S> for LogMetricsLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut fields = LogFields::default();
        event.record(&mut fields);

        let module = fields.module.as_deref().unwrap_or(meta.target());
        self.metrics.inc(
            "logs_total",
            &[("level", level_name(meta.level())), ("module", module)],
        );

        if *meta.level() == Level::ERROR {
            let error_type = fields.error_type.as_deref().unwrap_or("unknown");
            self.metrics.inc(
                "errors_total",
                &[("error_type", error_type), ("module", module)],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn counts_by_level_and_module() {
        let reg = MetricsRegistry::new();
        let subscriber = tracing_subscriber::registry().with(LogMetricsLayer::new(&reg));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(module = "http", "one");
            tracing::info!(module = "http", "two");
            tracing::error!(module = "db", error_type = "Timeout", "boom");
            tracing::warn!(target: "custom", "no module field");
        });

        let snap = reg.all_metrics();
        assert_eq!(snap.counters[r#"logger_logs_total{level="info",module="http"}"#], 2.0);
        assert_eq!(snap.counters[r#"logger_logs_total{level="error",module="db"}"#], 1.0);
        assert_eq!(snap.counters[r#"logger_errors_total{error_type="Timeout",module="db"}"#], 1.0);
        assert_eq!(snap.counters[r#"logger_logs_total{level="warn",module="custom"}"#], 1.0);
    }
}
