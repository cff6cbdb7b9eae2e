//! Metric update events and the bounded recent-events buffer.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use super::labels::LabelSet;

/// Hard cap on buffered events; exceeding it triggers a trim.
pub const EVENT_BUFFER_CAPACITY: usize = 10_000;
/// Events kept (most recent first) after a trim.
pub const EVENT_BUFFER_RETAIN: usize = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

/// Emitted on every update. `value` is the counter's new total, the gauge's
/// new value, or the single histogram observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricEvent {
    #[serde(rename = "type")]
    pub kind: MetricKind,
    pub name: String,
    pub value: f64,
    pub labels: LabelSet,
    pub timestamp_ms: u64,
}

impl MetricEvent {
    pub(crate) fn new(kind: MetricKind, name: String, labels: LabelSet, value: f64) -> Self {
        Self {
            kind,
            name,
            value,
            labels,
            timestamp_ms: now_ms(),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Lossy ring of recent events: once a push takes it past
/// `EVENT_BUFFER_CAPACITY`, everything but the newest `EVENT_BUFFER_RETAIN`
/// entries is dropped.
#[derive(Debug, Default)]
pub(crate) struct EventBuffer {
    events: VecDeque<MetricEvent>,
}

impl EventBuffer {
    pub(crate) fn push(&mut self, event: MetricEvent) {
        self.events.push_back(event);
        if self.events.len() > EVENT_BUFFER_CAPACITY {
            let excess = self.events.len() - EVENT_BUFFER_RETAIN;
            self.events.drain(..excess);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }

    pub(crate) fn clear(&mut self) {
        self.events.clear();
    }

    pub(crate) fn snapshot(&self) -> Vec<MetricEvent> {
        self.events.iter().cloned().collect()
    }
}
