//! In-process metrics: counters, gauges and raw-observation histograms keyed
//! by `(name, labels)`, a namespaced facade for subsystems, and a renderer for
//! the Prometheus text exposition format.
//!
//! One `MetricsRegistry` is built at startup and handed (by clone) to every
//! facade and to the scrape handler. All state sits behind a single mutex so
//! each update is atomic on a multi-threaded runtime.

mod event;
mod exposition;
mod labels;
mod namespace;
mod registry;

pub use event::{MetricEvent, MetricKind, EVENT_BUFFER_CAPACITY, EVENT_BUFFER_RETAIN};
pub use labels::LabelSet;
pub use namespace::{Metrics, MetricsTimer};
pub use registry::{MetricsRegistry, MetricsSnapshot, Observer, SubscriptionId};
