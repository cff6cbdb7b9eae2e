//! The process-wide metrics store.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::{Mutex, ReentrantMutex};
use serde::Serialize;

use crate::error::{Result, TallyError};

use super::event::{EventBuffer, MetricEvent, MetricKind};
use super::exposition;
use super::labels::LabelSet;
use super::namespace::Metrics;

/// Synchronous observer called after every update, outside the store lock.
/// Observers see updates in the order they were applied.
pub type Observer = Arc<dyn Fn(&MetricEvent) + Send + Sync>;

/// Handle returned by [`MetricsRegistry::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Metric identity: name plus canonical label set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct MetricKey {
    pub(crate) name: String,
    pub(crate) labels: LabelSet,
}

impl MetricKey {
    pub(crate) fn new(name: impl Into<String>, labels: LabelSet) -> Self {
        Self {
            name: name.into(),
            labels,
        }
    }
}

/// `name` or `name{k="v",...}`; used as the snapshot key.
impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.labels)
    }
}

/// Plain copy of the three stores, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub counters: IndexMap<String, f64>,
    pub gauges: IndexMap<String, f64>,
    pub histograms: IndexMap<String, Vec<f64>>,
}

impl MetricsSnapshot {
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.gauges.is_empty() && self.histograms.is_empty()
    }
}

#[derive(Default)]
struct RegistryState {
    counters: IndexMap<MetricKey, f64>,
    gauges: IndexMap<MetricKey, f64>,
    histograms: IndexMap<MetricKey, Vec<f64>>,
    events: EventBuffer,
}

struct RegistryInner {
    /// Held from mutation through observer delivery. Reentrant so observers
    /// may update the registry from the delivering thread.
    dispatch: ReentrantMutex<()>,
    state: Mutex<RegistryState>,
    observers: DashMap<u64, Observer>,
    observer_seq: AtomicU64,
    prometheus_mode: AtomicBool,
}

/// Shared metrics store. Cloning is cheap and every clone sees the same data.
#[derive(Clone)]
pub struct MetricsRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                dispatch: ReentrantMutex::new(()),
                state: Mutex::new(RegistryState::default()),
                observers: DashMap::new(),
                observer_seq: AtomicU64::new(1),
                prometheus_mode: AtomicBool::new(false),
            }),
        }
    }

    /// Facade that prefixes every metric name with `"<namespace>_"`.
    pub fn namespaced(&self, namespace: impl Into<String>) -> Metrics {
        Metrics::new(self.clone(), namespace)
    }

    /// Add `delta` (negative values included) and return the new total.
    pub fn increment_counter(&self, name: &str, delta: f64, labels: &[(&str, &str)]) -> f64 {
        self.add_counter(MetricKey::new(name, LabelSet::new(labels)), delta)
    }

    /// Increment by 1.
    pub fn inc(&self, name: &str, labels: &[(&str, &str)]) -> f64 {
        self.increment_counter(name, 1.0, labels)
    }

    /// Overwrite the gauge and return `value`.
    pub fn set_gauge(&self, name: &str, value: f64, labels: &[(&str, &str)]) -> f64 {
        self.put_gauge(MetricKey::new(name, LabelSet::new(labels)), value)
    }

    /// Append one observation and return the full series.
    pub fn observe_histogram(&self, name: &str, value: f64, labels: &[(&str, &str)]) -> Vec<f64> {
        self.push_histogram(MetricKey::new(name, LabelSet::new(labels)), value)
    }

    /// Append one observation without copying the series back out.
    pub fn observe(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        self.append_histogram(MetricKey::new(name, LabelSet::new(labels)), value, false);
    }

    /// Observe the milliseconds elapsed since `start`.
    pub fn record_timing(&self, name: &str, start: Instant, labels: &[(&str, &str)]) -> Vec<f64> {
        self.observe_histogram(name, elapsed_ms(start), labels)
    }

    /// Mutate under the state lock, then deliver the event while still
    /// holding the dispatch lock so delivery order matches mutation order.
    fn apply<R>(&self, update: impl FnOnce(&mut RegistryState) -> (R, MetricEvent)) -> R {
        let _dispatch = self.inner.dispatch.lock();
        let (out, event) = {
            let mut st = self.inner.state.lock();
            let (out, event) = update(&mut *st);
            st.events.push(event.clone());
            (out, event)
        };
        self.notify(&event);
        out
    }

    pub(crate) fn add_counter(&self, key: MetricKey, delta: f64) -> f64 {
        self.apply(|st| {
            let slot = st.counters.entry(key.clone()).or_insert(0.0);
            *slot += delta;
            let total = *slot;
            (total, MetricEvent::new(MetricKind::Counter, key.name, key.labels, total))
        })
    }

    pub(crate) fn put_gauge(&self, key: MetricKey, value: f64) -> f64 {
        self.apply(|st| {
            st.gauges.insert(key.clone(), value);
            (value, MetricEvent::new(MetricKind::Gauge, key.name, key.labels, value))
        })
    }

    pub(crate) fn push_histogram(&self, key: MetricKey, value: f64) -> Vec<f64> {
        self.append_histogram(key, value, true)
    }

    /// Returns the updated series when `copy_series` is set, else an empty vec.
    pub(crate) fn append_histogram(&self, key: MetricKey, value: f64, copy_series: bool) -> Vec<f64> {
        self.apply(|st| {
            let slot = st.histograms.entry(key.clone()).or_default();
            slot.push(value);
            let series = if copy_series { slot.clone() } else { Vec::new() };
            (series, MetricEvent::new(MetricKind::Histogram, key.name, key.labels, value))
        })
    }

    /// Allow [`prometheus_metrics`](Self::prometheus_metrics) to render. Idempotent.
    pub fn enable_prometheus_mode(&self) -> &Self {
        if !self.inner.prometheus_mode.swap(true, Ordering::AcqRel) {
            tracing::debug!("prometheus exposition enabled");
        }
        self
    }

    pub fn is_prometheus_mode(&self) -> bool {
        self.inner.prometheus_mode.load(Ordering::Acquire)
    }

    /// Render every stored metric in the text exposition format.
    ///
    /// Fails with [`TallyError::ExpositionDisabled`] until
    /// [`enable_prometheus_mode`](Self::enable_prometheus_mode) has been called.
    pub fn prometheus_metrics(&self) -> Result<String> {
        if !self.is_prometheus_mode() {
            return Err(TallyError::ExpositionDisabled);
        }
        let st = self.inner.state.lock();
        exposition::render(&st.counters, &st.gauges, &st.histograms)
    }

    pub fn all_metrics(&self) -> MetricsSnapshot {
        let st = self.inner.state.lock();
        MetricsSnapshot {
            counters: st.counters.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            gauges: st.gauges.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            histograms: st
                .histograms
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    /// Drop every metric and buffered event. Meant for test isolation.
    pub fn reset_metrics(&self) {
        let mut st = self.inner.state.lock();
        st.counters.clear();
        st.gauges.clear();
        st.histograms.clear();
        st.events.clear();
    }

    /// Register an observer. It runs synchronously on the updating thread
    /// after the store lock is released, so it may call back into the registry.
    /// Deliveries are serialized: a slow observer stalls every updater.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&MetricEvent) + Send + Sync + 'static,
    {
        let id = self.inner.observer_seq.fetch_add(1, Ordering::Relaxed);
        self.inner.observers.insert(id, Arc::new(observer));
        SubscriptionId(id)
    }

    /// Returns `false` when the id was never registered or already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.observers.remove(&id.0).is_some()
    }

    pub fn recent_events(&self) -> Vec<MetricEvent> {
        self.inner.state.lock().events.snapshot()
    }

    pub fn event_buffer_len(&self) -> usize {
        self.inner.state.lock().events.len()
    }

    fn notify(&self, event: &MetricEvent) {
        if self.inner.observers.is_empty() {
            return;
        }
        // Clone out so no shard lock is held while observers run.
        let observers: Vec<Observer> = self
            .inner
            .observers
            .iter()
            .map(|e| Arc::clone(e.value()))
            .collect();
        for observer in observers {
            observer(event);
        }
    }
}

pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_returns_running_total() {
        let reg = MetricsRegistry::new();
        assert_eq!(reg.increment_counter("x", 2.0, &[]), 2.0);
        assert_eq!(reg.increment_counter("x", -0.5, &[]), 1.5);
        assert_eq!(reg.inc("x", &[]), 2.5);
        assert_eq!(reg.all_metrics().counters["x"], 2.5);
    }

    #[test]
    fn histogram_returns_full_series() {
        let reg = MetricsRegistry::new();
        reg.observe_histogram("h", 1.0, &[("a", "1")]);
        let series = reg.observe_histogram("h", 4.0, &[("a", "1")]);
        assert_eq!(series, vec![1.0, 4.0]);
        assert_eq!(reg.all_metrics().histograms[r#"h{a="1"}"#], vec![1.0, 4.0]);
    }

    #[test]
    fn observer_may_reenter_the_registry() {
        let reg = MetricsRegistry::new();
        let inner = reg.clone();
        reg.subscribe(move |ev| {
            if ev.name == "outer" {
                inner.inc("observed", &[]);
            }
        });
        reg.inc("outer", &[]);
        assert_eq!(reg.all_metrics().counters["observed"], 1.0);
    }
}
