//! tally core: the in-process metrics store, its namespaced facade, the text
//! exposition renderer, and the error surface shared with the HTTP server.
//!
//! This crate carries no transport or runtime dependencies so the store can be
//! driven from request handlers, log layers, and tests alike.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Metric updates are total; the only fallible path is rendering, which
//! surfaces as `TallyError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod metrics;

/// Shared result type.
pub use error::{Result, TallyError};
pub use metrics::{
    LabelSet, MetricEvent, MetricKind, Metrics, MetricsRegistry, MetricsSnapshot, MetricsTimer,
    SubscriptionId,
};
