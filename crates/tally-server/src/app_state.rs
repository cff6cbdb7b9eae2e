//! Shared application state.
//!
//! Holds the one metrics registry for the process; handlers and middleware
//! reach it through here rather than through a global.

use std::sync::Arc;

use tally_core::{Metrics, MetricsRegistry};

use crate::config::AppConfig;
use crate::middleware::cors::CorsPolicy;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: AppConfig,
    registry: MetricsRegistry,
    cors: CorsPolicy,
    http_metrics: Metrics,
}

impl AppState {
    pub fn new(cfg: AppConfig, registry: MetricsRegistry) -> Self {
        let cors = CorsPolicy::from_config(&cfg);
        let http_metrics = registry.namespaced("http");
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                cors,
                http_metrics,
            }),
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> &MetricsRegistry {
        &self.inner.registry
    }

    pub fn cors(&self) -> &CorsPolicy {
        &self.inner.cors
    }

    /// Facade for request-level metrics (`http_*`).
    pub fn http_metrics(&self) -> &Metrics {
        &self.inner.http_metrics
    }
}
