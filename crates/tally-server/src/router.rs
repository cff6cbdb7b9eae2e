//! Axum router wiring.

use axum::{middleware, routing::get, Router};

use crate::app_state::AppState;
use crate::middleware::{cors, error, http_log};
use crate::ops;

pub const HEALTH_PATH: &str = "/api/health";

/// Build the app. Mounting the scrape route enables exposition on the registry.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new().route(HEALTH_PATH, get(ops::health));

    let metrics_cfg = &state.cfg().metrics;
    if metrics_cfg.enabled {
        state.registry().enable_prometheus_mode();
        router = router.route(&metrics_cfg.path, get(ops::metrics));
    }

    router
        .fallback(ops::not_found)
        .layer(state.cors().layer())
        .layer(middleware::from_fn_with_state(state.clone(), cors::cors_guard))
        .layer(middleware::from_fn(error::error_handler))
        .layer(middleware::from_fn_with_state(state.clone(), http_log::http_logger))
        .with_state(state)
}
