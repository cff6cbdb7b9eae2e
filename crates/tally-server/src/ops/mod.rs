//! Operational HTTP endpoints.
//!
//! - `/api/health` : liveness
//! - `/metrics`    : Prometheus text format (path configurable)

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tally_core::error::TallyError;

use crate::app_state::AppState;
use crate::middleware::ApiError;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "✅ Server is healthy!")
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.registry().prometheus_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(module = "metrics", error = %e, "metrics render failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(CONTENT_TYPE, "text/plain; charset=utf-8")],
                format!("Failed to generate metrics: {e}"),
            )
                .into_response()
        }
    }
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError(TallyError::NotFound(format!("no route for {}", uri.path())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use tally_core::MetricsRegistry;

    use crate::config::AppConfig;

    #[tokio::test]
    async fn scrape_before_enable_is_500() {
        let state = AppState::new(AppConfig::default(), MetricsRegistry::new());
        let res = metrics(State(state)).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap_or_default();
        assert_eq!(&body[..], b"Failed to generate metrics: prometheus mode not enabled");
    }
}
