//! Origin allowlist.
//!
//! Requests without an `Origin` header pass through. Listed origins get CORS
//! headers with credentials; any other origin is rejected before routing.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::ORIGIN, request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tally_core::error::{Result, TallyError};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::app_state::AppState;
use crate::config::AppConfig;

use super::error::ApiError;

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origins: Arc<[String]>,
}

impl CorsPolicy {
    pub fn new(origins: Vec<String>) -> Self {
        Self {
            origins: origins.into(),
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(cfg.cors_origins())
    }

    pub fn origins(&self) -> &[String] {
        &self.origins
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == origin)
    }

    pub fn check(&self, origin: Option<&HeaderValue>) -> Result<()> {
        let Some(origin) = origin else { return Ok(()) };
        match origin.to_str() {
            Ok(o) if self.is_allowed(o) => Ok(()),
            _ => Err(TallyError::NotAllowed("Not allowed by CORS".into())),
        }
    }

    /// Header layer for allowed origins; answers preflight requests.
    pub fn layer(&self) -> CorsLayer {
        let policy = self.clone();
        CorsLayer::new()
            .allow_origin(AllowOrigin::predicate(
                move |origin: &HeaderValue, _parts: &Parts| policy.check(Some(origin)).is_ok(),
            ))
            .allow_credentials(true)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
    }
}

/// Reject disallowed origins before they reach a handler.
pub async fn cors_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Err(e) = state.cors().check(req.headers().get(ORIGIN)) {
        return ApiError::from(e).into_response();
    }
    next.run(req).await
}
