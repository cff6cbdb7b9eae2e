//! Request logger.
//!
//! Every request feeds `http_requests_total` and `http_request_duration_ms`.
//! Only responses with status >= 400 are logged: a short line in development,
//! combined-log style elsewhere.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app_state::AppState;

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

pub async fn http_logger(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let version = req.version();
    let referrer = header_str(req.headers(), header::REFERER);
    let user_agent = header_str(req.headers(), header::USER_AGENT);
    let start = Instant::now();

    let res = next.run(req).await;

    let status = res.status();
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    let http = state.http_metrics();
    http.inc(
        "requests_total",
        &[("method", method.as_str()), ("status", status.as_str())],
    );
    http.observe("request_duration_ms", latency_ms, &[("method", method.as_str())]);

    if status.as_u16() < 400 {
        return res;
    }

    let length = header_str(res.headers(), header::CONTENT_LENGTH);
    if state.cfg().is_development() {
        tracing::info!(
            module = "http",
            status = status.as_u16(),
            "{} {} {} {:.3} ms - {}",
            method,
            uri,
            status.as_u16(),
            latency_ms,
            length
        );
    } else {
        tracing::info!(
            module = "http",
            status = status.as_u16(),
            latency_ms,
            "\"{} {} {:?}\" {} {} \"{}\" \"{}\"",
            method,
            uri,
            version,
            status.as_u16(),
            length,
            referrer,
            user_agent
        );
    }
    res
}
