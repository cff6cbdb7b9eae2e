//! Router-level tests: routes, CORS, error handler, request metrics.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use tally_core::MetricsRegistry;
use tally_server::{app_state::AppState, config, router};

fn app_with(yaml: &str) -> (Router, MetricsRegistry) {
    let cfg = config::load_from_str(yaml).unwrap();
    let registry = MetricsRegistry::new();
    let state = AppState::new(cfg, registry.clone());
    (router::build_router(state), registry)
}

fn app() -> (Router, MetricsRegistry) {
    app_with("version: 1\n")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_string(res: axum::response::Response) -> String {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let (app, _) = app();
    let res = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_string(res).await, "✅ Server is healthy!");
}

#[tokio::test]
async fn scrape_renders_registry() {
    let (app, registry) = app();
    let orders = registry.namespaced("orders");
    for _ in 0..3 {
        orders.inc("requests_total", &[("method", "GET")]);
    }
    orders.inc("requests_total", &[("method", "POST")]);
    orders.observe_histogram("latency_ms", 2.0, &[]);
    orders.observe_histogram("latency_ms", 3.0, &[]);

    let res = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let ct = res.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(ct.starts_with("text/plain"));

    let body = body_string(res).await;
    assert!(body.contains("# TYPE orders_requests_total counter\n"));
    assert!(body.contains("orders_requests_total{method=\"GET\"} 3\n"));
    assert!(body.contains("orders_requests_total{method=\"POST\"} 1\n"));
    assert!(body.contains("orders_latency_ms_sum 5\n"));
    assert!(body.contains("orders_latency_ms_count 2\n"));
}

#[tokio::test]
async fn scrape_path_is_configurable_and_can_be_disabled() {
    let (app, registry) = app_with("version: 1\nmetrics: { path: \"/internal/prom\" }\n");
    assert!(registry.is_prometheus_mode());
    let res = app.oneshot(get("/internal/prom")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let (app, registry) = app_with("version: 1\nmetrics: { enabled: false }\n");
    assert!(!registry.is_prometheus_mode());
    let res = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn requests_are_counted() {
    let (app, registry) = app();
    let res = app.clone().oneshot(get("/api/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = app.oneshot(get("/nope")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let snap = registry.all_metrics();
    assert_eq!(snap.counters[r#"http_requests_total{method="GET",status="200"}"#], 1.0);
    assert_eq!(snap.counters[r#"http_requests_total{method="GET",status="404"}"#], 1.0);
    assert_eq!(snap.histograms[r#"http_request_duration_ms{method="GET"}"#].len(), 2);
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let (app, _) = app();
    let res = app.oneshot(get("/missing")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body: serde_json::Value = serde_json::from_str(&body_string(res).await).unwrap();
    assert_eq!(body["message"], "not found: no route for /missing");
    assert_eq!(body["error"], body["message"]);
}

#[tokio::test]
async fn xhr_errors_use_structured_body() {
    let (app, _) = app();
    let req = Request::builder()
        .uri("/missing")
        .header("x-requested-with", "XMLHttpRequest")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body: serde_json::Value = serde_json::from_str(&body_string(res).await).unwrap();
    assert_eq!(body["title"], "Error");
    assert_eq!(body["errors"][0]["code"], 404);
    assert_eq!(body["errors"][0]["name"], "NotFoundError");
}

#[tokio::test]
async fn allowed_origin_gets_cors_headers() {
    let (app, _) = app();
    let req = Request::builder()
        .uri("/api/health")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn preflight_from_allowed_origin() {
    let (app, _) = app();
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/health")
        .header(header::ORIGIN, "http://127.0.0.1:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], "GET");
}

#[tokio::test]
async fn disallowed_origin_is_rejected() {
    let (app, registry) = app();
    let req = Request::builder()
        .uri("/api/health")
        .header(header::ORIGIN, "http://evil.example")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());

    let body: serde_json::Value = serde_json::from_str(&body_string(res).await).unwrap();
    assert_eq!(body["message"], "Not allowed by CORS");

    let snap = registry.all_metrics();
    assert_eq!(snap.counters[r#"http_requests_total{method="GET",status="403"}"#], 1.0);
}

#[tokio::test]
async fn production_origin_from_env() {
    let mut cfg = config::load_from_str("version: 1\n").unwrap();
    cfg.apply_env(vec![
        ("APP_ENV".to_string(), "production".to_string()),
        ("URL_PRODUCTION".to_string(), "https://app.example.com".to_string()),
    ])
    .unwrap();
    let app = router::build_router(AppState::new(cfg, MetricsRegistry::new()));

    let req = Request::builder()
        .uri("/api/health")
        .header(header::ORIGIN, "https://app.example.com")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
