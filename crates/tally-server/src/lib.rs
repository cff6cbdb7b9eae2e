//! tally server library entry.
//!
//! Wires configuration, telemetry, CORS, request logging, the error handler,
//! and the health and metrics routes into one axum stack. Consumed by the
//! binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod middleware;
pub mod obs;
pub mod ops;
pub mod router;
