//! HTTP middleware stack.
//!
//! Outermost first: request logger, error handler, CORS guard, CORS headers.

pub mod cors;
pub mod error;
pub mod http_log;

pub use error::ApiError;
