//! Generic error handler.
//!
//! Handlers return [`ApiError`]; it renders a JSON body and tags the response
//! so [`error_handler`] can log it and reshape the body for XHR callers.

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tally_core::error::{ClientCode, TallyError};

#[derive(Debug)]
pub struct ApiError(pub TallyError);

impl From<TallyError> for ApiError {
    fn from(e: TallyError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.client_code() {
            ClientCode::BadRequest => StatusCode::BAD_REQUEST,
            ClientCode::NotFound => StatusCode::NOT_FOUND,
            ClientCode::NotAllowed => StatusCode::FORBIDDEN,
            ClientCode::ExpositionDisabled | ClientCode::RenderFailed | ClientCode::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Attached to error responses for the handler middleware.
#[derive(Debug, Clone)]
struct ErrorInfo {
    name: &'static str,
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();
        let mut res = (
            status,
            Json(json!({ "message": message, "error": message })),
        )
            .into_response();
        res.extensions_mut().insert(ErrorInfo {
            name: self.0.name(),
            status,
            message,
        });
        res
    }
}

fn is_xhr(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}

pub async fn error_handler(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let xhr = is_xhr(req.headers());

    let res = next.run(req).await;
    let Some(info) = res.extensions().get::<ErrorInfo>().cloned() else {
        return res;
    };

    tracing::error!(
        module = "http",
        error_type = info.name,
        status = info.status.as_u16(),
        "[{} {}] {}",
        method,
        uri,
        info.message
    );

    if !xhr {
        return res;
    }
    (
        info.status,
        Json(json!({
            "title": "Error",
            "errors": [{
                "name": info.name,
                "code": info.status.as_u16(),
                "message": info.message,
            }],
        })),
    )
        .into_response()
}
