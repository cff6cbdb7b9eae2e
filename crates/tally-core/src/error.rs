//! Shared error type across tally crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed configuration.
    BadRequest,
    /// No route or resource.
    NotFound,
    /// Rejected by policy (e.g. CORS).
    NotAllowed,
    /// Exposition requested before it was enabled.
    ExpositionDisabled,
    /// Snapshot formatting failed.
    RenderFailed,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::NotAllowed => "NOT_ALLOWED",
            ClientCode::ExpositionDisabled => "EXPOSITION_DISABLED",
            ClientCode::RenderFailed => "RENDER_FAILED",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TallyError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    NotAllowed(String),
    #[error("prometheus mode not enabled")]
    ExpositionDisabled,
    #[error("render failed: {0}")]
    Render(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl TallyError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            TallyError::BadRequest(_) => ClientCode::BadRequest,
            TallyError::NotFound(_) => ClientCode::NotFound,
            TallyError::NotAllowed(_) => ClientCode::NotAllowed,
            TallyError::ExpositionDisabled => ClientCode::ExpositionDisabled,
            TallyError::Render(_) => ClientCode::RenderFailed,
            TallyError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Short error name, used as `name` in structured error bodies.
    pub fn name(&self) -> &'static str {
        match self {
            TallyError::BadRequest(_) => "BadRequestError",
            TallyError::NotFound(_) => "NotFoundError",
            TallyError::NotAllowed(_) => "CorsError",
            TallyError::ExpositionDisabled => "ExpositionDisabledError",
            TallyError::Render(_) => "RenderError",
            TallyError::Internal(_) => "Error",
        }
    }
}

impl From<std::fmt::Error> for TallyError {
    fn from(e: std::fmt::Error) -> Self {
        TallyError::Render(e.to_string())
    }
}
