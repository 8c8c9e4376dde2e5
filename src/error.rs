use axum::http::StatusCode;
use thiserror::Error;

use crate::auth::AuthError;

/// Gateway-wide error types with appropriate HTTP status codes.
///
/// # Propagation Policy
///
/// Authentication failures never appear here at request time: they are
/// resolved entirely inside the auth middleware, which short-circuits with
/// its own 401 response before any handler runs. The `Auth` variant exists
/// for the one handler-visible auth failure, a signing error while issuing
/// a fresh token.
///
/// Store errors propagate to handlers as-is and are mapped to status codes
/// by `status()` (not-found → 404, unavailable → 503).
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("token authority error: {0}")]
    Auth(#[from] AuthError),

    #[error("task store is unavailable: {0}")]
    StoreUnavailable(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("internal server error: {0}")]
    Internal(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to bind listener on {addr}: {source}")]
    BindFailure {
        addr: String,
        source: std::io::Error,
    },

    #[error("shutdown grace period of {0:?} expired with requests still in flight")]
    ShutdownTimeout(std::time::Duration),
}

impl GatewayError {
    /// HTTP status code this error maps to when it reaches a response.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::InvalidBody(_) | GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Auth(_)
            | GatewayError::Internal(_)
            | GatewayError::Config(_)
            | GatewayError::BindFailure { .. }
            | GatewayError::ShutdownTimeout(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error kind for response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Auth(_) => "auth_error",
            GatewayError::StoreUnavailable(_) => "store_unavailable",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::InvalidBody(_) => "invalid_body",
            GatewayError::BadRequest(_) => "bad_request",
            GatewayError::Internal(_) => "internal_error",
            GatewayError::Config(_) => "config_error",
            GatewayError::BindFailure { .. } => "bind_failure",
            GatewayError::ShutdownTimeout(_) => "shutdown_timeout",
        }
    }

    /// Client-facing message. Internal details stay in the server logs;
    /// client errors are safe to echo since they describe the request itself.
    pub fn public_message(&self) -> String {
        match self {
            GatewayError::NotFound(msg) | GatewayError::BadRequest(msg) => msg.clone(),
            GatewayError::InvalidBody(e) => sanitize_serde_error(e),
            GatewayError::StoreUnavailable(_) => {
                "Task store is temporarily unavailable. Please try again later.".to_string()
            }
            _ => "An internal error occurred.".to_string(),
        }
    }
}

/// Sanitize serde error messages to avoid leaking internal type information.
fn sanitize_serde_error(e: &serde_json::Error) -> String {
    let msg = e.to_string();

    if msg.contains("missing field")
        && let Some(start) = msg.find('`')
        && let Some(end) = msg[start + 1..].find('`')
    {
        let field = &msg[start + 1..start + 1 + end];
        return format!("Missing required field: {field}");
    }

    if msg.contains("invalid type") {
        return "Invalid data type in request body".to_string();
    }

    if msg.contains("EOF while parsing") || msg.contains("expected") {
        return "Malformed JSON in request body".to_string();
    }

    "Invalid request format".to_string()
}

/// Convenience type alias for Results with GatewayError.
pub type GatewayResult<T> = Result<T, GatewayError>;
