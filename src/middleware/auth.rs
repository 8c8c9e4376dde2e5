//! Bearer-token authentication middleware.
//!
//! Gates a route group behind the [`TokenAuthority`]: a request either
//! carries an `Authorization: Bearer <token>` credential that verifies, or
//! the chain halts with 401 before the handler runs. Handlers behind this
//! middleware can assume authentication already succeeded.
//!
//! The middleware reads the credential and nothing else — it never mutates
//! request or server state, so a request is exactly as authenticated as its
//! token says it is.

use std::ops::ControlFlow;

use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::{AuthError, TokenAuthority};
use crate::router::{GatewayRequest, GatewayResponse, Middleware};

/// Credential scheme expected in the `Authorization` header.
const BEARER_PREFIX: &str = "Bearer ";

#[derive(Serialize)]
struct UnauthorizedBody<'a> {
    error: &'a str,
    message: &'a str,
}

/// Middleware requiring a verified access token.
#[derive(Clone)]
pub struct RequireAuth {
    authority: TokenAuthority,
}

impl RequireAuth {
    /// Create the middleware around a token authority.
    pub fn new(authority: TokenAuthority) -> Self {
        Self { authority }
    }
}

impl Middleware for RequireAuth {
    fn handle(&self, req: &GatewayRequest) -> ControlFlow<GatewayResponse> {
        let Some(token) = extract_bearer_token(req) else {
            warn!(path = %req.path, "missing bearer credential");
            return ControlFlow::Break(unauthorized("missing credentials"));
        };

        match self.authority.verify(token) {
            Ok(_claims) => {
                debug!(path = %req.path, "token verified");
                ControlFlow::Continue(())
            }
            Err(e) => {
                warn!(path = %req.path, error = %e, "token rejected");
                let message = match e {
                    AuthError::Expired => "token has expired",
                    _ => "invalid token",
                };
                ControlFlow::Break(unauthorized(message))
            }
        }
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
fn extract_bearer_token(req: &GatewayRequest) -> Option<&str> {
    req.headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn unauthorized(message: &str) -> GatewayResponse {
    GatewayResponse::json(
        StatusCode::UNAUTHORIZED,
        &UnauthorizedBody {
            error: "unauthorized",
            message,
        },
    )
    .with_header(
        axum::http::header::WWW_AUTHENTICATE,
        "Bearer",
    )
}
