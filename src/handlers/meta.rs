//! Liveness, build-metadata, rate-limit probe, and token issuance endpoints.

use axum::http::StatusCode;
use axum::http::header::RETRY_AFTER;
use serde::Serialize;
use tracing::warn;

use crate::error::GatewayResult;
use crate::router::{GatewayRequest, GatewayResponse};
use crate::state::AppState;

#[derive(Serialize)]
struct TokenResponse {
    token: String,
}

#[derive(Serialize)]
struct PongResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct RateLimitedBody {
    error: &'static str,
    message: &'static str,
}

/// `GET /healthz` — liveness probe, 200 with an empty body.
pub async fn healthz(_state: AppState, _req: GatewayRequest) -> GatewayResult<GatewayResponse> {
    Ok(GatewayResponse::status(StatusCode::OK))
}

/// `GET /limitz` — rate-limited probe.
///
/// Consults the shared admission bucket: 200 if a permit was consumed, 429
/// if the bucket is empty. Rejection is immediate; there is no queuing.
pub async fn limitz(state: AppState, req: GatewayRequest) -> GatewayResult<GatewayResponse> {
    if !state.limiter.allow() {
        warn!(path = %req.path, "rate limit exceeded");
        return Ok(GatewayResponse::json(
            StatusCode::TOO_MANY_REQUESTS,
            &RateLimitedBody {
                error: "too_many_requests",
                message: "Rate limit exceeded. Please retry later.",
            },
        )
        .with_header(RETRY_AFTER, "1"));
    }

    Ok(GatewayResponse::json(
        StatusCode::OK,
        &PongResponse { message: "pong" },
    ))
}

/// `GET /x` — build metadata.
pub async fn buildinfo(state: AppState, _req: GatewayRequest) -> GatewayResult<GatewayResponse> {
    Ok(GatewayResponse::json(StatusCode::OK, state.build.as_ref()))
}

/// `GET /tokenz` — issue a fresh access token.
///
/// The one place a signing failure is handler-visible; it surfaces as a 500.
pub async fn tokenz(state: AppState, _req: GatewayRequest) -> GatewayResult<GatewayResponse> {
    let token = state.authority.issue()?;
    Ok(GatewayResponse::json(
        StatusCode::OK,
        &TokenResponse { token },
    ))
}
