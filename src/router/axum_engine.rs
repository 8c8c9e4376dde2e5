//! Axum-backed engine.
//!
//! Each neutral route is translated into the axum router (`:id` patterns
//! become `{id}`), so axum performs the matching, but middleware chains and
//! handlers still run through the shared [`Route::invoke`] path — the engine
//! contributes only transport and matching.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{RawPathParams, Request};
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodFilter, on};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{
    GatewayRequest, GatewayResponse, HttpEngine, MAX_BODY_BYTES, Route, Router,
    not_found_response, payload_too_large_response,
};
use crate::error::{GatewayError, GatewayResult};

/// Engine backend wrapping an axum server.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxumEngine;

impl AxumEngine {
    /// Create the engine.
    pub fn new() -> Self {
        Self
    }

    /// Translate the neutral route table into an axum application.
    fn build_app(router: &Arc<Router>) -> GatewayResult<axum::Router> {
        let mut app = axum::Router::new();

        for route in router.routes() {
            let filter = MethodFilter::try_from(route.method().clone()).map_err(|e| {
                GatewayError::Config(format!(
                    "method {} not routable by the axum engine: {e}",
                    route.method()
                ))
            })?;

            let bound = route.clone();
            let handler = move |params: RawPathParams, req: Request| {
                let route = bound.clone();
                async move { serve_route(route, params, req).await }
            };

            app = app.route(&route.pattern().to_axum(), on(filter, handler));
        }

        // Match the neutral dispatcher's 404 body; axum itself supplies the
        // 405 for known paths under other methods.
        Ok(app
            .fallback(|| async { into_axum(not_found_response()) })
            .layer(TraceLayer::new_for_http()))
    }
}

#[async_trait]
impl HttpEngine for AxumEngine {
    fn name(&self) -> &'static str {
        "axum"
    }

    async fn serve(
        &self,
        router: Arc<Router>,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> GatewayResult<()> {
        let app = Self::build_app(&router)?;
        let addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Internal(e.to_string()))?;

        info!(engine = "axum", address = %addr, "engine listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
            .map_err(|e| GatewayError::Internal(e.to_string()))?;

        info!(engine = "axum", address = %addr, "engine stopped");
        Ok(())
    }
}

/// Lift an axum request into the neutral form and run the matched route.
async fn serve_route(route: Arc<Route>, params: RawPathParams, req: Request) -> Response {
    let (parts, body) = req.into_parts();

    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return into_axum(payload_too_large_response()),
    };

    let request = GatewayRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        params: params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        headers: parts.headers,
        body: bytes,
    };

    into_axum(route.invoke(request).await)
}

fn into_axum(resp: GatewayResponse) -> Response {
    let mut response = (resp.status, resp.body).into_response();
    response.headers_mut().extend(resp.headers);
    response
}
