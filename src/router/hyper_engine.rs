//! Raw-hyper engine.
//!
//! Runs its own accept loop and HTTP/1.1 connection handling, and leans on
//! the neutral pattern matcher via [`Router::lookup`] for routing. One
//! task per connection; graceful drain through hyper-util's
//! [`GracefulShutdown`] watcher.

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{
    GatewayRequest, GatewayResponse, HttpEngine, MAX_BODY_BYTES, RouteMatch, Router,
    error_response, method_not_allowed_response, not_found_response, payload_too_large_response,
};
use crate::error::{GatewayError, GatewayResult};

/// Engine backend speaking HTTP/1.1 directly over hyper.
#[derive(Debug, Clone, Copy, Default)]
pub struct HyperEngine;

impl HyperEngine {
    /// Create the engine.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HttpEngine for HyperEngine {
    fn name(&self) -> &'static str {
        "hyper"
    }

    async fn serve(
        &self,
        router: Arc<Router>,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> GatewayResult<()> {
        let addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Internal(e.to_string()))?;
        let graceful = GracefulShutdown::new();

        info!(engine = "hyper", address = %addr, "engine listening");

        loop {
            tokio::select! {
                biased; // Stop accepting the moment shutdown fires

                _ = shutdown.cancelled() => break,

                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(engine = "hyper", error = %e, "accept failed");
                            continue;
                        }
                    };

                    let io = TokioIo::new(stream);
                    let router = router.clone();
                    let service = service_fn(move |req| {
                        let router = router.clone();
                        async move { Ok::<_, Infallible>(handle(router, req).await) }
                    });

                    let conn = http1::Builder::new().serve_connection(io, service);
                    let watched = graceful.watch(conn);
                    tokio::spawn(async move {
                        if let Err(e) = watched.await {
                            debug!(engine = "hyper", peer = %peer, error = %e, "connection closed with error");
                        }
                    });
                }
            }
        }

        // Listener drops here: no new connections. In-flight requests are
        // allowed to finish; the server lifecycle bounds how long we wait.
        drop(listener);
        info!(engine = "hyper", address = %addr, "draining in-flight connections");
        graceful.shutdown().await;

        info!(engine = "hyper", address = %addr, "engine stopped");
        Ok(())
    }
}

/// Lift a hyper request into the neutral form and run the matched route.
///
/// The route is resolved before the body is read: unmatched requests are
/// answered with the body untouched, exactly as the axum engine's fallback
/// and 405 paths behave. The body limit therefore only applies to requests
/// that actually reach a handler.
async fn handle(router: Arc<Router>, req: hyper::Request<Incoming>) -> hyper::Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();

    let (route, params) = match router.lookup(&parts.method, parts.uri.path()) {
        RouteMatch::Found(route, params) => (route, params),
        RouteMatch::MethodMismatch(allowed) => {
            return into_hyper(method_not_allowed_response(&allowed));
        }
        RouteMatch::NotFound => return into_hyper(not_found_response()),
    };

    let bytes = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return into_hyper(payload_too_large_response());
        }
        Err(e) => {
            return into_hyper(error_response(&GatewayError::BadRequest(format!(
                "failed to read request body: {e}"
            ))));
        }
    };

    let request = GatewayRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        params,
        headers: parts.headers,
        body: bytes,
    };

    into_hyper(route.invoke(request).await)
}

fn into_hyper(resp: GatewayResponse) -> hyper::Response<Full<Bytes>> {
    let mut response = hyper::Response::new(Full::new(resp.body));
    *response.status_mut() = resp.status;
    response.headers_mut().extend(resp.headers);
    response
}
