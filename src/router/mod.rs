//! Engine-neutral routing: route registration, grouping, and dispatch.
//!
//! # Design
//!
//! The gateway decouples route registration from the transport engine.
//! Routes, groups, and handlers are expressed against the neutral
//! [`GatewayRequest`]/[`GatewayResponse`] pair; an engine backend
//! ([`HttpEngine`]) only converts wire requests into that pair and hands
//! them to the shared dispatch path. Swapping engines — or running two side
//! by side — never touches handler logic.
//!
//! # Route table lifecycle
//!
//! A [`Router`] is built once at startup, then frozen behind an `Arc` before
//! any listener starts accepting. There are no concurrent writers after that
//! point, so lookups are lock-free by construction.
//!
//! # Matching
//!
//! Exact method + path precedence in registration order. A path that matches
//! a registered pattern under a different method yields 405; anything else
//! yields 404. Both engine backends produce the same status codes for the
//! same request sequence.

pub mod pattern;

mod axum_engine;
mod engine;
mod hyper_engine;

pub use axum_engine::AxumEngine;
pub use engine::{EngineKind, HttpEngine};
pub use hyper_engine::HyperEngine;

use std::collections::HashMap;
use std::future::Future;
use std::ops::ControlFlow;
use std::pin::Pin;
use std::sync::Arc;

use axum::http::header::{ALLOW, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error};

use crate::error::{GatewayError, GatewayResult};
use self::pattern::{PathPattern, join_paths};

/// Maximum accepted request body size, enforced identically by both engines.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

// =============================================================================
// Request / Response
// =============================================================================

/// An inbound request, already lifted out of engine-specific types.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    /// HTTP method.
    pub method: Method,
    /// Request path (no query string).
    pub path: String,
    /// Parameters captured from `:name` pattern segments.
    pub params: HashMap<String, String>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Fully buffered request body.
    pub body: Bytes,
}

impl GatewayRequest {
    /// Create a bare request, mainly useful in tests and engine adapters.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: HashMap::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Attach a header, replacing any previous value.
    pub fn with_header(mut self, name: axum::http::header::HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Attach a body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Look up a captured path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// An outbound response in engine-neutral form.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl GatewayResponse {
    /// An empty-bodied response with the given status.
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// A JSON response with the given status.
    ///
    /// Serialization of our own response types is not expected to fail; if
    /// it somehow does, the client gets a plain 500 and the cause is logged.
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => {
                let mut headers = HeaderMap::new();
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                Self {
                    status,
                    headers,
                    body: Bytes::from(body),
                }
            }
            Err(e) => {
                error!(error = %e, "failed to serialize response body");
                Self::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Attach a header, replacing any previous value.
    pub fn with_header(mut self, name: axum::http::header::HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

/// Render a `GatewayError` as its client-facing JSON response.
pub fn error_response(err: &GatewayError) -> GatewayResponse {
    // Full details stay server-side
    error!(error = %err, kind = err.kind(), "request failed");

    GatewayResponse::json(
        err.status(),
        &ErrorBody {
            error: err.kind(),
            message: err.public_message(),
        },
    )
}

/// Response for a path no route matches.
pub fn not_found_response() -> GatewayResponse {
    GatewayResponse::json(
        StatusCode::NOT_FOUND,
        &ErrorBody {
            error: "not_found",
            message: "No matching route".to_string(),
        },
    )
}

/// Response for a matched path under an unregistered method.
///
/// Carries an `Allow` header listing the methods the path does accept,
/// matching what axum's own 405 advertises.
pub fn method_not_allowed_response(allowed: &[Method]) -> GatewayResponse {
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(",");
    GatewayResponse::status(StatusCode::METHOD_NOT_ALLOWED).with_header(ALLOW, &allow)
}

/// Response for a request body exceeding [`MAX_BODY_BYTES`].
pub fn payload_too_large_response() -> GatewayResponse {
    GatewayResponse::json(
        StatusCode::PAYLOAD_TOO_LARGE,
        &ErrorBody {
            error: "payload_too_large",
            message: format!("Request body exceeds {MAX_BODY_BYTES} bytes"),
        },
    )
}

// =============================================================================
// Handlers and middleware
// =============================================================================

/// Boxed future returned by handlers.
pub type HandlerFuture = Pin<Box<dyn Future<Output = GatewayResult<GatewayResponse>> + Send>>;

/// An engine-neutral request handler.
pub type Handler = Arc<dyn Fn(GatewayRequest) -> HandlerFuture + Send + Sync>;

/// Wrap an async fn or closure as a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(GatewayRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = GatewayResult<GatewayResponse>> + Send + 'static,
{
    Arc::new(move |req| Box::pin(f(req)))
}

/// A middleware in a route's chain.
///
/// Middleware inspect the request before the handler runs and either let it
/// continue or halt the chain with a response of their own
/// (`ControlFlow::Break`). They do not mutate the request: the decision is
/// their only effect.
pub trait Middleware: Send + Sync {
    /// Decide whether the request may proceed to the next stage.
    fn handle(&self, req: &GatewayRequest) -> ControlFlow<GatewayResponse>;
}

// =============================================================================
// Routes and the router
// =============================================================================

/// A single registered route: method, path pattern, middleware chain, and
/// handler. Immutable once registered.
pub struct Route {
    method: Method,
    pattern: PathPattern,
    chain: Vec<Arc<dyn Middleware>>,
    handler: Handler,
}

impl Route {
    /// The route's method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The route's path pattern.
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Run the middleware chain and handler for an already-matched request.
    ///
    /// Errors from the handler are mapped to their JSON responses here, so
    /// both engines share identical error semantics.
    pub async fn invoke(&self, req: GatewayRequest) -> GatewayResponse {
        for middleware in &self.chain {
            if let ControlFlow::Break(resp) = middleware.handle(&req) {
                debug!(
                    method = %self.method,
                    path = %req.path,
                    status = %resp.status,
                    "middleware halted request"
                );
                return resp;
            }
        }

        match (self.handler)(req).await {
            Ok(resp) => resp,
            Err(e) => error_response(&e),
        }
    }
}

/// Outcome of resolving a method + path against the route table.
pub enum RouteMatch {
    /// A route matched; captured path parameters included.
    Found(Arc<Route>, HashMap<String, String>),
    /// The path is registered, but not under this method. Carries the
    /// methods that would match.
    MethodMismatch(Vec<Method>),
    /// No registered pattern matches the path.
    NotFound,
}

/// Engine-neutral route table.
///
/// Built at startup via [`Router::route`] and [`Router::group`], then frozen
/// behind an `Arc` and handed to one or more engine backends.
#[derive(Default)]
pub struct Router {
    routes: Vec<Arc<Route>>,
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route at the top level (no middleware).
    pub fn route(&mut self, method: Method, path: &str, handler: Handler) -> &mut Self {
        self.push(method, path, Vec::new(), handler);
        self
    }

    /// Open a route group under `prefix` sharing a middleware chain.
    ///
    /// Groups compose: a nested group inherits and extends its parent's
    /// chain. An empty prefix groups by middleware alone.
    pub fn group(
        &mut self,
        prefix: &str,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> RouteGroup<'_> {
        RouteGroup {
            router: self,
            prefix: prefix.to_string(),
            chain: middleware,
        }
    }

    /// All registered routes, in registration order.
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    fn push(
        &mut self,
        method: Method,
        path: &str,
        chain: Vec<Arc<dyn Middleware>>,
        handler: Handler,
    ) {
        self.routes.push(Arc::new(Route {
            method,
            pattern: PathPattern::parse(path),
            chain,
            handler,
        }));
    }

    /// Resolve a method + path against the route table without touching the
    /// request body.
    ///
    /// Engines use this to decide a request's fate before reading its body:
    /// unmatched requests are answered with the body unread, the way axum's
    /// fallback and 405 paths behave.
    pub fn lookup(&self, method: &Method, path: &str) -> RouteMatch {
        let mut allowed: Vec<Method> = Vec::new();

        for route in &self.routes {
            let Some(params) = route.pattern.matches(path) else {
                continue;
            };
            if &route.method != method {
                if !allowed.contains(&route.method) {
                    allowed.push(route.method.clone());
                }
                continue;
            }
            return RouteMatch::Found(route.clone(), params);
        }

        if allowed.is_empty() {
            RouteMatch::NotFound
        } else {
            RouteMatch::MethodMismatch(allowed)
        }
    }

    /// Match and execute a request against the route table.
    ///
    /// This is the shared dispatch path: the hyper engine resolves every
    /// request through it, and the axum engine reproduces exactly its
    /// per-route semantics through [`Route::invoke`].
    pub async fn dispatch(&self, mut req: GatewayRequest) -> GatewayResponse {
        match self.lookup(&req.method, &req.path) {
            RouteMatch::Found(route, params) => {
                req.params = params;
                let resp = route.invoke(req).await;
                debug!(
                    method = %route.method,
                    path = %route.pattern,
                    status = %resp.status,
                    "request dispatched"
                );
                resp
            }
            RouteMatch::MethodMismatch(allowed) => method_not_allowed_response(&allowed),
            RouteMatch::NotFound => not_found_response(),
        }
    }
}

/// A named set of routes sharing a path prefix and middleware chain.
///
/// Created via [`Router::group`]; registrations go straight into the parent
/// router with the combined prefix and chain.
pub struct RouteGroup<'r> {
    router: &'r mut Router,
    prefix: String,
    chain: Vec<Arc<dyn Middleware>>,
}

impl RouteGroup<'_> {
    /// Register a route inside this group.
    pub fn route(&mut self, method: Method, path: &str, handler: Handler) -> &mut Self {
        let full = join_paths(&self.prefix, path);
        self.router.push(method, &full, self.chain.clone(), handler);
        self
    }

    /// Open a nested group, inheriting and extending this group's chain.
    pub fn group(
        &mut self,
        prefix: &str,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> RouteGroup<'_> {
        let mut chain = self.chain.clone();
        chain.extend(middleware);
        RouteGroup {
            router: self.router,
            prefix: join_paths(&self.prefix, prefix),
            chain,
        }
    }
}
