//! Route table construction.
//!
//! # Route Groups
//!
//! - Open: `/healthz`, `/limitz`, `/x`, `/tokenz`, `POST /todos`
//! - Protected (bearer token required): `GET /todos`, `DELETE /todos/:id`
//!
//! The table is built once here, against the neutral router, and then served
//! unchanged by whichever engine backends the deployment runs. Rate limiting
//! applies to `/limitz` via the limiter injected into its handler, not as a
//! blanket layer.

use std::future::Future;
use std::sync::Arc;

use axum::http::Method;

use crate::error::GatewayResult;
use crate::handlers;
use crate::middleware::RequireAuth;
use crate::router::{GatewayRequest, GatewayResponse, Handler, Router};
use crate::state::AppState;

/// Bind a stateful handler fn into the router's stateless [`Handler`] shape.
fn bind<F, Fut>(state: &AppState, f: F) -> Handler
where
    F: Fn(AppState, GatewayRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = GatewayResult<GatewayResponse>> + Send + 'static,
{
    let state = state.clone();
    Arc::new(move |req| Box::pin(f(state.clone(), req)))
}

/// Build the gateway's route table.
pub fn build_router(state: &AppState) -> Router {
    let mut router = Router::new();

    // Open routes
    router.route(Method::GET, "/healthz", bind(state, handlers::healthz));
    router.route(Method::GET, "/limitz", bind(state, handlers::limitz));
    router.route(Method::GET, "/x", bind(state, handlers::buildinfo));
    router.route(Method::GET, "/tokenz", bind(state, handlers::tokenz));
    router.route(Method::POST, "/todos", bind(state, handlers::create_todo));

    // Protected group: everything here sits behind the token gate
    {
        let auth = RequireAuth::new(state.authority.clone());
        let mut protected = router.group("", vec![Arc::new(auth)]);
        protected.route(Method::GET, "/todos", bind(state, handlers::list_todos));
        protected.route(
            Method::DELETE,
            "/todos/:id",
            bind(state, handlers::delete_todo),
        );
    }

    router
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::http::header::AUTHORIZATION;

    use crate::config::Config;
    use crate::store::MemoryStore;

    fn test_state() -> AppState {
        AppState::new(Arc::new(MemoryStore::new()), Config::default()).unwrap()
    }

    #[tokio::test]
    async fn test_open_routes_need_no_credential() {
        let state = test_state();
        let router = build_router(&state);

        for path in ["/healthz", "/x", "/tokenz"] {
            let resp = router.dispatch(GatewayRequest::new(Method::GET, path)).await;
            assert_eq!(resp.status, StatusCode::OK, "GET {path}");
        }
    }

    #[tokio::test]
    async fn test_protected_route_rejects_missing_token() {
        let state = test_state();
        let router = build_router(&state);

        let resp = router
            .dispatch(GatewayRequest::new(Method::GET, "/todos"))
            .await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_protected_route_accepts_issued_token() {
        let state = test_state();
        let router = build_router(&state);
        let token = state.authority.issue().unwrap();

        let req = GatewayRequest::new(Method::GET, "/todos")
            .with_header(AUTHORIZATION, &format!("Bearer {token}"));
        let resp = router.dispatch(req).await;
        assert_eq!(resp.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_is_open_but_list_is_gated() {
        let state = test_state();
        let router = build_router(&state);

        let create = GatewayRequest::new(Method::POST, "/todos")
            .with_body(r#"{"title":"x"}"#.as_bytes().to_vec());
        assert_eq!(router.dispatch(create).await.status, StatusCode::CREATED);

        // The unauthenticated list still cannot observe it
        let list = GatewayRequest::new(Method::GET, "/todos");
        assert_eq!(
            router.dispatch(list).await.status,
            StatusCode::UNAUTHORIZED
        );
    }
}
