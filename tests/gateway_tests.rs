//! End-to-end tests for the todo gateway.
//!
//! Each test boots the full server in-process on an ephemeral port and talks
//! to it over real HTTP. No external services are required; the task store
//! is the in-memory backend.
//!
//! Run with: `cargo test --test gateway_tests`
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use reqwest::Client;
use serde_json::json;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use todo_gateway::router::{GatewayResponse, Router, handler_fn};
use todo_gateway::{AppState, Config, EngineKind, Server, build_router, store};

/// A running gateway bound to an ephemeral port.
struct Gateway {
    base_url: String,
    client: Client,
    shutdown: CancellationToken,
}

impl Gateway {
    /// Boot the gateway with the given engine and config.
    async fn start(kind: EngineKind, config: Config) -> Self {
        let tasks = store::connect(&config.db_conn).expect("task store");
        let state = AppState::new(tasks, config).expect("app state");
        Self::serve(kind, build_router(&state)).await
    }

    /// Boot an arbitrary route table with the given engine.
    async fn serve(kind: EngineKind, router: Router) -> Self {
        let server = Server::new(router, Duration::from_secs(5));
        let addr: SocketAddr = "127.0.0.1:0".parse().expect("loopback addr");
        let bound = server.bind(kind, addr).await.expect("bind engine");

        let shutdown = server.shutdown_handle();
        tokio::spawn(server.run_until(std::future::pending()));

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("HTTP client");

        Self {
            base_url: format!("http://{bound}"),
            client,
            shutdown,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch an access token via `/tokenz`.
    async fn token(&self) -> String {
        let body: serde_json::Value = self
            .client
            .get(self.url("/tokenz"))
            .send()
            .await
            .expect("tokenz request")
            .json()
            .await
            .expect("tokenz body");
        body["token"].as_str().expect("token field").to_string()
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// ============================================================================
// Liveness & Metadata Tests
// ============================================================================

#[tokio::test]
async fn test_healthz_is_200_with_empty_body() {
    let gw = Gateway::start(EngineKind::Axum, Config::default()).await;

    let response = gw
        .client
        .get(gw.url("/healthz"))
        .send()
        .await
        .expect("healthz request");

    assert_eq!(response.status().as_u16(), 200);
    assert!(response.bytes().await.expect("body").is_empty());
}

#[tokio::test]
async fn test_buildinfo_reports_version_and_commit() {
    let gw = Gateway::start(EngineKind::Axum, Config::default()).await;

    let body: serde_json::Value = gw
        .client
        .get(gw.url("/x"))
        .send()
        .await
        .expect("buildinfo request")
        .json()
        .await
        .expect("buildinfo body");

    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body.get("commit").is_some());
    assert!(body.get("started_at").is_some());
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let gw = Gateway::start(EngineKind::Axum, Config::default()).await;

    let response = gw
        .client
        .get(gw.url("/nope"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_wrong_method_on_known_path_is_405() {
    let gw = Gateway::start(EngineKind::Axum, Config::default()).await;

    let response = gw
        .client
        .post(gw.url("/healthz"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status().as_u16(), 405);
}

// ============================================================================
// Token & Auth Tests
// ============================================================================

#[tokio::test]
async fn test_token_flow_grants_access_to_protected_route() {
    let gw = Gateway::start(EngineKind::Axum, Config::default()).await;
    let token = gw.token().await;

    let response = gw
        .client
        .get(gw.url("/todos"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("list request");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.expect("list body");
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_protected_route_without_token_is_401() {
    let gw = Gateway::start(EngineKind::Axum, Config::default()).await;

    let response = gw
        .client
        .get(gw.url("/todos"))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status().as_u16(), 401);
    assert!(response.headers().contains_key("www-authenticate"));
}

#[tokio::test]
async fn test_protected_route_with_garbage_token_is_401() {
    let gw = Gateway::start(EngineKind::Axum, Config::default()).await;

    let response = gw
        .client
        .get(gw.url("/todos"))
        .bearer_auth("not.a.token")
        .send()
        .await
        .expect("request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn test_expired_token_is_401() {
    let config = Config {
        token_ttl: Duration::from_secs(1),
        ..Config::default()
    };
    let gw = Gateway::start(EngineKind::Axum, config).await;
    let token = gw.token().await;

    sleep(Duration::from_secs(2)).await;

    let response = gw
        .client
        .get(gw.url("/todos"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("request");

    assert_eq!(response.status().as_u16(), 401);
}

// ============================================================================
// Todo CRUD Tests
// ============================================================================

#[tokio::test]
async fn test_create_list_delete_round_trip() {
    let gw = Gateway::start(EngineKind::Axum, Config::default()).await;
    let token = gw.token().await;

    // Create (open route, no token needed)
    let created: serde_json::Value = gw
        .client
        .post(gw.url("/todos"))
        .json(&json!({"title": "write tests"}))
        .send()
        .await
        .expect("create request")
        .json()
        .await
        .expect("create body");
    let id = created["id"].as_str().expect("task id").to_string();
    assert_eq!(created["title"], "write tests");

    // List shows it
    let listed: serde_json::Value = gw
        .client
        .get(gw.url("/todos"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("list request")
        .json()
        .await
        .expect("list body");
    assert_eq!(listed.as_array().expect("array").len(), 1);
    assert_eq!(listed[0]["id"], id.as_str());

    // Delete it
    let response = gw
        .client
        .delete(gw.url(&format!("/todos/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .expect("delete request");
    assert_eq!(response.status().as_u16(), 204);

    // Gone
    let listed: serde_json::Value = gw
        .client
        .get(gw.url("/todos"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("list request")
        .json()
        .await
        .expect("list body");
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_create_with_malformed_body_is_400() {
    let gw = Gateway::start(EngineKind::Axum, Config::default()).await;

    let response = gw
        .client
        .post(gw.url("/todos"))
        .body("{not json")
        .send()
        .await
        .expect("request");

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.expect("error body");
    assert!(body.get("error").is_some());
}

#[tokio::test]
async fn test_delete_unknown_id_is_404() {
    let gw = Gateway::start(EngineKind::Axum, Config::default()).await;
    let token = gw.token().await;

    let response = gw
        .client
        .delete(gw.url(&format!("/todos/{}", uuid::Uuid::new_v4())))
        .bearer_auth(&token)
        .send()
        .await
        .expect("request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_delete_without_token_is_401() {
    let gw = Gateway::start(EngineKind::Axum, Config::default()).await;

    let response = gw
        .client
        .delete(gw.url(&format!("/todos/{}", uuid::Uuid::new_v4())))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status().as_u16(), 401);
}

// ============================================================================
// Rate Limiting Tests
// ============================================================================

#[tokio::test]
async fn test_limitz_drains_then_recovers() {
    let gw = Gateway::start(EngineKind::Axum, Config::default()).await;

    // Default bucket: capacity 5, refill 5/sec
    for i in 0..5 {
        let response = gw
            .client
            .get(gw.url("/limitz"))
            .send()
            .await
            .expect("limitz request");
        assert_eq!(response.status().as_u16(), 200, "request {i}");
    }

    let response = gw
        .client
        .get(gw.url("/limitz"))
        .send()
        .await
        .expect("limitz request");
    assert_eq!(response.status().as_u16(), 429);
    assert!(response.headers().contains_key("retry-after"));

    // Refill restores admission
    sleep(Duration::from_millis(1200)).await;
    let response = gw
        .client
        .get(gw.url("/limitz"))
        .send()
        .await
        .expect("limitz request");
    assert_eq!(response.status().as_u16(), 200);
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_graceful_shutdown_drains_in_flight_request() {
    // A route that holds the request long enough to still be in flight when
    // shutdown begins
    let mut router = Router::new();
    router.route(
        Method::GET,
        "/slow",
        handler_fn(|_req| async {
            sleep(Duration::from_millis(300)).await;
            Ok(GatewayResponse::status(StatusCode::OK))
        }),
    );

    let server = Server::new(router, Duration::from_secs(5));
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let bound = server.bind(EngineKind::Hyper, addr).await.unwrap();
    let shutdown = server.shutdown_handle();
    let run = tokio::spawn(server.run_until(std::future::pending()));

    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap();
    let url = format!("http://{bound}/slow");
    let in_flight = tokio::spawn({
        let client = client.clone();
        let url = url.clone();
        async move { client.get(url).send().await }
    });

    // Let the request reach the handler, then pull the plug
    sleep(Duration::from_millis(100)).await;
    shutdown.cancel();

    // The in-flight request still completes
    let response = in_flight.await.unwrap().expect("in-flight request");
    assert_eq!(response.status().as_u16(), 200);

    // The server exits cleanly within the grace period
    tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("drain within grace")
        .unwrap()
        .unwrap();

    // New connections are refused after shutdown
    let after = Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    assert!(after.get(url).send().await.is_err());
}

#[tokio::test]
async fn test_both_engines_serve_the_same_state() {
    let config = Config::default();
    let tasks = store::connect(&config.db_conn).unwrap();
    let state = AppState::new(tasks, config).unwrap();

    let server = Server::new(build_router(&state), Duration::from_secs(5));
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let axum_addr = server.bind(EngineKind::Axum, addr).await.unwrap();
    let hyper_addr = server.bind(EngineKind::Hyper, addr).await.unwrap();
    let shutdown = server.shutdown_handle();
    tokio::spawn(server.run_until(std::future::pending()));

    let client = Client::new();

    // Create through one engine, observe through the other
    client
        .post(format!("http://{axum_addr}/todos"))
        .json(&json!({"title": "shared"}))
        .send()
        .await
        .expect("create via axum");

    let token: serde_json::Value = client
        .get(format!("http://{hyper_addr}/tokenz"))
        .send()
        .await
        .expect("tokenz via hyper")
        .json()
        .await
        .expect("token body");

    let listed: serde_json::Value = client
        .get(format!("http://{hyper_addr}/todos"))
        .bearer_auth(token["token"].as_str().unwrap())
        .send()
        .await
        .expect("list via hyper")
        .json()
        .await
        .expect("list body");

    assert_eq!(listed[0]["title"], "shared");
    shutdown.cancel();
}
