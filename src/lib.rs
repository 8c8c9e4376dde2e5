//! # Todo Gateway
//!
//! A small todo HTTP gateway built around an engine-neutral routing core,
//! featuring:
//!
//! - **Dual engines**: the same route table served by axum or raw hyper
//! - **Stateless auth**: HMAC-signed bearer tokens, no session storage
//! - **Admission control**: a shared token bucket gating the probe endpoint
//! - **Lifecycle**: per-engine cancellation with a bounded graceful drain
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │            Server (TaskTracker + CancellationToken)         │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │         AxumEngine           │         HyperEngine          │
//! ├──────────────────────────────┴──────────────────────────────┤
//! │  Router (engine-neutral routes, groups, middleware chains)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (healthz, limitz, buildinfo, tokenz, todos)       │
//! ├────────────────┬───────────────────┬────────────────────────┤
//! │  TokenAuthority│    RateLimiter    │   TaskStore (trait)    │
//! └────────────────┴───────────────────┴────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use todo_gateway::{AppState, Config, Server, build_router, store};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let tasks = store::connect(&config.db_conn)?;
//!     let state = AppState::new(tasks, config)?;
//!
//!     let server = Server::new(build_router(&state), Duration::from_secs(5));
//!     // Bind engines, then server.run_until(...).await
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! A signing secret is required:
//! ```bash
//! SIGN=your-signing-secret cargo run
//! ```
//!
//! Run both engines side by side:
//! ```bash
//! SIGN=your-signing-secret ENGINES=axum:8080,hyper:8081 cargo run
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;
pub mod utils;

// Re-exports for convenience
pub use auth::TokenAuthority;
pub use config::Config;
pub use error::{GatewayError, GatewayResult};
pub use limiter::RateLimiter;
pub use router::{EngineKind, Router};
pub use routes::build_router;
pub use server::Server;
pub use state::AppState;
