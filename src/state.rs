//! Shared application state for gateway handlers.
//!
//! Cheap to clone: everything inside is either `Arc`-wrapped or internally
//! shared. The rate-limiter bucket is the only mutable state here, and it is
//! updated atomically; the token authority and config are read-only after
//! construction.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::TokenAuthority;
use crate::config::Config;
use crate::error::{GatewayError, GatewayResult};
use crate::limiter::RateLimiter;
use crate::store::TaskStore;

/// Build metadata reported by the `/x` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    /// Commit the binary was built from (`GIT_COMMIT` build env, or `dev`).
    pub commit: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// When this process started.
    pub started_at: DateTime<Utc>,
}

impl BuildInfo {
    fn capture() -> Self {
        Self {
            commit: option_env!("GIT_COMMIT").unwrap_or("dev"),
            version: env!("CARGO_PKG_VERSION"),
            started_at: Utc::now(),
        }
    }
}

/// Shared state injected into every handler closure at registration time.
#[derive(Clone)]
pub struct AppState {
    /// The task-store capability; the gateway never sees the backend.
    pub store: Arc<dyn TaskStore>,
    /// Issues and verifies access tokens.
    pub authority: TokenAuthority,
    /// Global admission-control bucket, shared by clone.
    pub limiter: RateLimiter,
    /// Runtime configuration.
    pub config: Arc<Config>,
    /// Build metadata.
    pub build: Arc<BuildInfo>,
}

impl AppState {
    /// Assemble state from a connected store and loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Config` if the rate-limiter settings are
    /// invalid (zero capacity or rate).
    pub fn new(store: Arc<dyn TaskStore>, config: Config) -> GatewayResult<Self> {
        let authority = TokenAuthority::new(config.sign_secret.clone(), config.token_ttl);
        let limiter = RateLimiter::new(config.rate_limit_capacity, config.rate_limit_per_sec)
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        Ok(Self {
            store,
            authority,
            limiter,
            config: Arc::new(config),
            build: Arc::new(BuildInfo::capture()),
        })
    }
}
