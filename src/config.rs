//! Gateway configuration loaded from environment variables.
//!
//! # Inputs
//!
//! - `SIGN`: token signing secret (required, non-empty)
//! - `HOST`: bind host (default: "0.0.0.0")
//! - `PORT`: base listen port (default: 8080)
//! - `ENGINES`: comma-separated engine list, each `kind[:port]` with kind
//!   `axum` or `hyper` (default: `axum` on `PORT`). An entry without an
//!   explicit port gets `PORT + its index`, so `ENGINES=axum,hyper` with
//!   `PORT=8080` listens on 8080 and 8081.
//! - `DB_CONN`: task-store connection string (default: `mem://`)
//! - `TOKEN_TTL_SECS`: access-token lifetime (default: 3600)
//! - `RATE_LIMIT_CAPACITY` / `RATE_LIMIT_PER_SEC`: admission bucket size and
//!   refill rate (default: 5 / 5)
//! - `SHUTDOWN_GRACE_SECS`: in-flight drain bound on shutdown (default: 5)
//! - `RUST_LOG`: log filter

use std::env;
use std::time::Duration;

use crate::error::{GatewayError, GatewayResult};
use crate::router::EngineKind;

/// One engine listener: which backend, on which port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSpec {
    /// Engine backend.
    pub kind: EngineKind,
    /// Listen port.
    pub port: u16,
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Bind host (default: "0.0.0.0").
    pub host: String,

    /// Engine listeners to run concurrently.
    pub engines: Vec<EngineSpec>,

    // =========================================================================
    // Security Configuration
    // =========================================================================
    /// Symmetric token signing secret. Required; the process refuses to
    /// start with an empty secret.
    pub sign_secret: String,

    /// Access-token lifetime.
    pub token_ttl: Duration,

    // =========================================================================
    // Storage Configuration
    // =========================================================================
    /// Task-store connection string (e.g. `mem://`).
    pub db_conn: String,

    // =========================================================================
    // Rate Limiting Configuration
    // =========================================================================
    /// Admission bucket capacity (default: 5).
    pub rate_limit_capacity: u32,

    /// Bucket refill rate in permits per second (default: 5).
    pub rate_limit_per_sec: u32,

    // =========================================================================
    // Lifecycle / Observability Configuration
    // =========================================================================
    /// Bound on the in-flight drain during graceful shutdown.
    pub shutdown_grace: Duration,

    /// Log level (e.g. "info", "debug").
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables with development
    /// defaults, reading a `.env` file first if one is present.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Config` if any value fails to parse or
    /// validation fails.
    pub fn from_env() -> GatewayResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let port: u16 = Self::parse_env("PORT", 8080)?;

        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            engines: Self::parse_engines(port)?,
            sign_secret: env::var("SIGN").unwrap_or_default(),
            token_ttl: Duration::from_secs(Self::parse_env("TOKEN_TTL_SECS", 3600)?),
            db_conn: env::var("DB_CONN").unwrap_or_else(|_| "mem://".to_string()),
            rate_limit_capacity: Self::parse_env("RATE_LIMIT_CAPACITY", 5)?,
            rate_limit_per_sec: Self::parse_env("RATE_LIMIT_PER_SEC", 5)?,
            shutdown_grace: Duration::from_secs(Self::parse_env("SHUTDOWN_GRACE_SECS", 5)?),
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values for consistency.
    fn validate(&self) -> GatewayResult<()> {
        if self.sign_secret.is_empty() {
            return Err(GatewayError::Config(
                "SIGN must be set to a non-empty signing secret".to_string(),
            ));
        }

        if self.engines.is_empty() {
            return Err(GatewayError::Config(
                "ENGINES must name at least one engine".to_string(),
            ));
        }

        let mut ports: Vec<u16> = self.engines.iter().map(|e| e.port).collect();
        ports.sort_unstable();
        ports.dedup();
        if ports.len() != self.engines.len() {
            return Err(GatewayError::Config(
                "engine listeners must use distinct ports".to_string(),
            ));
        }

        if self.rate_limit_capacity == 0 || self.rate_limit_per_sec == 0 {
            return Err(GatewayError::Config(
                "RATE_LIMIT_CAPACITY and RATE_LIMIT_PER_SEC must be greater than 0".to_string(),
            ));
        }

        if self.token_ttl.is_zero() {
            return Err(GatewayError::Config(
                "TOKEN_TTL_SECS must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Bind address for one engine listener.
    pub fn listen_addr(&self, spec: &EngineSpec) -> String {
        format!("{}:{}", self.host, spec.port)
    }

    /// Parse an environment variable into the specified type with a default.
    fn parse_env<T>(name: &str, default: T) -> GatewayResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .parse()
                .map_err(|e| GatewayError::Config(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Parse the `ENGINES` list; entries without an explicit port are
    /// assigned `base_port + index`.
    fn parse_engines(base_port: u16) -> GatewayResult<Vec<EngineSpec>> {
        let raw = env::var("ENGINES").unwrap_or_else(|_| "axum".to_string());
        Self::parse_engine_list(&raw, base_port)
    }

    fn parse_engine_list(raw: &str, base_port: u16) -> GatewayResult<Vec<EngineSpec>> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .enumerate()
            .map(|(i, entry)| {
                let (kind, port) = match entry.split_once(':') {
                    Some((kind, port)) => {
                        let port: u16 = port.parse().map_err(|e| {
                            GatewayError::Config(format!("Invalid port in ENGINES '{entry}': {e}"))
                        })?;
                        (kind, port)
                    }
                    None => {
                        let port = base_port.checked_add(i as u16).ok_or_else(|| {
                            GatewayError::Config(format!(
                                "port overflow assigning a port to ENGINES entry '{entry}'"
                            ))
                        })?;
                        (entry, port)
                    }
                };
                Ok(EngineSpec {
                    kind: kind.parse()?,
                    port,
                })
            })
            .collect()
    }
}

/// Default configuration for tests and development. Production deployments
/// use `Config::from_env()`.
impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            engines: vec![EngineSpec {
                kind: EngineKind::Axum,
                port: 8080,
            }],
            sign_secret: "dev-signing-secret".to_string(),
            token_ttl: Duration::from_secs(3600),
            db_conn: "mem://".to_string(),
            rate_limit_capacity: 5,
            rate_limit_per_sec: 5,
            shutdown_grace: Duration::from_secs(5),
            log_level: "info".to_string(),
        }
    }
}
