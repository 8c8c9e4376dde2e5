//! The engine capability: serving a frozen route table over a listener.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use super::{AxumEngine, HyperEngine, Router};
use crate::error::{GatewayError, GatewayResult};

/// A transport backend for the gateway.
///
/// Implementations convert wire requests into [`GatewayRequest`]s, run them
/// through the shared dispatch path, and write the resulting
/// [`GatewayResponse`]s back out. Everything route-related lives in the
/// neutral [`Router`]; an engine brings only the transport.
///
/// `serve` returns once `shutdown` is cancelled and in-flight requests have
/// drained. Bounding the drain is the server lifecycle's job, not the
/// engine's.
///
/// [`GatewayRequest`]: super::GatewayRequest
/// [`GatewayResponse`]: super::GatewayResponse
#[async_trait]
pub trait HttpEngine: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Accept connections on `listener` and serve `router` until `shutdown`
    /// is cancelled.
    async fn serve(
        &self,
        router: Arc<Router>,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> GatewayResult<()>;
}

/// The engine backends this gateway ships with.
///
/// Selected at construction time (typically from the `ENGINES` environment
/// variable); after that, callers only ever hold a `Box<dyn HttpEngine>` and
/// never branch on the active variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// The axum-backed engine.
    Axum,
    /// The raw-hyper engine.
    Hyper,
}

impl EngineKind {
    /// Construct the backend this kind names.
    pub fn build(self) -> Box<dyn HttpEngine> {
        match self {
            EngineKind::Axum => Box::new(AxumEngine::new()),
            EngineKind::Hyper => Box::new(HyperEngine::new()),
        }
    }

    /// Short name for logs and config display.
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Axum => "axum",
            EngineKind::Hyper => "hyper",
        }
    }
}

impl FromStr for EngineKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "axum" => Ok(EngineKind::Axum),
            "hyper" => Ok(EngineKind::Hyper),
            other => Err(GatewayError::Config(format!(
                "unknown engine '{other}' (expected 'axum' or 'hyper')"
            ))),
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
