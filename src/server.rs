//! Server lifecycle: binding engines to listeners and graceful shutdown.
//!
//! # Lifecycle
//!
//! The frozen route table is shared across any number of engine listeners,
//! each running as its own tracked task with its own child cancellation
//! token — one engine stalling or failing never blocks another from serving.
//!
//! On shutdown (signal or [`Server::shutdown_handle`]), every engine stops
//! accepting and drains its in-flight requests; the drain is bounded by the
//! configured grace period. Grace expiry is logged and tolerated — the only
//! fatal lifecycle error is a failed listener bind, which is surfaced before
//! serving starts.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::router::{EngineKind, Router};

/// Runs engine listeners over one shared route table.
pub struct Server {
    router: Arc<Router>,
    grace: Duration,
    tracker: TaskTracker,
    root: CancellationToken,
}

impl Server {
    /// Create a server around a finished route table.
    ///
    /// The router is frozen here: nothing can register routes once the
    /// server owns it, so engine lookups never contend with writers.
    pub fn new(router: Router, grace: Duration) -> Self {
        Self {
            router: Arc::new(router),
            grace,
            tracker: TaskTracker::new(),
            root: CancellationToken::new(),
        }
    }

    /// A handle that cancels the whole server when triggered. Useful for
    /// tests and embedding; production shutdown goes through `run_until`.
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.root.clone()
    }

    /// Bind an engine to an address and start serving on it.
    ///
    /// Binding is eager: a failure is reported here, before `run_until`,
    /// and is fatal to startup. Returns the bound address (which differs
    /// from `addr` when port 0 was requested).
    pub async fn bind(&self, kind: EngineKind, addr: SocketAddr) -> GatewayResult<SocketAddr> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| GatewayError::BindFailure {
                addr: addr.to_string(),
                source,
            })?;
        let local = listener
            .local_addr()
            .map_err(|e| GatewayError::Internal(e.to_string()))?;

        let engine = kind.build();
        let name = engine.name();
        let router = self.router.clone();
        let token = self.root.child_token();

        self.tracker.spawn(async move {
            if let Err(e) = engine.serve(router, listener, token).await {
                error!(engine = name, error = %e, "engine exited with error");
            }
        });

        info!(engine = name, address = %local, "listener bound");
        Ok(local)
    }

    /// Serve until `signal` resolves (or the shutdown handle fires), then
    /// drain within the grace period.
    ///
    /// Requests already in flight when shutdown begins are allowed to
    /// finish; no new connections are accepted. If the grace period expires
    /// first, that is logged and the remaining tasks are abandoned to
    /// process exit — never an error to the caller.
    pub async fn run_until<F>(self, signal: F) -> GatewayResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            () = signal => {
                info!("shutdown signal received");
            }
            () = self.root.cancelled() => {
                info!("shutdown requested via handle");
            }
        }

        self.root.cancel();
        self.tracker.close();

        match tokio::time::timeout(self.grace, self.tracker.wait()).await {
            Ok(()) => info!("all engine listeners drained"),
            Err(_) => {
                let timeout = GatewayError::ShutdownTimeout(self.grace);
                warn!(error = %timeout, "abandoning remaining in-flight requests");
            }
        }

        Ok(())
    }
}
