use std::net::SocketAddr;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use todo_gateway::{AppState, Config, Server, build_router, store, utils};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting Todo Gateway v{}", env!("CARGO_PKG_VERSION"));

    match run().await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

/// Run the application, returning an exit code on error.
async fn run() -> Result<(), exitcode::ExitCode> {
    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {e}");
        exitcode::CONFIG
    })?;
    info!(
        host = %config.host,
        engines = config.engines.len(),
        "Configuration loaded"
    );

    // Connect the task store
    let tasks = store::connect(&config.db_conn).map_err(|e| {
        error!("Failed to connect task store: {e}");
        exitcode::UNAVAILABLE
    })?;

    // Build application state and the route table
    let state = AppState::new(tasks, config.clone()).map_err(|e| {
        error!("Failed to build application state: {e}");
        exitcode::CONFIG
    })?;
    let router = build_router(&state);

    // Bind every configured engine before serving; any bind failure is fatal
    let server = Server::new(router, config.shutdown_grace);
    for spec in &config.engines {
        let addr: SocketAddr = config.listen_addr(spec).parse().map_err(|e| {
            error!("Invalid listen address for {}: {e}", spec.kind);
            exitcode::CONFIG
        })?;
        let bound = server.bind(spec.kind, addr).await.map_err(|e| {
            error!("Startup failed: {e}");
            exitcode::UNAVAILABLE
        })?;
        info!("Serving http://{bound} via {}", spec.kind);
    }

    info!("API endpoints:");
    info!("  GET    /healthz    - Liveness check");
    info!("  GET    /limitz     - Rate-limited probe");
    info!("  GET    /x          - Build metadata");
    info!("  GET    /tokenz     - Issue an access token");
    info!("  POST   /todos      - Create a task");
    info!("  GET    /todos      - List tasks (token required)");
    info!("  DELETE /todos/:id  - Delete a task (token required)");

    // Serve until signalled, then drain within the grace period
    server.run_until(utils::shutdown_signal()).await.map_err(|e| {
        error!("Server error: {e}");
        exitcode::SOFTWARE
    })?;

    info!("Server shutdown complete");
    Ok(())
}
