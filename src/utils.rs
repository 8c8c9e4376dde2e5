use tokio::signal;
use tracing::{error, info};

/// Resolve when the process is asked to stop (Ctrl+C, or SIGTERM on unix).
///
/// This future only observes the signal; the bounded drain that follows is
/// the server's job. Pass it to [`crate::server::Server::run_until`].
///
/// # Panics
///
/// Panics if a signal handler cannot be installed, which is a fatal
/// initialization failure.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            panic!("Critical: cannot install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                panic!("Critical: cannot install SIGTERM signal handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
