// Signal handling module
//
// Supported signals:
// - SIGTERM: stop serving
// - SIGINT:  stop serving (Ctrl+C)
// Non-unix targets only get Ctrl+C.

use crate::logger;

/// Resolve once the process is asked to terminate
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(term), Ok(int)) => (term, int),
            (Err(e), _) | (_, Err(e)) => {
                logger::log_error(&format!(
                    "Failed to register signal handlers: {e}, falling back to Ctrl+C"
                ));
                ctrl_c().await;
                return;
            }
        };

    tokio::select! {
        _ = sigterm.recv() => logger::log_debug("SIGTERM received"),
        _ = sigint.recv() => logger::log_debug("SIGINT received"),
    }
}

/// Resolve once Ctrl+C is pressed
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        logger::log_error(&format!("Failed to listen for Ctrl+C: {e}"));
        // Without a signal source the server runs until killed
        std::future::pending::<()>().await;
    }
}
