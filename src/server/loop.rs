// Server loop module
// Accept loop and the start/stop lifecycle around it

use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::{JoinHandle, JoinSet};

use super::connection::accept_connection;
use super::listener::create_listener;
use crate::config::AppState;
use crate::error::ServerError;
use crate::logger;

/// A running file server.
///
/// [`Server::start`] binds the listener and spawns the accept loop;
/// [`Server::stop`] closes the listener and ends open connections. Nothing
/// is global, so several servers can run in one process (the tests do).
pub struct Server {
    local_addr: SocketAddr,
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl Server {
    /// Bind `server.host:server.port` and start accepting connections.
    ///
    /// Fails with [`ServerError::Bind`] when the port is taken or not
    /// permitted. Prints `Serving at port N` once bound.
    pub async fn start(state: Arc<AppState>) -> Result<Self, ServerError> {
        let addr = state.config.get_socket_addr()?;
        let listener = create_listener(addr)?;
        let local_addr = listener.local_addr()?;

        logger::log_server_start(&local_addr, &state);

        let shutdown = Arc::new(Notify::new());
        let task = tokio::spawn(run_server_loop(listener, state, Arc::clone(&shutdown)));

        Ok(Self {
            local_addr,
            shutdown,
            task,
        })
    }

    /// Address actually bound, useful when the configured port is 0
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Close the listener and wait for the accept loop to finish
    pub async fn stop(self) {
        // notify_one stores a permit, so a stop before the loop first polls is not lost
        self.shutdown.notify_one();
        self.wait().await;
    }

    /// Wait until the accept loop ends
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            logger::log_error(&format!("Server loop ended abnormally: {e}"));
        }
    }
}

/// Accept connections until `shutdown` is notified.
///
/// Finished connection tasks are reaped as the loop goes so the set only
/// holds live connections. On shutdown the listener is dropped first, then
/// remaining connections are aborted.
async fn run_server_loop(listener: TcpListener, state: Arc<AppState>, shutdown: Arc<Notify>) {
    let active_connections = Arc::new(AtomicUsize::new(0));
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            biased;

            () = shutdown.notified() => break,

            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                            &mut tasks,
                        );
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    if e.is_panic() {
                        logger::log_error(&format!("Connection task panicked: {e}"));
                    }
                }
            }
        }
    }

    drop(listener);
    logger::log_shutdown(tasks.len());
    tasks.shutdown().await;
}
