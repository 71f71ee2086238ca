//! TCP accept loop of the log service.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use loghub_store::SharedLogStore;
use parking_lot::RwLock;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace, warn};

use crate::config::ServerConfig;
use crate::error::{HandlerError, ServerError, ServerResult};
use crate::handler::{handle_connection, ConnectionState, HandlerLimits, Outcome};

/// Pause after a failed `accept` before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Lifecycle of the service as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Not accepting connections.
    Stopped,
    /// Bound and accepting connections.
    Listening,
}

/// Cloneable control handle for a running [`LogServer`].
#[derive(Debug, Clone)]
pub struct ServerHandle {
    shutdown_tx: mpsc::Sender<()>,
    state: Arc<RwLock<ServiceState>>,
    local_addr: SocketAddr,
}

impl ServerHandle {
    /// Asks the server to stop accepting and abort in-flight connections.
    ///
    /// Calling this on a server that already stopped, or more than once,
    /// does nothing.
    pub fn shutdown(&self) {
        match self.shutdown_tx.try_send(()) {
            Ok(()) => debug!(addr = %self.local_addr, "Shutdown requested"),
            Err(mpsc::error::TrySendError::Full(())) => {
                debug!(addr = %self.local_addr, "Shutdown already pending");
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                debug!(addr = %self.local_addr, "Server already stopped");
            }
        }
    }

    /// Get the current service state.
    #[must_use]
    pub fn state(&self) -> ServiceState {
        *self.state.read()
    }

    /// Get the address the server is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// The log service: a bound listener plus the store every connection uses.
pub struct LogServer {
    config: Arc<ServerConfig>,
    store: SharedLogStore,
    listener: TcpListener,
    local_addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: mpsc::Receiver<()>,
    state: Arc<RwLock<ServiceState>>,
}

impl std::fmt::Debug for LogServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogServer")
            .field("local_addr", &self.local_addr)
            .field("config", &self.config)
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

impl LogServer {
    /// Validates `config` and binds the listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the address
    /// cannot be bound.
    pub async fn bind(config: ServerConfig, store: SharedLogStore) -> ServerResult<Self> {
        config.validate()?;

        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|e| ServerError::BindFailed(config.bind_addr, e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::BindFailed(config.bind_addr, e))?;

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        info!(addr = %local_addr, "Log server listening");

        Ok(Self {
            config: Arc::new(config),
            store,
            listener,
            local_addr,
            shutdown_tx,
            shutdown_rx,
            state: Arc::new(RwLock::new(ServiceState::Listening)),
        })
    }

    /// Get the address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get a handle to control the server once [`serve`](Self::serve) owns it.
    #[must_use]
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shutdown_tx: self.shutdown_tx.clone(),
            state: Arc::clone(&self.state),
            local_addr: self.local_addr,
        }
    }

    /// Accepts connections until a shutdown is requested.
    ///
    /// Every connection is served on its own task. When the limit of
    /// concurrent connections is reached, new connections are closed
    /// immediately.
    ///
    /// # Errors
    ///
    /// Accept failures are logged and do not end the loop; this currently
    /// always returns `Ok` once shut down.
    pub async fn serve(self) -> ServerResult<()> {
        let Self {
            config,
            store,
            listener,
            local_addr,
            shutdown_tx,
            mut shutdown_rx,
            state,
        } = self;
        // Held so `recv` only completes on an explicit shutdown.
        let _shutdown_tx = shutdown_tx;

        let limits = HandlerLimits::from(config.as_ref());
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            reap_finished(&mut tasks);
                            if tasks.len() >= config.max_connections {
                                warn!(
                                    peer = %peer_addr,
                                    current = tasks.len(),
                                    max = config.max_connections,
                                    "Connection rejected: max connections reached"
                                );
                                drop(stream);
                                continue;
                            }
                            tasks.spawn(serve_connection(
                                stream,
                                peer_addr,
                                Arc::clone(&store),
                                limits,
                            ));
                        }
                        Err(e) => back_off_after_accept_error(&e).await,
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        let in_flight = tasks.len();
        tasks.shutdown().await;
        drop(listener);
        *state.write() = ServiceState::Stopped;

        info!(addr = %local_addr, aborted = in_flight, "Log server stopped");
        Ok(())
    }
}

/// Joins connection tasks that already ended so they stop counting against
/// `max_connections`.
fn reap_finished(tasks: &mut JoinSet<()>) {
    while let Some(joined) = tasks.try_join_next() {
        if let Err(e) = joined {
            error!(error = %e, "Connection task failed");
        }
    }
}

/// `EMFILE` and similar accept errors last until other connections close.
async fn back_off_after_accept_error(e: &std::io::Error) {
    warn!(error = %e, backoff_ms = ACCEPT_BACKOFF.as_millis() as u64, "Failed to accept connection");
    tokio::time::sleep(ACCEPT_BACKOFF).await;
}

async fn serve_connection(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    store: SharedLogStore,
    limits: HandlerLimits,
) {
    debug!(peer = %peer_addr, "New connection");

    match handle_connection(&mut stream, store.as_ref(), limits).await {
        Ok(Outcome::Submitted(id)) => debug!(peer = %peer_addr, id = %id, "Entry stored"),
        Ok(Outcome::Answered { status, entries }) => {
            debug!(peer = %peer_addr, ?status, entries, "Query answered");
        }
        Err(e @ (HandlerError::Store(_) | HandlerError::Encode(_))) => {
            warn!(peer = %peer_addr, error = %e, "Request failed");
        }
        Err(e) => debug!(peer = %peer_addr, error = %e, "Request dropped"),
    }

    drop(stream);
    trace!(peer = %peer_addr, state = ?ConnectionState::Closed);
}
