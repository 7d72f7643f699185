//! TCP listener and accept loop.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections
//! - Hand each connection to the worker pool
//! - Graceful handling of accept errors

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use crate::config::ListenerConfig;
use crate::net::connection::{Accepted, ConnectionTracker};
use crate::net::pool::{DispatchError, Dispatcher};

/// Pause after a failed accept, so fd exhaustion does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    Bind(std::io::Error),
    /// Failed to accept connection.
    #[error("Failed to accept: {0}")]
    Accept(std::io::Error),
}

/// A bound TCP listener.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Bind to the configured address.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
            ListenerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;

        let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            workers = config.workers,
            backlog = config.backlog,
            "Listener bound"
        );

        Ok(Self { inner: listener })
    }

    /// Accept a new connection.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        self.inner.accept().await.map_err(ListenerError::Accept)
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }
}

/// Owns the listening socket and feeds accepted connections to the workers.
///
/// `Listening → Dispatch → Listening` until shutdown is signalled.
pub struct ConnectionAcceptor {
    listener: Listener,
    dispatcher: Dispatcher,
    tracker: ConnectionTracker,
}

impl ConnectionAcceptor {
    pub fn new(listener: Listener, dispatcher: Dispatcher, tracker: ConnectionTracker) -> Self {
        Self {
            listener,
            dispatcher,
            tracker,
        }
    }

    /// Run the accept loop. Returns once shutdown is signalled or the
    /// worker pool has gone away; the dispatcher is dropped on return.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            let accepted = tokio::select! {
                res = self.listener.accept() => res,
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting");
                    break;
                }
            };

            let (stream, peer) = match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!(error = %e, "Accept failed");
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    continue;
                }
            };

            let guard = self.tracker.track();
            tracing::debug!(
                connection_id = %guard.id(),
                peer_addr = %peer,
                active = self.tracker.active_count(),
                "Connection accepted"
            );

            let conn = Accepted { stream, peer, guard };
            // A full queue under `Wait` parks here, so shutdown must be able
            // to interrupt the dispatch. The pending connection is dropped.
            let dispatched = tokio::select! {
                res = self.dispatcher.dispatch(conn) => res,
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received while queue was full");
                    break;
                }
            };
            match dispatched {
                Ok(()) | Err(DispatchError::Rejected) => {}
                Err(DispatchError::Closed) => {
                    tracing::error!("Worker pool closed, stopping accept loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverflowPolicy;
    use crate::net::pool::{ServeConnection, WorkerPool};
    use std::future::Future;
    use std::sync::Arc;

    struct Holding;

    impl ServeConnection for Holding {
        fn serve(&self, conn: Accepted) -> impl Future<Output = ()> + Send {
            async move {
                let _held = conn;
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
        }
    }

    #[tokio::test]
    async fn shutdown_interrupts_dispatch_on_full_queue() {
        let config = ListenerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            ..ListenerConfig::default()
        };
        let listener = Listener::bind(&config).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let tracker = ConnectionTracker::new();
        let (dispatcher, _pool) = WorkerPool::spawn(1, 1, OverflowPolicy::Wait, Arc::new(Holding));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let acceptor = tokio::spawn(
            ConnectionAcceptor::new(listener, dispatcher, tracker.clone()).run(shutdown_rx),
        );

        // Worker busy, queue slot taken, third connection parks in dispatch.
        let mut clients = Vec::new();
        for _ in 0..3 {
            clients.push(TcpStream::connect(addr).await.unwrap());
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(tracker.active_count(), 3);

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), acceptor)
            .await
            .expect("accept loop ignored shutdown while dispatch was blocked")
            .unwrap();
        assert_eq!(tracker.active_count(), 2);
    }
}
