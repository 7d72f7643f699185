//! Lookup server setup.
//!
//! # Responsibilities
//! - Wire the request handler, audit sink and worker pool together
//! - Serve one request/response exchange per connection
//! - Drain in-flight connections on shutdown

pub mod handler;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::config::{ListenerConfig, ServerConfig};
use crate::content::ContentProvider;
use crate::net::connection::{read_frame, Frame};
use crate::net::{
    Accepted, ConnectionAcceptor, ConnectionError, ConnectionTracker, Listener, ServeConnection,
    WorkerPool,
};
use crate::observability::AuditLog;
use crate::protocol::Outcome;

pub use handler::RequestHandler;

/// Serves a single connection: read frame, handle, write response, close.
#[derive(Debug)]
pub struct ConnectionService {
    handler: RequestHandler,
    audit: AuditLog,
    read_timeout: Duration,
}

impl ConnectionService {
    pub fn new(handler: RequestHandler, audit: AuditLog, read_timeout: Duration) -> Self {
        Self {
            handler,
            audit,
            read_timeout,
        }
    }

    async fn exchange(
        &self,
        stream: &mut TcpStream,
        peer: SocketAddr,
    ) -> Result<Outcome, ConnectionError> {
        let (response, record) = match read_frame(stream, self.read_timeout).await? {
            Frame::Complete(frame) => self.handler.handle(&frame, peer).await,
            Frame::Oversized => self.handler.handle_oversized(peer),
        };
        let outcome = record.outcome;

        let written = async {
            stream.write_all(response.as_bytes()).await?;
            stream.shutdown().await
        }
        .await;

        // The request was handled even if the client left before the reply.
        self.audit.record(record);
        written?;
        Ok(outcome)
    }
}

impl ServeConnection for ConnectionService {
    fn serve(&self, conn: Accepted) -> impl Future<Output = ()> + Send {
        let span = tracing::info_span!(
            "connection",
            id = %conn.guard.id(),
            peer = %conn.peer
        );

        async move {
            let Accepted {
                mut stream,
                peer,
                guard,
            } = conn;

            match self.exchange(&mut stream, peer).await {
                Ok(outcome) => tracing::debug!(%outcome, "Request served"),
                Err(e) => tracing::warn!(error = %e, "Connection closed without a complete exchange"),
            }
            drop(guard);
        }
        .instrument(span)
    }
}

/// The line-lookup TCP server.
pub struct LookupServer {
    service: Arc<ConnectionService>,
    listener_config: ListenerConfig,
}

impl LookupServer {
    /// Create a server over an already-built content provider.
    pub fn new(
        config: Arc<ServerConfig>,
        content: ContentProvider,
        audit: AuditLog,
        listener_config: ListenerConfig,
    ) -> Self {
        let handler = RequestHandler::new(config, content);
        let service = ConnectionService::new(
            handler,
            audit,
            Duration::from_millis(listener_config.read_timeout_ms),
        );
        Self {
            service: Arc::new(service),
            listener_config,
        }
    }

    /// Accept connections until shutdown, then drain in-flight work.
    pub async fn run(self, listener: Listener, shutdown: broadcast::Receiver<()>) {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "Lookup server starting");
        }

        let tracker = ConnectionTracker::new();
        let (dispatcher, pool) = WorkerPool::spawn(
            self.listener_config.workers,
            self.listener_config.backlog,
            self.listener_config.overflow,
            self.service,
        );

        ConnectionAcceptor::new(listener, dispatcher, tracker.clone())
            .run(shutdown)
            .await;

        let drain = Duration::from_secs(self.listener_config.drain_timeout_secs);
        if tokio::time::timeout(drain, pool.join()).await.is_err() {
            tracing::warn!(
                remaining = tracker.active_count(),
                "Drain timed out, abandoning open connections"
            );
        }

        tracing::info!("Lookup server stopped");
    }
}
