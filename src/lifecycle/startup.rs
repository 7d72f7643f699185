//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Load the content cache before any traffic is accepted
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::{ConfigError, LookupConfig};
use crate::content::ContentProvider;
use crate::lifecycle::Shutdown;
use crate::net::{Listener, ListenerError};
use crate::observability::{metrics, AuditLog};
use crate::server::LookupServer;

/// Anything that stops the server from coming up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("listener error: {0}")]
    Listener(#[from] ListenerError),

    #[error("cannot open audit log: {0}")]
    Audit(std::io::Error),
}

/// A started server.
#[derive(Debug)]
pub struct Running {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    server: JoinHandle<()>,
    audit_writer: Option<JoinHandle<()>>,
    drain_timeout: Duration,
}

impl Running {
    /// Address the server actually listens on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// A handle that stops the server when triggered.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Stop accepting, drain, and wait for the server to finish.
    pub async fn shutdown(self) {
        self.shutdown.trigger();
        self.wait().await;
    }

    /// Wait until the server stops on its own shutdown signal.
    pub async fn wait(self) {
        if let Err(e) = self.server.await {
            tracing::error!(error = %e, "Server task failed");
        }
        if let Some(writer) = self.audit_writer {
            if tokio::time::timeout(self.drain_timeout, writer).await.is_err() {
                tracing::warn!("Audit writer did not finish in time");
            }
        }
    }
}

/// Bring the server up from a resolved configuration.
pub async fn start(config: LookupConfig) -> Result<Running, StartupError> {
    let LookupConfig {
        server,
        listener: listener_config,
        observability,
    } = config;

    if observability.metrics_enabled {
        match observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let (audit, audit_writer) = match &observability.audit_log {
        Some(path) => {
            let (log, writer) = AuditLog::with_file(path).await.map_err(StartupError::Audit)?;
            (log, Some(writer))
        }
        None => (AuditLog::tracing_only(), None),
    };

    let server_config = Arc::new(server);
    let content = ContentProvider::from_config(&server_config).await;

    let listener = Listener::bind(&listener_config).await?;
    let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

    let shutdown = Shutdown::new();
    let drain_timeout = Duration::from_secs(listener_config.drain_timeout_secs);
    let lookup = LookupServer::new(server_config, content, audit, listener_config);
    let server = tokio::spawn(lookup.run(listener, shutdown.subscribe()));

    Ok(Running {
        local_addr,
        shutdown,
        server,
        audit_writer,
        drain_timeout,
    })
}
