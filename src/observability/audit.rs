//! Per-request audit trail.
//!
//! Every completed request yields exactly one `AuditRecord`, whatever its
//! outcome. Records are always emitted as tracing events on target `audit`;
//! when a file is configured they are also appended there as JSON lines by
//! a single writer task.

use std::net::SocketAddr;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::protocol::Outcome;

/// One line of the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// `None` when the frame could not be parsed.
    pub query: Option<String>,
    pub client_address: SocketAddr,
    pub outcome: Outcome,
}

impl AuditRecord {
    pub fn new(query: Option<String>, client_address: SocketAddr, outcome: Outcome) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            query,
            client_address,
            outcome,
        }
    }
}

/// Sink for audit records. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    file_tx: Option<mpsc::UnboundedSender<AuditRecord>>,
}

impl AuditLog {
    /// Emit records as tracing events only.
    pub fn tracing_only() -> Self {
        Self::default()
    }

    /// Also append records to `path`.
    ///
    /// The returned handle completes once every clone of the log has been
    /// dropped and the remaining records are flushed.
    pub async fn with_file(path: &Path) -> std::io::Result<(Self, JoinHandle<()>)> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        let (tx, mut rx) = mpsc::unbounded_channel::<AuditRecord>();
        let display_path = path.display().to_string();

        let writer = tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                let mut line = match serde_json::to_string(&record) {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to serialize audit record");
                        continue;
                    }
                };
                line.push('\n');
                if let Err(e) = file.write_all(line.as_bytes()).await {
                    tracing::error!(path = %display_path, error = %e, "Failed to append audit record");
                }
            }
            if let Err(e) = file.flush().await {
                tracing::error!(path = %display_path, error = %e, "Failed to flush audit log");
            }
        });

        tracing::info!(path = %path.display(), "Audit log opened");
        Ok((Self { file_tx: Some(tx) }, writer))
    }

    /// Record one completed request.
    pub fn record(&self, record: AuditRecord) {
        tracing::info!(
            target: "audit",
            request_id = %record.request_id,
            query = record.query.as_deref().unwrap_or(""),
            client = %record.client_address,
            outcome = %record.outcome,
            "request completed"
        );

        if let Some(tx) = &self.file_tx {
            if tx.send(record).is_err() {
                tracing::warn!("Audit writer has stopped; record kept in log output only");
            }
        }
    }
}
