//! Connection identity, tracking and framed reads.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Track active connections for metrics and shutdown
//! - Read the single request frame of a connection under a deadline

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use crate::observability::metrics;
use crate::security::limits::MAX_PAYLOAD_SIZE;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Errors that end a single connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("client sent nothing within {0:?}")]
    ReadTimeout(Duration),

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// Counts connections between accept and close.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    /// Create a new connection tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new active connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        let count = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::record_active_connections(count);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::new(),
        }
    }

    /// Get current active connection count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }
}

/// Guard that tracks a connection's lifetime.
/// Decrements active count when dropped, including during a panic unwind.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let remaining = self.active_count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::record_active_connections(remaining);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}

/// An accepted connection waiting for, or being served by, a worker.
#[derive(Debug)]
pub struct Accepted {
    pub stream: TcpStream,
    pub peer: SocketAddr,
    pub guard: ConnectionGuard,
}

/// How long to wait for bytes past a full-size frame before accepting it.
const OVERSIZE_GRACE: Duration = Duration::from_millis(20);

/// Upper bound on input drained after an oversized frame.
const MAX_DISCARD: usize = 64 * 1024;

/// One inbound request frame.
#[derive(Debug, PartialEq, Eq)]
pub enum Frame {
    /// The bytes of a frame within `MAX_PAYLOAD_SIZE`.
    Complete(Vec<u8>),
    /// The client sent more than `MAX_PAYLOAD_SIZE` bytes.
    Oversized,
}

/// Read one request frame with a single read.
///
/// A client that closes without sending yields an empty frame. Anything
/// longer than `MAX_PAYLOAD_SIZE` is reported as oversized rather than cut.
pub async fn read_frame(
    stream: &mut TcpStream,
    deadline: Duration,
) -> Result<Frame, ConnectionError> {
    let mut buf = [0u8; MAX_PAYLOAD_SIZE + 1];
    let n = tokio::time::timeout(deadline, stream.read(&mut buf))
        .await
        .map_err(|_| ConnectionError::ReadTimeout(deadline))??;

    if n > MAX_PAYLOAD_SIZE {
        discard_pending(stream).await;
        return Ok(Frame::Oversized);
    }
    if n == MAX_PAYLOAD_SIZE {
        let mut extra = [0u8; 1];
        if let Ok(Ok(more)) = tokio::time::timeout(OVERSIZE_GRACE, stream.read(&mut extra)).await {
            if more > 0 {
                discard_pending(stream).await;
                return Ok(Frame::Oversized);
            }
        }
    }
    Ok(Frame::Complete(buf[..n].to_vec()))
}

/// Drop bytes the client already sent past an oversized frame.
///
/// Closing a socket with unread input resets the connection, which can
/// discard the reply before the client reads it.
async fn discard_pending(stream: &mut TcpStream) {
    let mut scratch = [0u8; MAX_PAYLOAD_SIZE];
    let mut budget = MAX_DISCARD;
    while budget > 0 {
        match tokio::time::timeout(OVERSIZE_GRACE, stream.read(&mut scratch)).await {
            Ok(Ok(n)) if n > 0 => budget = budget.saturating_sub(n),
            _ => break,
        }
    }
}
