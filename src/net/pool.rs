//! Fixed-size worker pool fed by a bounded accept queue.
//!
//! # Responsibilities
//! - Queue accepted connections up to the configured backlog
//! - Apply the overflow policy when the queue is full
//! - Serve each connection on its own task, supervised by a worker
//!
//! # Design Decisions
//! - Concurrency is capped at `workers`; nothing is spawned without limit
//! - A panic while serving closes only that connection; the worker survives
//! - Dropping the dispatcher lets workers drain the queue and exit

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::config::OverflowPolicy;
use crate::net::connection::Accepted;
use crate::observability::metrics;

/// Something that serves one accepted connection to completion.
pub trait ServeConnection: Send + Sync + 'static {
    fn serve(&self, conn: Accepted) -> impl Future<Output = ()> + Send;
}

/// Why a connection was not queued.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("worker queue full, connection rejected")]
    Rejected,

    #[error("worker pool has shut down")]
    Closed,
}

/// Sending half of the accept queue.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<Accepted>,
    overflow: OverflowPolicy,
}

impl Dispatcher {
    /// Queue a connection for the workers.
    ///
    /// Under `Wait` this blocks while the queue is full. Under `Reject` the
    /// connection is dropped (and thereby closed) instead.
    pub async fn dispatch(&self, conn: Accepted) -> Result<(), DispatchError> {
        match self.overflow {
            OverflowPolicy::Wait => self.tx.send(conn).await.map_err(|_| DispatchError::Closed),
            OverflowPolicy::Reject => match self.tx.try_send(conn) {
                Ok(()) => Ok(()),
                Err(mpsc::error::TrySendError::Full(conn)) => {
                    tracing::warn!(
                        connection_id = %conn.guard.id(),
                        peer = %conn.peer,
                        "Worker queue full, rejecting connection"
                    );
                    metrics::record_rejected_connection();
                    Err(DispatchError::Rejected)
                }
                Err(mpsc::error::TrySendError::Closed(_)) => Err(DispatchError::Closed),
            },
        }
    }
}

/// Handles of the running workers.
#[derive(Debug)]
pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `workers` tasks reading from a queue of `backlog` slots.
    pub fn spawn<S: ServeConnection>(
        workers: usize,
        backlog: usize,
        overflow: OverflowPolicy,
        service: Arc<S>,
    ) -> (Dispatcher, Self) {
        let (tx, rx) = mpsc::channel(backlog.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let handles = (0..workers.max(1))
            .map(|id| {
                let rx = Arc::clone(&rx);
                let service = Arc::clone(&service);
                tokio::spawn(worker_loop(id, rx, service))
            })
            .collect();

        tracing::info!(workers, backlog, ?overflow, "Worker pool started");
        (Dispatcher { tx, overflow }, Self { workers: handles })
    }

    /// Wait for every worker to exit.
    pub async fn join(self) {
        for handle in self.workers {
            let _ = handle.await;
        }
    }
}

async fn worker_loop<S: ServeConnection>(
    worker: usize,
    rx: Arc<Mutex<mpsc::Receiver<Accepted>>>,
    service: Arc<S>,
) {
    loop {
        let next = rx.lock().await.recv().await;
        let Some(conn) = next else {
            break;
        };

        let connection_id = conn.guard.id();
        let peer = conn.peer;
        let service = Arc::clone(&service);
        let task = tokio::spawn(async move { service.serve(conn).await });

        if let Err(e) = task.await {
            if e.is_panic() {
                tracing::error!(
                    worker,
                    connection_id = %connection_id,
                    peer = %peer,
                    "Connection handler panicked, connection closed"
                );
            }
        }
    }
    tracing::debug!(worker, "Worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::connection::ConnectionTracker;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::net::{TcpListener, TcpStream};

    struct Counting {
        served: AtomicUsize,
        panic_on_first: bool,
    }

    impl ServeConnection for Counting {
        fn serve(&self, _conn: Accepted) -> impl Future<Output = ()> + Send {
            let n = self.served.fetch_add(1, Ordering::SeqCst);
            let panic_now = self.panic_on_first && n == 0;
            async move {
                if panic_now {
                    panic!("boom");
                }
            }
        }
    }

    async fn accepted(listener: &TcpListener, tracker: &ConnectionTracker) -> (TcpStream, Accepted) {
        let client = TcpStream::connect(listener.local_addr().unwrap()).await.unwrap();
        let (stream, peer) = listener.accept().await.unwrap();
        let conn = Accepted {
            stream,
            peer,
            guard: tracker.track(),
        };
        (client, conn)
    }

    #[tokio::test]
    async fn panicking_connection_does_not_kill_worker() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let tracker = ConnectionTracker::new();
        let service = Arc::new(Counting {
            served: AtomicUsize::new(0),
            panic_on_first: true,
        });
        let (dispatcher, pool) = WorkerPool::spawn(1, 4, OverflowPolicy::Wait, Arc::clone(&service));

        let mut clients = Vec::new();
        for _ in 0..3 {
            let (client, conn) = accepted(&listener, &tracker).await;
            clients.push(client);
            dispatcher.dispatch(conn).await.unwrap();
        }
        drop(dispatcher);
        pool.join().await;

        assert_eq!(service.served.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.active_count(), 0);
    }

    struct Stalling;

    impl ServeConnection for Stalling {
        fn serve(&self, conn: Accepted) -> impl Future<Output = ()> + Send {
            async move {
                let _held = conn;
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
        }
    }

    #[tokio::test]
    async fn reject_policy_drops_overflow() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let tracker = ConnectionTracker::new();
        let (dispatcher, _pool) =
            WorkerPool::spawn(1, 1, OverflowPolicy::Reject, Arc::new(Stalling));

        let (_c1, conn1) = accepted(&listener, &tracker).await;
        dispatcher.dispatch(conn1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let (_c2, conn2) = accepted(&listener, &tracker).await;
        dispatcher.dispatch(conn2).await.unwrap();

        let (_c3, conn3) = accepted(&listener, &tracker).await;
        assert_eq!(dispatcher.dispatch(conn3).await, Err(DispatchError::Rejected));
        assert_eq!(tracker.active_count(), 2);
    }
}
