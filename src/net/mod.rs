//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop)
//!     → connection.rs (ID, tracking guard)
//!     → pool.rs (bounded queue → fixed worker set)
//!     → ServeConnection (one request, one response, close)
//!
//! Connection States:
//!     Accepted → Queued → Serving → Closed
//!                  └──── Rejected (overflow = reject, queue full)
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection tracked for graceful shutdown
//! - Exactly one exchange per connection; no keep-alive

pub mod connection;
pub mod listener;
pub mod pool;

pub use connection::{Accepted, ConnectionError, ConnectionTracker, Frame};
pub use listener::{ConnectionAcceptor, Listener, ListenerError};
pub use pool::{Dispatcher, ServeConnection, WorkerPool};
