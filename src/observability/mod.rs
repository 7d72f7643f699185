//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Request handler produces:
//!     → audit.rs (one AuditRecord per completed request)
//!         → tracing target `audit`
//!         → optional JSON-lines file
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event for machine parsing
//! - Metrics are cheap (no-ops until an exporter is installed)
//! - The audit file has a single writer, fed over a channel

pub mod audit;
pub mod logging;
pub mod metrics;

pub use audit::{AuditLog, AuditRecord};
