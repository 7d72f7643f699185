//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming frame:
//!     → limits.rs (size cap, padding strip)
//!     → protocol parse
//!     → access_control.rs (canonicalize, segment-aligned root check)
//!         → paths.rs (lenient canonicalization)
//!     → Pass AuthorizedPath to content
//! ```
//!
//! # Design Decisions
//! - Fail closed: any canonicalization error denies
//! - No trust in client input: paths are compared by segment, never by string prefix

pub mod access_control;
pub mod limits;
pub mod paths;

pub use access_control::{authorize, AuthorizedPath};
