//! Wire protocol.
//!
//! # Data Flow
//! ```text
//! raw frame (≤ 1024 bytes, NUL padding stripped)
//!     → request.rs (Request or MalformedRequest)
//!     → handler decides an Outcome
//!     → response.rs (Outcome → response literal)
//! ```
//!
//! # Design Decisions
//! - One request and one response per connection
//! - Responses carry no trailing newline
//! - Parsing never panics on client input

pub mod request;
pub mod response;

pub use request::{MalformedRequest, Request};
pub use response::Outcome;
