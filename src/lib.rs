//! TCP line-lookup service.
//!
//! A client sends `allowedRootPath=<path>&string=<query>`; the server
//! answers whether the query occurs in that file, provided the path lies
//! under the configured root.

pub mod config;
pub mod content;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod protocol;
pub mod security;
pub mod server;

pub use config::{LookupConfig, ServerConfig};
pub use lifecycle::Shutdown;
pub use server::LookupServer;
