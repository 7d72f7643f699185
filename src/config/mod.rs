//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (key=value lines or TOML)
//!     → loader.rs (parse into FileConfig)
//!     → validation.rs (semantic checks)
//!     → loader.rs (canonicalize root)
//!     → LookupConfig (validated, immutable)
//!     → ServerConfig shared via Arc to every handler
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - All fields except the root have defaults to allow minimal configs
//! - Validation separates syntactic (parsing) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    FileConfig, ListenerConfig, LookupConfig, ObservabilityConfig, OverflowPolicy, ServerConfig,
};
