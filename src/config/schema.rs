//! Configuration schema definitions.
//!
//! `FileConfig` mirrors what is written on disk (TOML tables, or the flat
//! legacy keys mapped onto them). `LookupConfig` is the resolved,
//! immutable form handed to the rest of the server.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration as read from a config file, before path resolution.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FileConfig {
    /// Search root and content policy.
    pub search: SearchConfig,

    /// Listener and worker pool settings.
    pub listener: ListenerConfig,

    /// Logging, metrics and audit settings.
    pub observability: ObservabilityConfig,
}

/// Search settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SearchConfig {
    /// The single path queries may target (file or directory).
    #[serde(alias = "linuxpath", alias = "allowedRootPath")]
    pub root: Option<PathBuf>,

    /// Re-read the target on every query instead of caching at startup.
    #[serde(alias = "rereadOnQuery")]
    pub reread_on_query: bool,
}

/// What the accept loop does when the worker queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Stop accepting until a slot frees up.
    #[default]
    Wait,
    /// Close the new connection immediately.
    Reject,
}

impl std::str::FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wait" => Ok(OverflowPolicy::Wait),
            "reject" => Ok(OverflowPolicy::Reject),
            other => Err(format!("unknown overflow policy '{}'", other)),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8888").
    pub bind_address: String,

    /// Number of worker tasks serving connections.
    pub workers: usize,

    /// Accepted connections allowed to wait for a worker.
    pub backlog: usize,

    /// Behaviour when the backlog is full.
    pub overflow: OverflowPolicy,

    /// Deadline for the inbound request read, in milliseconds.
    pub read_timeout_ms: u64,

    /// Grace period for in-flight connections on shutdown, in seconds.
    pub drain_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8888".to_string(),
            workers: 64,
            backlog: 1024,
            overflow: OverflowPolicy::Wait,
            read_timeout_ms: 5_000,
            drain_timeout_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Append audit records as JSON lines to this file.
    pub audit_log: Option<PathBuf>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
            audit_log: None,
        }
    }
}

/// Immutable search configuration shared by every request handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Absolute, canonical root path.
    pub allowed_root_path: PathBuf,

    /// Fresh-read policy when true, load-once cache when false.
    pub reread_on_query: bool,
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub server: ServerConfig,
    pub listener: ListenerConfig,
    pub observability: ObservabilityConfig,
}
