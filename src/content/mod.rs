//! Content acquisition and search.
//!
//! # Data Flow
//! ```text
//! AuthorizedPath + query
//!     → ContentProvider
//!         - fresh read: read file now (sees external writes)
//!         - cached: look up text loaded at startup (cache.rs)
//!     → contains() (single linear scan)
//!     → bool
//! ```
//!
//! # Design Decisions
//! - Policy is chosen once from `ServerConfig::reread_on_query`
//! - Read failures count as "not found"; clients never learn whether a
//!   file exists beyond what authorization already tells them
//! - Simulated latency exists only behind the `latency-injection` feature

pub mod cache;
#[cfg(feature = "latency-injection")]
pub mod latency;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::ServerConfig;
use crate::observability::metrics;
use crate::security::AuthorizedPath;

pub use cache::ContentCache;

/// Error reading content from storage.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Read a whole file as text, replacing invalid UTF-8.
pub async fn read_text(path: &Path) -> Result<String, ContentError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ContentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Case-sensitive exact substring containment.
pub fn contains(haystack: &str, needle: &str) -> bool {
    haystack.contains(needle)
}

#[derive(Debug, Clone)]
enum Policy {
    FreshRead,
    Cached(Arc<ContentCache>),
}

/// Supplies the text a query is matched against.
#[derive(Debug, Clone)]
pub struct ContentProvider {
    policy: Policy,
    #[cfg(feature = "latency-injection")]
    latency: Option<latency::InjectedLatency>,
}

impl ContentProvider {
    /// Read the target from storage on every search.
    pub fn fresh_read() -> Self {
        Self::with_policy(Policy::FreshRead)
    }

    /// Serve every search from a cache built at startup.
    pub fn cached(cache: Arc<ContentCache>) -> Self {
        Self::with_policy(Policy::Cached(cache))
    }

    fn with_policy(policy: Policy) -> Self {
        Self {
            policy,
            #[cfg(feature = "latency-injection")]
            latency: None,
        }
    }

    /// Build the provider selected by the configuration.
    ///
    /// In cached mode this is where the one and only load happens.
    pub async fn from_config(config: &ServerConfig) -> Self {
        let provider = if config.reread_on_query {
            Self::fresh_read()
        } else {
            let cache = ContentCache::load(&config.allowed_root_path).await;
            metrics::record_cache_size(cache.total_bytes());
            Self::cached(Arc::new(cache))
        };
        tracing::info!(
            policy = provider.policy_name(),
            root = %config.allowed_root_path.display(),
            "Content policy selected"
        );
        provider
    }

    /// Delay every search by a simulated storage cost.
    #[cfg(feature = "latency-injection")]
    pub fn with_injected_latency(mut self, latency: latency::InjectedLatency) -> Self {
        self.latency = Some(latency);
        self
    }

    #[cfg(feature = "latency-injection")]
    async fn simulate_latency(&self) {
        if let Some(latency) = &self.latency {
            latency.apply().await;
        }
    }

    #[cfg(not(feature = "latency-injection"))]
    async fn simulate_latency(&self) {}

    /// Short label for logs and metrics.
    pub fn policy_name(&self) -> &'static str {
        match self.policy {
            Policy::FreshRead => "fresh_read",
            Policy::Cached(_) => "cached",
        }
    }

    /// Whether `query` occurs in the content at `path`.
    pub async fn search(&self, path: &AuthorizedPath, query: &str) -> bool {
        self.simulate_latency().await;

        match &self.policy {
            Policy::FreshRead => match read_text(path.as_path()).await {
                Ok(text) => contains(&text, query),
                Err(e) => {
                    tracing::debug!(error = %e, "Read failed, answering not found");
                    false
                }
            },
            Policy::Cached(cache) => cache
                .get(path.as_path())
                .is_some_and(|text| contains(text, query)),
        }
    }
}
