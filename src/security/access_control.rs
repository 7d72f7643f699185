//! Path authorization.
//!
//! A requested path is allowed when its canonical form equals the configured
//! root or lies beneath it. The comparison is per path segment, so a root of
//! `/data` never admits `/data2/x`.

use std::path::{Path, PathBuf};

use crate::config::ServerConfig;
use crate::security::paths::canonicalize_lenient;

/// A canonical path that passed authorization.
///
/// Only [`authorize`] can produce one, so content is never read for a path
/// that was not checked first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedPath(PathBuf);

impl AuthorizedPath {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self(path)
    }

    /// The canonical absolute path.
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for AuthorizedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Check `requested` against the configured root.
///
/// Returns `None` when the path falls outside the root or cannot be
/// canonicalized. A file that does not exist below the root is still
/// authorized.
pub async fn authorize(requested: &str, config: &ServerConfig) -> Option<AuthorizedPath> {
    let canonical = match canonicalize_lenient(Path::new(requested)).await {
        Ok(p) => p,
        Err(e) => {
            tracing::debug!(path = %requested, error = %e, "Path canonicalization failed");
            return None;
        }
    };

    if is_within_root(&canonical, &config.allowed_root_path) {
        Some(AuthorizedPath::new(canonical))
    } else {
        tracing::debug!(
            path = %canonical.display(),
            root = %config.allowed_root_path.display(),
            "Path outside allowed root"
        );
        None
    }
}

/// Segment-aligned containment check on already canonical paths.
pub fn is_within_root(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}
