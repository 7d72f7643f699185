//! Configuration loading from disk.
//!
//! Files ending in `.toml` are deserialized directly. Anything else is read
//! as flat `key=value` lines, the format the service has always shipped
//! with (`linuxpath=...`, `rereadOnQuery=...`). The root may also be
//! spelled `allowedRootPath`, matching the request key.

use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::{FileConfig, LookupConfig, ServerConfig};
use crate::config::validation::{validate_config, ValidationError};
use crate::security::paths::canonicalize_lenient;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("line {line}: expected key=value, got '{content}'")]
    Syntax { line: usize, content: String },

    #[error("line {line}: invalid value for {key}: {reason}")]
    InvalidValue {
        line: usize,
        key: String,
        reason: String,
    },

    #[error("configuration does not specify a root (linuxpath)")]
    MissingRoot,

    #[error("cannot resolve root path {path}: {source}")]
    Root {
        path: String,
        source: std::io::Error,
    },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, validate and resolve configuration from a file.
pub async fn load_config(path: &Path) -> Result<LookupConfig, ConfigError> {
    let content = tokio::fs::read_to_string(path).await?;
    let is_toml = path.extension().is_some_and(|ext| ext == "toml");

    let raw = if is_toml {
        toml::from_str(&content)?
    } else {
        parse_key_values(&content)?
    };

    resolve(raw).await
}

/// Validate a parsed configuration and canonicalize its root.
pub async fn resolve(raw: FileConfig) -> Result<LookupConfig, ConfigError> {
    validate_config(&raw).map_err(ConfigError::Validation)?;

    // An empty root would resolve to the working directory.
    let root = raw
        .search
        .root
        .filter(|root| !root.to_string_lossy().trim().is_empty())
        .ok_or(ConfigError::MissingRoot)?;
    let allowed_root_path =
        canonicalize_lenient(&root)
            .await
            .map_err(|source| ConfigError::Root {
                path: root.display().to_string(),
                source,
            })?;

    Ok(LookupConfig {
        server: ServerConfig {
            allowed_root_path,
            reread_on_query: raw.search.reread_on_query,
        },
        listener: raw.listener,
        observability: raw.observability,
    })
}

/// Parse flat `key=value` lines onto the config schema.
///
/// Blank lines and `#` comments are skipped; unknown keys are ignored with
/// a warning. Only the first `=` separates key from value.
pub fn parse_key_values(content: &str) -> Result<FileConfig, ConfigError> {
    let mut config = FileConfig::default();

    for (index, raw_line) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::Syntax {
            line: line_no,
            content: line.to_string(),
        })?;
        let key = key.trim();
        let value = value.trim();

        match key {
            "linuxpath" | "allowedRootPath" => config.search.root = Some(value.into()),
            "rereadOnQuery" | "reread_on_query" => {
                config.search.reread_on_query = parse_value(line_no, key, value)?
            }
            "bind_address" => config.listener.bind_address = value.to_string(),
            "workers" => config.listener.workers = parse_value(line_no, key, value)?,
            "backlog" => config.listener.backlog = parse_value(line_no, key, value)?,
            "overflow" => config.listener.overflow = parse_value(line_no, key, value)?,
            "read_timeout_ms" => {
                config.listener.read_timeout_ms = parse_value(line_no, key, value)?
            }
            "drain_timeout_secs" => {
                config.listener.drain_timeout_secs = parse_value(line_no, key, value)?
            }
            "log_level" => config.observability.log_level = value.to_string(),
            "metrics_enabled" => {
                config.observability.metrics_enabled = parse_value(line_no, key, value)?
            }
            "metrics_address" => config.observability.metrics_address = value.to_string(),
            "audit_log" => config.observability.audit_log = Some(value.into()),
            other => {
                tracing::warn!(line = line_no, key = %other, "Ignoring unknown config key");
            }
        }
    }

    Ok(config)
}

fn parse_value<T>(line: usize, key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    // Booleans in the legacy format are case-insensitive ("True", "FALSE").
    let lowered = value.to_ascii_lowercase();
    lowered.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        line,
        key: key.to_string(),
        reason: e.to_string(),
    })
}
