//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (parsing handles syntax)
//! - Validate value ranges (workers, backlog and timeouts > 0)
//! - Validate socket addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FileConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::FileConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} is not a socket address: '{value}'")]
    BadAddress { field: &'static str, value: String },
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &FileConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let listener = &config.listener;
    if listener.workers == 0 {
        errors.push(ValidationError::Zero { field: "listener.workers" });
    }
    if listener.backlog == 0 {
        errors.push(ValidationError::Zero { field: "listener.backlog" });
    }
    if listener.read_timeout_ms == 0 {
        errors.push(ValidationError::Zero { field: "listener.read_timeout_ms" });
    }
    if listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadAddress {
            field: "listener.bind_address",
            value: listener.bind_address.clone(),
        });
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::BadAddress {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
