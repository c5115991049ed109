//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that would otherwise
//! fail late (at bind time, on first log write, inside a probe query).
//! All errors are collected, not just the first.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("logging.{field} must be a non-empty file name segment, got '{value}'")]
    InvalidLogFileSegment { field: &'static str, value: String },

    #[error("logging.marker must not be empty")]
    EmptyMarker,

    #[error("database.url '{0}' is not a sqlite URL")]
    UnsupportedDatabaseUrl(String),

    #[error("database.probe_table '{0}' is not a plain identifier")]
    InvalidProbeTable(String),

    #[error("database.max_connections must be greater than zero")]
    ZeroConnections,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    for (field, value) in [
        ("file_prefix", &config.logging.file_prefix),
        ("extension", &config.logging.extension),
    ] {
        if !is_file_segment(value) {
            errors.push(ValidationError::InvalidLogFileSegment {
                field,
                value: value.clone(),
            });
        }
    }

    if config.logging.marker.trim().is_empty() {
        errors.push(ValidationError::EmptyMarker);
    }

    if !config.database.url.starts_with("sqlite:") {
        errors.push(ValidationError::UnsupportedDatabaseUrl(config.database.url.clone()));
    }

    // The table name is interpolated into the count query.
    if !is_identifier(&config.database.probe_table) {
        errors.push(ValidationError::InvalidProbeTable(config.database.probe_table.clone()));
    }

    if config.database.max_connections == 0 {
        errors.push(ValidationError::ZeroConnections);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_file_segment(value: &str) -> bool {
    !value.is_empty()
        && !value.contains(['/', '\\'])
        && value != "."
        && value != ".."
}

pub(crate) fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
