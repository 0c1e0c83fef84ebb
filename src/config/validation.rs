//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses parse and value ranges are sane
//! - Reject empty service identity fields
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: expected host:port, got {value:?}")]
    InvalidEndpoint { field: &'static str, value: String },

    #[error("{field}: must not be empty")]
    Empty { field: &'static str },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("logging.filter: invalid directive {0:?}")]
    InvalidFilter(String),
}

/// Check a parsed configuration, collecting every problem.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "listener.request_timeout_secs",
        });
    }

    let telemetry = &config.telemetry;
    if telemetry.enabled {
        if split_host_port(&telemetry.endpoint).is_none() {
            errors.push(ValidationError::InvalidEndpoint {
                field: "telemetry.endpoint",
                value: telemetry.endpoint.clone(),
            });
        }
        if telemetry.metrics_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAddress {
                field: "telemetry.metrics_address",
                value: telemetry.metrics_address.clone(),
            });
        }
    }
    for (field, value) in [
        ("telemetry.service_name", &telemetry.service_name),
        ("telemetry.service_version", &telemetry.service_version),
        ("telemetry.environment", &telemetry.environment),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::Empty { field });
        }
    }

    if EnvFilter::try_new(&config.logging.filter).is_err() {
        errors.push(ValidationError::InvalidFilter(config.logging.filter.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Split `host:port`, where host is a name, an IPv4 address or a
/// bracketed IPv6 address and port is non-zero.
pub fn split_host_port(endpoint: &str) -> Option<(&str, u16)> {
    let (host, port) = endpoint.rsplit_once(':')?;
    let port = port.parse::<u16>().ok().filter(|p| *p != 0)?;

    let valid_host = if let Some(ip) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        ip.parse::<std::net::Ipv6Addr>().is_ok()
    } else {
        !host.is_empty()
            && host
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_')
    };

    valid_host.then_some((host, port))
}
