//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. The listen address is
//! only checked for presence, the network stack decides whether it binds.

use std::net::SocketAddr;

use tokio::sync::Semaphore;

use crate::config::schema::AppConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyListenAddress,
    ZeroMaxConnections,
    TooManyConnections(usize),
    UnknownLogLevel(String),
    InvalidMetricsAddress(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyListenAddress => write!(f, "server.listen_address is empty"),
            ValidationError::ZeroMaxConnections => {
                write!(f, "server.max_connections must be greater than 0")
            }
            ValidationError::TooManyConnections(max) => write!(
                f,
                "server.max_connections {} exceeds the limit of {}",
                max,
                Semaphore::MAX_PERMITS
            ),
            ValidationError::UnknownLogLevel(level) => {
                write!(f, "observability.log_level '{}' is not a known level", level)
            }
            ValidationError::InvalidMetricsAddress(addr) => {
                write!(f, "observability.metrics_address '{}' is not a socket address", addr)
            }
        }
    }
}

/// Check a configuration, collecting every error rather than stopping at the first.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.listen_address.trim().is_empty() {
        errors.push(ValidationError::EmptyListenAddress);
    }

    if config.server.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    } else if config.server.max_connections > Semaphore::MAX_PERMITS {
        errors.push(ValidationError::TooManyConnections(config.server.max_connections));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
