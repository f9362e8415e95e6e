//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the matrix server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener and connection handling settings.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Wire protocol spoken on accepted connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Write the greeting on the raw TCP stream and close.
    #[default]
    Tcp,
    /// Serve HTTP/1.1 and HTTP/2, answering every request with the greeting.
    Http,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Http => write!(f, "http"),
        }
    }
}

impl std::str::FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "http" => Ok(Protocol::Http),
            other => Err(format!("unknown protocol '{}' (expected tcp or http)", other)),
        }
    }
}

/// Server configuration. Immutable once the server is spawned.
///
/// Timeouts are in milliseconds; `0` disables the timeout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "localhost:2319").
    pub listen_address: String,

    /// Protocol served on accepted connections.
    pub protocol: Protocol,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    /// HTTP only: how long to wait for a request's headers.
    pub read_timeout_ms: u64,

    /// Deadline for writing the greeting (TCP) or producing a response (HTTP).
    pub write_timeout_ms: u64,

    /// HTTP only: close keep-alive connections idle for this long.
    pub idle_timeout_ms: u64,

    /// Upper bound on a single connection handler's lifetime.
    pub handler_timeout_ms: u64,

    /// Span every server event is recorded under. Defaults to a
    /// `matrix_server` span tagged with the bound address.
    #[serde(skip)]
    pub span: Option<tracing::Span>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "localhost:2319".to_string(),
            protocol: Protocol::Tcp,
            max_connections: 10_000,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            idle_timeout_ms: 0,
            handler_timeout_ms: 30_000,
            span: None,
        }
    }
}

impl ServerConfig {
    /// Create a config listening on `addr` with every other field defaulted.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            listen_address: addr.into(),
            ..Self::default()
        }
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        millis(self.write_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        millis(self.idle_timeout_ms)
    }

    pub fn handler_timeout(&self) -> Option<Duration> {
        millis(self.handler_timeout_ms)
    }

    /// Record server events under `span` instead of the default one.
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = Some(span);
        self
    }
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
