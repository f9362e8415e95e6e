//! Startup orchestration.
//!
//! Initialise metrics, pick the per-connection handler for the configured
//! protocol and spawn the server. Any failure here is fatal to the process.

use std::net::SocketAddr;

use crate::config::{AppConfig, Protocol};
use crate::error::Result;
use crate::handler::GreetingHandler;
use crate::http::HttpHandler;
use crate::net::ConnectionServer;
use crate::observability::metrics;

/// Start a server for `config`. Must be called from within a Tokio runtime.
pub async fn start(config: &AppConfig) -> Result<ConnectionServer> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = &config.server;
    match server.protocol {
        Protocol::Tcp => ConnectionServer::spawn(server, GreetingHandler::from_config(server)).await,
        Protocol::Http => ConnectionServer::spawn(server, HttpHandler::from_config(server)).await,
    }
}
