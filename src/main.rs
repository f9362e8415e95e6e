//! Matrix greeting server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client                 ┌──────────────────────────────────────────────┐
//!     ───────────────────────┼─▶ net::listener ─▶ net::server (accept loop) │
//!                            │                        │                     │
//!                            │                        ▼ one task per conn   │
//!                            │             handler::GreetingHandler (tcp)   │
//!     ◀──────────────────────┼──           http::HttpHandler      (http)    │
//!     "Welcome to the matrix"│                                              │
//!                            │  config · lifecycle · observability ·        │
//!                            │  resilience                                  │
//!                            └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use matrix_server::config::{apply_overrides, load_or_default, Protocol};
use matrix_server::lifecycle::{self, signals};
use matrix_server::observability::logging;

/// Matrix greeting server
#[derive(Parser, Debug)]
#[command(name = "matrix-server")]
#[command(version, about = "Greets every connection and shuts down gracefully")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (host:port), overrides the config file
    #[arg(short, long)]
    listen: Option<String>,

    /// Protocol to serve (tcp or http), overrides the config file
    #[arg(short, long)]
    protocol: Option<Protocol>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let loaded = load_or_default(args.config.as_deref())
        .and_then(|config| apply_overrides(config, args.listen, args.protocol));
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging("info");
            tracing::error!("Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        "Listening on {} ({})....",
        config.server.listen_address,
        config.server.protocol
    );

    let server = match lifecycle::start(&config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("while starting server: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = signals::wait_for_termination().await {
        tracing::error!(error = %e, "Failed to listen for termination signals");
    } else {
        tracing::info!("caught signal; shutting down");
    }

    if let Err(e) = server.close().await {
        tracing::error!("while closing server: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
