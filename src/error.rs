//! Errors surfaced by the server and its connection handlers.
//!
//! Only [`ServerError`] ever reaches the caller of `spawn`/`close`.
//! [`HandlerError`] stays inside the per-connection task where it is logged.

use std::time::Duration;

use thiserror::Error;

/// Errors returned from `ConnectionServer::spawn` and `ConnectionServer::close`.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be acquired.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The accept loop owning the listening socket did not shut down cleanly.
    #[error("failed to close listener: {0}")]
    Close(#[from] tokio::task::JoinError),
}

/// Errors raised while serving a single connection.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type alias for server operations.
pub type Result<T, E = ServerError> = std::result::Result<T, E>;
