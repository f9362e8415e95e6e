//! Matrix greeting server library.
//!
//! Accepts TCP connections, answers each with a fixed greeting (raw or over
//! HTTP) and shuts down gracefully, waiting for in-flight connections.

pub mod config;
pub mod error;
pub mod events;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;

pub use config::{AppConfig, Protocol, ServerConfig};
pub use error::{HandlerError, ServerError};
pub use handler::{ConnectionHandler, GreetingHandler, GREETING};
pub use http::HttpHandler;
pub use lifecycle::Shutdown;
pub use net::ConnectionServer;
