//! Per-connection protocol handlers.
//!
//! # Data Flow
//! ```text
//! accept loop (net/server.rs)
//!     → Connection { id, peer_addr, stream, shutdown }
//!     → ConnectionHandler::handle (greeting.rs for raw TCP, http/ for HTTP)
//!     → handler returns; outstanding count drops
//! ```
//!
//! # Design Decisions
//! - One trait for both variants so they share listener and shutdown bookkeeping
//! - Handlers own the stream; returning from `handle` closes it

pub mod greeting;

use std::future::Future;

use crate::error::HandlerError;
use crate::net::Connection;

pub use greeting::{GreetingHandler, GREETING, GREETING_TEXT};

/// Strategy invoked once per accepted connection, on its own task.
pub trait ConnectionHandler: Send + Sync + 'static {
    fn handle(&self, conn: Connection) -> impl Future<Output = Result<(), HandlerError>> + Send;
}
