//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept, connection limits, error classification)
//!     → server.rs (accept loop, spawn handler task)
//!     → connection.rs (id assignment, outstanding-handler tracking)
//!     → Hand off to ConnectionHandler (raw greeting or HTTP)
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - Each handler tracked so close() can drain
//! - Shutdown is a typed signal checked before classifying accept errors

pub mod connection;
pub mod listener;
pub mod server;

pub use connection::{Connection, ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{AcceptConnections, AcceptDisposition, Accepted, Listener, ListenerError};
pub use server::ConnectionServer;
