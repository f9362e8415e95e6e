//! Connection identity and lifecycle tracking.
//!
//! # Responsibilities
//! - Generate per-server connection IDs for log correlation
//! - Count outstanding connection handlers
//! - Let shutdown wait until every handler has returned

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;

/// Identifier for a connection, unique and increasing within one server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// An accepted connection handed to a `ConnectionHandler`.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub peer_addr: SocketAddr,
    pub stream: TcpStream,
    /// Fires when the server starts shutting down. Handlers doing
    /// long-lived work (HTTP keep-alive) use it to wind down.
    pub shutdown: ShutdownSignal,
}

/// Tracks outstanding connection handlers for graceful shutdown.
///
/// The count lives in a watch channel so waiters are woken on change
/// instead of polling.
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    inner: Arc<TrackerInner>,
}

#[derive(Debug)]
struct TrackerInner {
    /// Next ID to hand out. Relaxed ordering is enough: only uniqueness matters.
    next_id: AtomicU64,
    /// Current count of outstanding handlers.
    active: watch::Sender<u64>,
}

impl ConnectionTracker {
    /// Create a new connection tracker.
    pub fn new() -> Self {
        let (active, _) = watch::channel(0);
        Self {
            inner: Arc::new(TrackerInner {
                next_id: AtomicU64::new(1),
                active,
            }),
        }
    }

    /// Record a new outstanding handler. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        let id = ConnectionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.active.send_modify(|count| *count += 1);
        metrics::record_connection_accepted();
        ConnectionGuard {
            tracker: Arc::clone(&self.inner),
            id,
        }
    }

    /// Get current outstanding handler count.
    pub fn active_count(&self) -> u64 {
        *self.inner.active.borrow()
    }

    /// Total connections tracked so far.
    pub fn accepted_count(&self) -> u64 {
        self.inner.next_id.load(Ordering::Relaxed) - 1
    }

    /// Wait until every outstanding handler has finished.
    pub async fn wait_for_drain(&self) {
        let mut rx = self.inner.active.subscribe();
        // The sender lives in `self.inner`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|count| *count == 0).await;
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that tracks a handler's lifetime.
/// Decrements the outstanding count when dropped, including on panic.
#[derive(Debug)]
pub struct ConnectionGuard {
    tracker: Arc<TrackerInner>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.tracker
            .active
            .send_modify(|count| *count = count.saturating_sub(1));
        metrics::record_connection_closed();
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}
