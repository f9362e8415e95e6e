//! TCP listener implementation with backpressure.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections
//! - Enforce max_connections limit via semaphore
//! - Classify accept errors (retry, shutdown, fatal)

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind(io::Error),
    /// Failed to accept connection.
    Accept(io::Error),
    /// The listener stopped handing out connections.
    Closed,
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
            ListenerError::Accept(e) => write!(f, "Failed to accept: {}", e),
            ListenerError::Closed => write!(f, "Listener closed"),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Bind(e) | ListenerError::Accept(e) => Some(e),
            ListenerError::Closed => None,
        }
    }
}

impl ListenerError {
    /// Unwrap the underlying OS error, synthesising one for [`ListenerError::Closed`].
    pub fn into_io_error(self) -> io::Error {
        match self {
            ListenerError::Bind(e) | ListenerError::Accept(e) => e,
            ListenerError::Closed => io::Error::new(io::ErrorKind::NotConnected, "listener closed"),
        }
    }
}

/// What the accept loop should do after an accept error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptDisposition {
    /// Temporary condition; back off and accept again.
    Retry,
    /// The server is shutting down; leave the loop quietly.
    Shutdown,
    /// Unrecoverable; leave the loop and log.
    Fatal,
}

impl ListenerError {
    /// Classify an accept error.
    ///
    /// The shutdown flag wins over the error itself: once shutdown is
    /// triggered, every error is the expected consequence of closing.
    pub fn disposition(&self, shutting_down: bool) -> AcceptDisposition {
        if shutting_down {
            return AcceptDisposition::Shutdown;
        }
        match self {
            ListenerError::Closed => AcceptDisposition::Shutdown,
            ListenerError::Accept(e) if is_transient(e) => AcceptDisposition::Retry,
            ListenerError::Accept(_) | ListenerError::Bind(_) => AcceptDisposition::Fatal,
        }
    }
}

/// Whether an accept error is a temporary condition worth retrying.
///
/// Covers peers that vanished between SYN and accept, interrupted calls,
/// and descriptor or buffer exhaustion.
pub fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    ) || is_resource_exhaustion(e)
}

#[cfg(unix)]
fn is_resource_exhaustion(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM)
    )
}

#[cfg(not(unix))]
fn is_resource_exhaustion(_: &io::Error) -> bool {
    false
}

/// A bounded TCP listener that limits concurrent connections.
///
/// Uses a semaphore to enforce `max_connections`. When the limit is reached,
/// new connections wait in the kernel backlog until a slot becomes available.
pub struct Listener {
    /// The underlying TCP listener.
    inner: TcpListener,
    /// Semaphore to limit concurrent connections.
    connection_limit: Arc<Semaphore>,
}

impl Listener {
    /// Bind to `address` with connection limits.
    ///
    /// The address is resolved by the network stack, so host names such as
    /// `localhost:2319` are accepted. `max_connections` must lie in
    /// `1..=Semaphore::MAX_PERMITS`; anything else fails with `InvalidInput`.
    pub async fn bind(address: &str, max_connections: usize) -> Result<Self, ListenerError> {
        if max_connections == 0 || max_connections > Semaphore::MAX_PERMITS {
            return Err(ListenerError::Bind(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "max_connections must be between 1 and {}, got {}",
                    Semaphore::MAX_PERMITS,
                    max_connections
                ),
            )));
        }

        let listener = TcpListener::bind(address)
            .await
            .map_err(ListenerError::Bind)?;

        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            max_connections,
            "Listener bound"
        );

        Ok(Self {
            inner: listener,
            connection_limit: Arc::new(Semaphore::new(max_connections)),
        })
    }

    /// Accept a new connection, respecting the connection limit.
    ///
    /// This will wait if the connection limit has been reached.
    /// Returns the stream and a permit that must be held for the connection's lifetime.
    pub async fn accept(&self) -> Result<Accepted, ListenerError> {
        // Acquire permit first (backpressure)
        let permit = self
            .connection_limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ListenerError::Closed)?;

        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(
            peer_addr = %addr,
            available_permits = self.connection_limit.available_permits(),
            "Connection accepted"
        );

        Ok((stream, addr, ConnectionPermit { _permit: permit }))
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, io::Error> {
        self.inner.local_addr()
    }

    /// Get current available connection slots.
    pub fn available_permits(&self) -> usize {
        self.connection_limit.available_permits()
    }

    /// Stop handing out connection slots. Pending and future `accept` calls
    /// fail with [`ListenerError::Closed`].
    pub fn close(&self) {
        self.connection_limit.close();
    }
}

/// A connection handed out by an [`AcceptConnections`] source.
pub type Accepted = (TcpStream, SocketAddr, ConnectionPermit);

/// Source of connections driven by the accept loop.
///
/// [`Listener`] is the production implementation. Wrappers can inject
/// accept errors or rewrite addresses around it.
pub trait AcceptConnections: Send + Sync + 'static {
    fn accept(&self) -> impl Future<Output = Result<Accepted, ListenerError>> + Send;

    fn local_addr(&self) -> io::Result<SocketAddr>;

    /// Stop handing out connections; called once the accept loop exits.
    fn close(&self);
}

impl AcceptConnections for Listener {
    fn accept(&self) -> impl Future<Output = Result<Accepted, ListenerError>> + Send {
        Listener::accept(self)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Listener::local_addr(self)
    }

    fn close(&self) {
        Listener::close(self)
    }
}

/// A permit representing a connection slot.
///
/// When dropped, the connection slot is released back to the pool.
/// This keeps backpressure correct even if the connection handler panics.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
}
