//! Accept loop with graceful shutdown.
//!
//! # Responsibilities
//! - Bind the listening socket synchronously with `spawn`
//! - Run one accept-loop task, one handler task per connection
//! - On `close`, stop accepting and wait for every handler to return

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{Instrument, Span};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::handler::ConnectionHandler;
use crate::lifecycle::{Shutdown, ShutdownSignal};
use crate::net::connection::{Connection, ConnectionTracker};
use crate::net::listener::{AcceptConnections, AcceptDisposition, Listener};
use crate::observability::metrics;
use crate::resilience::backoff::accept_backoff;
use crate::resilience::timeouts::with_timeout;

/// A running server: a bound listener, its accept loop and the
/// outstanding handlers it spawned.
///
/// Dropping the value without calling [`close`](Self::close) still stops the
/// accept loop, but does not wait for handlers.
#[derive(Debug)]
pub struct ConnectionServer {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    tracker: ConnectionTracker,
    span: Span,
    accept_task: Option<JoinHandle<()>>,
}

impl ConnectionServer {
    /// Bind `config.listen_address` and start accepting connections, each
    /// served by `handler` on its own task.
    ///
    /// Bind failures are returned immediately and leave nothing running.
    pub async fn spawn<H: ConnectionHandler>(config: &ServerConfig, handler: H) -> Result<Self> {
        let listener = Listener::bind(&config.listen_address, config.max_connections)
            .await
            .map_err(|e| ServerError::Bind {
                address: config.listen_address.clone(),
                source: e.into_io_error(),
            })?;

        Self::serve(listener, config, handler)
    }

    /// Start the accept loop over an already bound connection source.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn serve<L, H>(listener: L, config: &ServerConfig, handler: H) -> Result<Self>
    where
        L: AcceptConnections,
        H: ConnectionHandler,
    {
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            address: config.listen_address.clone(),
            source,
        })?;

        let span = config.span.clone().unwrap_or_else(
            || tracing::info_span!("matrix_server", address = %local_addr, protocol = %config.protocol),
        );

        let shutdown = Shutdown::new();
        let tracker = ConnectionTracker::new();

        let accept_task = tokio::spawn(
            accept_loop(
                listener,
                Arc::new(handler),
                tracker.clone(),
                shutdown.subscribe(),
                config.handler_timeout(),
            )
            .instrument(span.clone()),
        );

        span.in_scope(|| {
            tracing::info!(
                address = %local_addr,
                protocol = %config.protocol,
                handler_timeout = ?config.handler_timeout(),
                "Server accepting connections"
            )
        });

        Ok(Self {
            local_addr,
            shutdown,
            tracker,
            span,
            accept_task: Some(accept_task),
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handlers that have started but not yet returned.
    pub fn active_connections(&self) -> u64 {
        self.tracker.active_count()
    }

    /// Connections accepted since spawn.
    pub fn connections_accepted(&self) -> u64 {
        self.tracker.accepted_count()
    }

    /// Stop accepting, then wait for every outstanding handler to finish.
    ///
    /// Handlers are drained even when the accept loop fails to join; that
    /// failure is then returned as [`ServerError::Close`].
    pub async fn close(mut self) -> Result<()> {
        let span = self.span.clone();
        self.drain().instrument(span).await
    }

    async fn drain(&mut self) -> Result<()> {
        tracing::info!(address = %self.local_addr, "Closing listener");
        self.shutdown.trigger();

        let joined = match self.accept_task.take() {
            Some(task) => task.await,
            None => Ok(()),
        };

        tracing::debug!(
            outstanding = self.tracker.active_count(),
            "Waiting for connection handlers to drain"
        );
        self.tracker.wait_for_drain().await;

        tracing::info!(
            address = %self.local_addr,
            connections = self.tracker.accepted_count(),
            "Server closed"
        );
        joined.map_err(ServerError::from)
    }
}

impl Drop for ConnectionServer {
    fn drop(&mut self) {
        if self.accept_task.is_some() {
            self.shutdown.trigger();
        }
    }
}

async fn accept_loop<L: AcceptConnections, H: ConnectionHandler>(
    listener: L,
    handler: Arc<H>,
    tracker: ConnectionTracker,
    mut shutdown: ShutdownSignal,
    handler_timeout: Option<Duration>,
) {
    let mut consecutive_errors: u32 = 0;

    loop {
        let accepted = tokio::select! {
            biased;
            _ = shutdown.recv() => {
                tracing::debug!("Listener closed; accept loop exiting");
                break;
            }
            res = listener.accept() => res,
        };

        let (stream, peer_addr, permit) = match accepted {
            Ok(accepted) => {
                consecutive_errors = 0;
                accepted
            }
            Err(err) => match err.disposition(shutdown.is_triggered()) {
                AcceptDisposition::Retry => {
                    consecutive_errors = consecutive_errors.saturating_add(1);
                    let delay = accept_backoff(consecutive_errors);
                    metrics::record_accept_error("transient");
                    tracing::warn!(error = %err, retry_in = ?delay, "Temporary listener error");
                    tokio::select! {
                        biased;
                        _ = shutdown.recv() => break,
                        _ = tokio::time::sleep(delay) => continue,
                    }
                }
                AcceptDisposition::Shutdown => {
                    tracing::debug!(error = %err, "Listener closed; accept loop exiting");
                    break;
                }
                AcceptDisposition::Fatal => {
                    metrics::record_accept_error("fatal");
                    tracing::error!(error = %err, "Network error; no longer accepting connections");
                    break;
                }
            },
        };

        let guard = tracker.track();
        let conn = Connection {
            id: guard.id(),
            peer_addr,
            stream,
            shutdown: shutdown.clone(),
        };
        let handler = Arc::clone(&handler);
        let span = tracing::info_span!("connection", connection_id = %conn.id, peer_addr = %peer_addr);

        tokio::spawn(
            async move {
                let _permit = permit;
                let _guard = guard;
                let id = conn.id;
                let peer_addr = conn.peer_addr;

                if let Err(e) = with_timeout(handler_timeout, handler.handle(conn)).await {
                    metrics::record_handler_error();
                    tracing::error!(
                        connection_id = %id,
                        peer_addr = %peer_addr,
                        error = %e,
                        "Connection handler failed"
                    );
                }
            }
            .instrument(span),
        );
    }

    listener.close();
}
