//! HTTP connection handler.
//!
//! # Responsibilities
//! - Serve an accepted TCP connection with hyper (HTTP/1.1 and HTTP/2)
//! - Apply transport timeouts (header read, idle keep-alive)
//! - Close gracefully when the server shuts down, so `close` can drain
//!
//! Listener, accept loop and connection bookkeeping are shared with the raw
//! TCP variant; only the per-connection work differs.

use std::time::Duration;

use axum::{extract::Request, Router};
use hyper::body::Incoming;
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::conn::auto,
};
use tower::Service;

use crate::config::ServerConfig;
use crate::error::HandlerError;
use crate::handler::ConnectionHandler;
use crate::http::activity::Activity;
use crate::http::request::ConnectionInfo;
use crate::http::router::build_router;
use crate::net::Connection;

/// How often a connection with an idle timeout checks whether it expired.
const MIN_IDLE_CHECK: Duration = Duration::from_millis(10);

/// Serves HTTP on each accepted connection, one router invocation per request.
#[derive(Debug, Clone)]
pub struct HttpHandler {
    router: Router,
    read_timeout: Option<Duration>,
    idle_timeout: Option<Duration>,
}

impl HttpHandler {
    /// Greeting router with the configured timeouts.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            router: build_router(config.write_timeout()),
            read_timeout: config.read_timeout(),
            idle_timeout: config.idle_timeout(),
        }
    }

    /// Serve a custom router with no transport timeouts.
    pub fn with_router(router: Router) -> Self {
        Self {
            router,
            read_timeout: None,
            idle_timeout: None,
        }
    }

    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

impl ConnectionHandler for HttpHandler {
    async fn handle(&self, conn: Connection) -> Result<(), HandlerError> {
        let Connection {
            id,
            peer_addr,
            stream,
            mut shutdown,
        } = conn;
        tracing::debug!(connection_id = %id, "New connection ({})", peer_addr);

        let info = ConnectionInfo { id, peer_addr };
        let activity = Activity::new();

        let router = self.router.clone();
        let request_activity = activity.clone();
        let service = hyper::service::service_fn(move |mut request: Request<Incoming>| {
            request.extensions_mut().insert(info);
            let busy = request_activity.begin();
            let response = router.clone().call(request);
            async move {
                let response = response.await;
                drop(busy);
                response
            }
        });

        let mut builder = auto::Builder::new(TokioExecutor::new());
        if let Some(timeout) = self.read_timeout {
            builder
                .http1()
                .timer(TokioTimer::new())
                .header_read_timeout(timeout);
        }

        let connection = builder.serve_connection(TokioIo::new(stream), service);
        tokio::pin!(connection);

        let idle_period = self
            .idle_timeout
            .map_or(Duration::from_secs(60), |t| (t / 4).max(MIN_IDLE_CHECK));
        let mut idle_check = tokio::time::interval(idle_period);
        let mut draining = false;

        loop {
            tokio::select! {
                res = connection.as_mut() => {
                    return res.map_err(HandlerError::Http);
                }
                _ = shutdown.recv(), if !draining => {
                    tracing::debug!(connection_id = %id, "Server closing; finishing in-flight requests");
                    connection.as_mut().graceful_shutdown();
                    draining = true;
                }
                _ = idle_check.tick(), if !draining && self.idle_timeout.is_some() => {
                    let idle = activity.idle_for();
                    if self.idle_timeout.is_some_and(|limit| idle >= limit) {
                        tracing::debug!(connection_id = %id, idle = ?idle, "Closing idle connection");
                        connection.as_mut().graceful_shutdown();
                        draining = true;
                    }
                }
            }
        }
    }
}
