//! Shared utilities for integration tests.

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use matrix_server::error::HandlerError;
use matrix_server::handler::{ConnectionHandler, GREETING};
use matrix_server::net::{AcceptConnections, Accepted, Connection, ConnectionId, Listener, ListenerError};
use matrix_server::{ConnectionServer, GreetingHandler, ServerConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Config bound to an ephemeral loopback port.
#[allow(dead_code)]
pub fn loopback_config() -> ServerConfig {
    ServerConfig::new("127.0.0.1:0")
}

/// Start the plain greeting server on an ephemeral port.
#[allow(dead_code)]
pub async fn start_greeting_server() -> ConnectionServer {
    ConnectionServer::spawn(&loopback_config(), GreetingHandler::new())
        .await
        .unwrap()
}

/// Connect, read until the server closes, return everything received.
#[allow(dead_code)]
pub async fn read_all(addr: SocketAddr) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut received = Vec::new();
    stream.read_to_end(&mut received).await.unwrap();
    received
}

/// Poll `check` until it holds or `limit` passes.
#[allow(dead_code)]
pub async fn wait_until<F: Fn() -> bool>(check: F, limit: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}

/// Handler that records connection ids and waits `delay` before greeting.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct SlowHandler {
    pub delay: Duration,
    pub seen: Arc<Mutex<Vec<ConnectionId>>>,
}

impl SlowHandler {
    #[allow(dead_code)]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            seen: Arc::default(),
        }
    }

    #[allow(dead_code)]
    pub fn seen_ids(&self) -> Vec<ConnectionId> {
        self.seen.lock().unwrap().clone()
    }
}

impl ConnectionHandler for SlowHandler {
    async fn handle(&self, mut conn: Connection) -> Result<(), HandlerError> {
        self.seen.lock().unwrap().push(conn.id);
        tokio::time::sleep(self.delay).await;
        conn.stream.write_all(GREETING).await?;
        conn.stream.shutdown().await?;
        Ok(())
    }
}

/// Listener wrapper that fails chosen accept calls.
///
/// Each `accept` pops one entry: `Some(kind)` fails with that error kind,
/// `None` (or an empty queue) accepts from the real listener.
#[allow(dead_code)]
pub struct FaultyListener {
    inner: Listener,
    faults: Mutex<VecDeque<Option<io::ErrorKind>>>,
}

impl FaultyListener {
    #[allow(dead_code)]
    pub async fn bind(faults: impl IntoIterator<Item = Option<io::ErrorKind>>) -> Self {
        Self {
            inner: Listener::bind("127.0.0.1:0", 64).await.unwrap(),
            faults: Mutex::new(faults.into_iter().collect()),
        }
    }
}

impl AcceptConnections for FaultyListener {
    async fn accept(&self) -> Result<Accepted, ListenerError> {
        let fault = self.faults.lock().unwrap().pop_front().flatten();
        match fault {
            Some(kind) => Err(ListenerError::Accept(kind.into())),
            None => self.inner.accept().await,
        }
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    fn close(&self) {
        self.inner.close()
    }
}
