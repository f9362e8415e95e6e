//! Raw TCP greeting: write a fixed payload and close.

use std::time::Duration;

use tokio::io::AsyncWriteExt;

use crate::config::ServerConfig;
use crate::error::HandlerError;
use crate::handler::ConnectionHandler;
use crate::net::Connection;
use crate::resilience::timeouts::with_timeout;

/// Payload sent to every client.
pub const GREETING_TEXT: &str = "Welcome to the matrix\r\n";

/// [`GREETING_TEXT`] as bytes, as written on the wire.
pub const GREETING: &[u8] = GREETING_TEXT.as_bytes();

/// Writes [`GREETING`] and closes the connection. Nothing is read from the peer.
#[derive(Debug, Clone, Default)]
pub struct GreetingHandler {
    write_timeout: Option<Duration>,
}

impl GreetingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            write_timeout: config.write_timeout(),
        }
    }
}

impl ConnectionHandler for GreetingHandler {
    async fn handle(&self, mut conn: Connection) -> Result<(), HandlerError> {
        tracing::info!(connection_id = %conn.id, "New connection ({})", conn.peer_addr);

        with_timeout(self.write_timeout, async {
            conn.stream.write_all(GREETING).await?;
            conn.stream.shutdown().await?;
            Ok::<_, HandlerError>(())
        })
        .await
    }
}
