//! Request context and request-id middleware.
//!
//! # Responsibilities
//! - Attach the accepting connection's identity to every request
//! - Generate an `x-request-id` when the client sent none, and echo it back

use std::net::SocketAddr;

use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::net::ConnectionId;

/// Header carrying the request id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Identity of the connection a request arrived on, inserted as a request
/// extension by the connection's service.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub peer_addr: SocketAddr,
}

pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}
