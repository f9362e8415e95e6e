//! Axum router answering every request with the greeting.

use std::time::Duration;

use axum::{extract::Request, Router};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::handler::GREETING_TEXT;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, ConnectionInfo};
use crate::observability::metrics;

/// Build the router with all middleware layers.
///
/// Every method, including extension methods, on every path reaches
/// [`greet`]. `response_timeout` bounds how long a request may take to
/// produce its response (408 on expiry).
#[allow(deprecated)]
pub fn build_router(response_timeout: Option<Duration>) -> Router {
    let router = Router::new().fallback(greet);

    let router = match response_timeout {
        Some(timeout) => router.layer(TimeoutLayer::new(timeout)),
        None => router,
    };

    router
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}

/// Log the request and return the greeting with `200 OK`.
async fn greet(request: Request) -> &'static str {
    let method = request.method();
    let path = request.uri().path();
    metrics::record_http_request(method.as_str());

    match request.extensions().get::<ConnectionInfo>() {
        Some(info) => tracing::info!(
            connection_id = %info.id,
            peer_addr = %info.peer_addr,
            method = %method,
            path = %path,
            "New request"
        ),
        None => tracing::info!(method = %method, path = %path, "New request"),
    }

    GREETING_TEXT
}
