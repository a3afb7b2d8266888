//! Request logging.

use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{error, info};

/// Log each request: `info` below 400, `error` otherwise.
pub async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if status.as_u16() < 400 {
        info!(%method, %path, status = status.as_u16(), elapsed_ms, "request");
    } else {
        error!(%method, %path, status = status.as_u16(), elapsed_ms, "request");
    }

    response
}
