use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// One structured log line per request. Rejected requests (4xx) log at
/// `warn`, server failures at `error`.
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let query = req.uri().query().map(str::to_owned);

    let start = Instant::now();
    let response = next.run(req).await;
    let latency_us = start.elapsed().as_micros() as u64;

    let status = response.status();
    let query = query.as_deref().unwrap_or("");
    if status.is_server_error() {
        tracing::error!(%method, %path, query, status = status.as_u16(), latency_us, "request");
    } else if status.is_client_error() {
        tracing::warn!(%method, %path, query, status = status.as_u16(), latency_us, "request");
    } else {
        tracing::info!(%method, %path, query, status = status.as_u16(), latency_us, "request");
    }

    response
}
