//! Request timing middleware.

use std::time::Instant;

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

/// Response header carrying the handler duration in seconds.
pub const PROCESS_TIME_HEADER: &str = "x-process-time";

/// Logs each request and stamps the response with its processing time.
pub async fn process_time(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    tracing::info!(%method, %path, "request received");

    let mut response = next.run(request).await;

    let elapsed = start.elapsed().as_secs_f64();
    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_secs = elapsed,
        "request completed"
    );
    if let Ok(value) = HeaderValue::from_str(&format!("{elapsed:.6}")) {
        response.headers_mut().insert(PROCESS_TIME_HEADER, value);
    }
    response
}
