use axum::{extract::Request, middleware::Next, response::Response};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Wraps each request in a span carrying a fresh request id.
pub async fn trace_request(request: Request, next: Next) -> Response {
    let span = info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %request.method(),
        path = %request.uri().path(),
    );
    async move {
        let response = next.run(request).await;
        info!(status = response.status().as_u16(), "Request handled");
        response
    }
    .instrument(span)
    .await
}
