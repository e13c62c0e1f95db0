//! Request identification.
//!
//! Each request gets an `x-request-id` (kept if the client sent one) that is
//! echoed on the response and recorded on the trace span.

use axum::http::{HeaderName, Request};
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tracing::Span;

pub const X_REQUEST_ID: &str = "x-request-id";

fn header_name() -> HeaderName {
    HeaderName::from_static(X_REQUEST_ID)
}

/// Assigns a UUID v4 request id when the client did not provide one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(header_name(), MakeRequestUuid)
}

/// Copies the request id onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(header_name())
}

/// Trace span for a request, tagged with its id.
pub fn make_request_span<B>(request: &Request<B>) -> Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    )
}
