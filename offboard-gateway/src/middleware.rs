//! Request middleware: correlation ids, tracing spans and CORS.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use offboard_core::CorrelationId;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::Span;

use crate::state::SharedState;

/// Response header carrying the request's correlation id.
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Assign a [`CorrelationId`], expose it to handlers through request
/// extensions and echo it in the response headers.
pub async fn correlate(State(state): State<SharedState>, mut request: Request, next: Next) -> Response {
    let id = state.counter.next_id();
    request.extensions_mut().insert(id);

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

/// Span for `TraceLayer`, tagged with the correlation id set by [`correlate`].
pub fn make_span(request: &Request) -> Span {
    let correlation_id = request
        .extensions()
        .get::<CorrelationId>()
        .map(ToString::to_string)
        .unwrap_or_default();
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        correlation_id = %correlation_id,
    )
}

/// CORS for the orchestrator. Answers every `OPTIONS` request itself,
/// advertising `POST, GET, OPTIONS`.
#[must_use]
pub fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let origin = if allowed_origin == "*" {
        AllowOrigin::any()
    } else {
        match HeaderValue::from_str(allowed_origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                tracing::warn!(allowed_origin, error = %e, "unusable allowed origin, allowing any");
                AllowOrigin::any()
            }
        }
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
}
