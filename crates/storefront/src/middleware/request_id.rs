//! Request ID middleware for request tracing and correlation.
//!
//! An upstream `x-request-id` is reused when it looks sane; otherwise a UUID
//! v4 is generated. The ID is recorded on the current span, tagged on the
//! Sentry scope and echoed in the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream request ID accepted verbatim.
const MAX_REQUEST_ID_LENGTH: usize = 128;

/// Accept an upstream ID only if it is short, visible ASCII.
fn sanitize(candidate: &str) -> Option<&str> {
    let candidate = candidate.trim();
    let valid = !candidate.is_empty()
        && candidate.len() <= MAX_REQUEST_ID_LENGTH
        && candidate.bytes().all(|b| b.is_ascii_graphic());
    valid.then_some(candidate)
}

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(sanitize)
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    Span::current().record("request_id", &request_id);

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("abc-123"), Some("abc-123"));
        assert_eq!(sanitize("  abc  "), Some("abc"));
        assert_eq!(sanitize(""), None);
        assert_eq!(sanitize("has space"), None);
        assert_eq!(sanitize(&"x".repeat(129)), None);
    }
}
