//! Refuses cross-origin requests from origins outside the allow-list.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::ApiError;

#[derive(Debug)]
pub struct AllowedOrigins(Vec<HeaderValue>);

impl AllowedOrigins {
    pub fn new(origins: Vec<HeaderValue>) -> Self {
        Self(origins)
    }

    fn allows(&self, origin: &HeaderValue) -> bool {
        self.0.iter().any(|allowed| allowed == origin)
    }
}

/// Requests without an `Origin` header (same-origin tools, curl) pass through.
pub async fn reject_foreign_origin(
    State(allowed): State<Arc<AllowedOrigins>>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(origin) = request.headers().get(header::ORIGIN) {
        if !allowed.allows(origin) {
            tracing::warn!("Refused request from origin {origin:?}");
            return ApiError::new(StatusCode::FORBIDDEN, "Origin not allowed").into_response();
        }
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_exact_match_only() {
        let allowed = AllowedOrigins::new(vec![HeaderValue::from_static("http://localhost:3000")]);

        assert!(allowed.allows(&HeaderValue::from_static("http://localhost:3000")));
        assert!(!allowed.allows(&HeaderValue::from_static("http://localhost:3002")));
        assert!(!allowed.allows(&HeaderValue::from_static("https://localhost:3000")));
    }
}
