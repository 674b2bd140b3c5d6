//! JSON error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::Error;

pub const NO_UPLOAD_MESSAGE: &str = "No image uploaded";
pub const UNSUPPORTED_FORMAT_MESSAGE: &str =
    "Unsupported output format. Use JPEG, PNG, WEBP, or AVIF.";
pub const INVALID_IMAGE_MESSAGE: &str = "Invalid image file.";

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// An error returned to HTTP clients as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Server-side failure; the underlying message is passed through to the client.
    pub fn internal(message: impl std::fmt::Display) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("An internal error occurred: {message}"),
        )
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::MissingUpload => Self::bad_request(NO_UPLOAD_MESSAGE),
            Error::UnsupportedFormat(requested) => {
                tracing::debug!("Rejected output format {requested:?}");
                Self::bad_request(UNSUPPORTED_FORMAT_MESSAGE)
            }
            Error::InvalidImage { source } => {
                tracing::debug!("Rejected upload: {source}");
                Self::bad_request(INVALID_IMAGE_MESSAGE)
            }
            other => {
                tracing::error!("Request failed: {other}");
                Self::internal(other)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}
