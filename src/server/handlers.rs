//! Request handlers for image generation and health checks.

use std::time::SystemTime;

use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};

use super::{ApiError, SharedState};
use crate::error::Error;
use crate::image::OutputFormat;

/// Multipart field carrying the photo.
const IMAGE_FIELD: &str = "imageInput";

/// Form field selecting the output container.
const FORMAT_FIELD: &str = "output_format";

// ============================================================================
// Health Check
// ============================================================================

pub async fn health_check() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

// ============================================================================
// Image Generation
// ============================================================================

#[derive(Debug, Default)]
struct Upload {
    image: Option<Bytes>,
    output_format: Option<String>,
}

/// Keep the status the multipart parser reports, so an oversized body stays a 413.
fn multipart_error(context: &str, err: &MultipartError) -> ApiError {
    let status = err.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(status, format!("Upload too large: {}", err.body_text()))
    } else {
        ApiError::new(status, format!("{context}: {}", err.body_text()))
    }
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut upload = Upload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Malformed multipart body", &e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            IMAGE_FIELD => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("Failed to read upload", &e))?;
                upload.image = Some(bytes);
            }
            FORMAT_FIELD => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error("Failed to read output_format", &e))?;
                upload.output_format = Some(value);
            }
            _ => tracing::debug!("Ignoring multipart field {name:?}"),
        }
    }

    Ok(upload)
}

pub async fn process_image(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let started = SystemTime::now();

    // A body that is not multipart at all carries no upload either.
    let Ok(multipart) = multipart else {
        return Err(Error::MissingUpload.into());
    };
    let upload = read_upload(multipart).await?;

    let image = upload.image.ok_or(Error::MissingUpload)?;
    let format = match upload.output_format.as_deref() {
        Some(requested) => requested.parse::<OutputFormat>()?,
        None => OutputFormat::default(),
    };

    tracing::info!("Processing {} byte upload as {format}", image.len());

    let worker_state = state.clone();
    let generated = tokio::task::spawn_blocking(move || {
        let generated = worker_state.pipeline.process(&image, format)?;
        worker_state.store.save(&generated.bytes, format, started)?;
        Ok::<_, Error>(generated)
    })
    .await
    .map_err(|e| {
        tracing::error!("Generation worker failed: {e}");
        ApiError::internal(e)
    })??;

    Ok((
        [(header::CONTENT_TYPE, format.mime_type())],
        generated.bytes,
    )
        .into_response())
}
