//! Custom error types for sketchgen.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the sketchgen library.
#[derive(Error, Debug)]
pub enum Error {
    /// The request carried no image upload.
    #[error("No image uploaded")]
    MissingUpload,

    /// The requested output format is not one of the supported containers.
    #[error("unsupported output format {0:?}")]
    UnsupportedFormat(String),

    /// Uploaded bytes could not be decoded as an image.
    #[error("failed to decode image: {source}")]
    InvalidImage {
        #[source]
        source: image::ImageError,
    },

    /// Failed to encode an image into the requested container.
    #[error("failed to encode {format} image: {source}")]
    ImageEncode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The model artifact does not exist.
    #[error("model artifact not found at {path}")]
    ModelNotFound { path: PathBuf },

    /// Failed to load an ONNX model.
    #[error("failed to load ONNX model {path}: {source}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: ort::Error,
    },

    /// Model inference failed.
    #[error("model inference failed: {source}")]
    Inference {
        #[source]
        source: ort::Error,
    },

    /// Failed to create the generated-output directory.
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Shape mismatch in tensor operations.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
}

/// Result type alias for sketchgen operations.
pub type Result<T> = std::result::Result<T, Error>;
