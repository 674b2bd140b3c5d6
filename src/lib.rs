//! # `sketchgen`
//!
//! Turns photographs into generated images: each upload is reduced to a binary pencil sketch
//! with classical filters, then rendered by a pretrained image-to-image generator running on
//! ONNX Runtime.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use sketchgen::image::OutputFormat;
//! use sketchgen::model::OnnxGenerator;
//! use sketchgen::{Config, Pipeline};
//!
//! # fn main() -> sketchgen::Result<()> {
//! let generator = Arc::new(OnnxGenerator::load("generator_final1.onnx")?);
//! let pipeline = Pipeline::new(&Config::default(), generator)?;
//!
//! let photo = std::fs::read("photo.jpg")?;
//! let generated = pipeline.process(&photo, OutputFormat::Png)?;
//! std::fs::write("generated.png", &generated.bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod image;
pub mod model;
pub mod pipeline;
pub mod server;
pub mod store;

pub use error::{Error, Result};
pub use pipeline::{Config, Generated, Pipeline};
