//! Main pipeline: decode, sketch, generate, encode.

use std::sync::Arc;
use std::time::Instant;

use ::image::{DynamicImage, GrayImage};

use crate::error::{Error, Result};
use crate::image::{self, OutputFormat, GENERATOR_IMAGE_SIZE};
use crate::model::Generator;

/// Configuration for the generation pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Square side the sketch is resized to before inference.
    pub input_size: u32,

    /// Prefer the generator's declared input size over `input_size` when it declares one.
    pub follow_model_shape: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_size: GENERATOR_IMAGE_SIZE,
            follow_model_shape: true,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(Error::InvalidParameter {
                name: "input_size".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone)]
pub struct Generated {
    /// Decoded generator output, RGBA for PNG and RGB otherwise.
    pub image: DynamicImage,
    /// `image` encoded in `format`.
    pub bytes: Vec<u8>,
    /// Container of `bytes`.
    pub format: OutputFormat,
}

/// Photo to sketch to generated image.
pub struct Pipeline {
    generator: Arc<dyn Generator>,
    input_size: u32,
}

impl Pipeline {
    /// Create a new pipeline around a loaded generator.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the generator declares a non-square
    /// input while `follow_model_shape` is set.
    pub fn new(config: &Config, generator: Arc<dyn Generator>) -> Result<Self> {
        config.validate()?;

        let input_size = match generator.input_size() {
            Some((h, w)) if config.follow_model_shape => {
                if h != w {
                    return Err(Error::InvalidParameter {
                        name: "input_size".to_string(),
                        reason: format!("generator declares a non-square input {h}x{w}"),
                    });
                }
                if h != config.input_size {
                    tracing::warn!(
                        "Generator declares {h}x{w} input, overriding configured {}",
                        config.input_size
                    );
                }
                h
            }
            Some((h, w)) if (h, w) != (config.input_size, config.input_size) => {
                tracing::warn!(
                    "Generator declares {h}x{w} input but pipeline resizes to {0}x{0}",
                    config.input_size
                );
                config.input_size
            }
            _ => config.input_size,
        };

        tracing::info!("Pipeline initialized with {input_size}x{input_size} generator input");

        Ok(Self {
            generator,
            input_size,
        })
    }

    /// Side length sketches are resized to before inference.
    #[must_use]
    pub const fn input_size(&self) -> u32 {
        self.input_size
    }

    /// Decode `bytes` and convert the photo into a pencil sketch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidImage`] if the bytes are not a decodable image.
    pub fn sketch(&self, bytes: &[u8]) -> Result<GrayImage> {
        let photo = image::decode_image(bytes)?;
        Ok(image::sketchify(&photo.to_rgb8()))
    }

    /// Run the full pipeline on an uploaded photo.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidImage`] for undecodable uploads, or an internal error if
    /// inference or encoding fails.
    pub fn process(&self, bytes: &[u8], format: OutputFormat) -> Result<Generated> {
        let started = Instant::now();

        let sketch = self.sketch(bytes)?;
        tracing::debug!(
            "Sketched {}x{} photo in {:.1}ms",
            sketch.width(),
            sketch.height(),
            elapsed_ms(started)
        );

        let input = image::image_to_tensor(&DynamicImage::ImageLuma8(sketch), self.input_size);

        let inference_started = Instant::now();
        let output = self.generator.generate(&input)?;
        tracing::debug!("Generator ran in {:.1}ms", elapsed_ms(inference_started));

        let generated = image::tensor_to_image(&output, format)?;
        let bytes = image::encode_image(&generated, format)?;

        tracing::info!(
            "Generated {}x{} {format} ({} bytes) in {:.1}ms",
            generated.width(),
            generated.height(),
            bytes.len(),
            elapsed_ms(started)
        );

        Ok(Generated {
            image: generated,
            bytes,
            format,
        })
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
