//! Generator model loading and inference.

mod loader;

pub use loader::{OnnxGenerator, DEFAULT_MODEL_PATH};

use crate::error::Result;
use crate::image::ImageTensor;

/// A pretrained image-to-image generator.
///
/// Implementations take a normalized NHWC batch `(1, H, W, 3)` in [-1, 1] and return a tensor of
/// the same layout. The generator is loaded once and shared read-only between requests.
pub trait Generator: Send + Sync {
    /// Fixed spatial input `(height, width)` declared by the model, if any.
    fn input_size(&self) -> Option<(u32, u32)>;

    /// Run one forward pass.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or the output has an unexpected shape.
    fn generate(&self, input: &ImageTensor) -> Result<ImageTensor>;
}
