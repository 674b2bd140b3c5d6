//! Image decoding, sketch filtering, tensor conversion and encoding utilities.

mod format;
mod load;
mod save;
mod sketch;

pub use format::OutputFormat;
pub use load::{decode_image, image_to_tensor, normalize};
pub use save::{denormalize, encode_image, save_image, tensor_to_image};
pub use sketch::sketchify;

use ndarray::Array4;

/// Image tensor in NHWC format (batch, height, width, channels).
/// Values are normalized to [-1, 1] range for the generator.
pub type ImageTensor = Array4<f32>;

/// Default square input resolution of the generator.
pub const GENERATOR_IMAGE_SIZE: u32 = 512;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;
