//! Image decoding and tensor encoding.

use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;

use crate::error::{Error, Result};

use super::{ImageTensor, RGB_CHANNELS};

/// Decode uploaded bytes into an image, guessing the container from its magic bytes.
///
/// # Errors
///
/// Returns [`Error::InvalidImage`] if the bytes are not a supported image.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|source| Error::InvalidImage { source })
}

/// Convert a `DynamicImage` to a normalized NHWC tensor.
///
/// The image is:
/// 1. Converted to RGB (grayscale is replicated, alpha dropped)
/// 2. Resized to `size`x`size` with bilinear filtering, ignoring aspect ratio
/// 3. Normalized to [-1, 1] range
/// 4. Returned as NHWC tensor (1, size, size, 3)
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn image_to_tensor(img: &DynamicImage, size: u32) -> ImageTensor {
    let resized = img.resize_exact(size, size, FilterType::Triangle);
    let rgb = resized.to_rgb8();

    let side = size as usize;
    let mut tensor = Array4::<f32>::zeros((1, side, side, RGB_CHANNELS));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..RGB_CHANNELS {
            tensor[[0, y as usize, x as usize, c]] = normalize(pixel[c]);
        }
    }

    tensor
}

/// Normalize an 8-bit channel value from [0, 255] to [-1, 1].
#[inline]
#[must_use]
pub fn normalize(value: u8) -> f32 {
    f32::from(value) / 127.5 - 1.0
}
