//! Tensor decoding and image encoding utilities.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageBuffer, Rgb};

use crate::error::{Error, Result};

use super::{ImageTensor, OutputFormat, RGB_CHANNELS};

/// Convert a normalized NHWC tensor to a displayable image.
///
/// The tensor is:
/// 1. Checked to be a single-sample RGB batch (1, H, W, 3)
/// 2. Denormalized from [-1, 1] to [0, 255] with rounding and clamping
/// 3. Converted to RGBA for PNG output, RGB otherwise
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the tensor is not (1, H, W, 3).
#[allow(clippy::cast_possible_truncation)]
pub fn tensor_to_image(tensor: &ImageTensor, format: OutputFormat) -> Result<DynamicImage> {
    let (batch, height, width, channels) = tensor.dim();
    if batch != 1 || channels != RGB_CHANNELS {
        return Err(Error::ShapeMismatch {
            expected: "(1, H, W, 3)".to_string(),
            actual: format!("{:?}", tensor.shape()),
        });
    }

    let width_px = u32::try_from(width).map_err(|_| Error::ShapeMismatch {
        expected: "width fitting in u32".to_string(),
        actual: width.to_string(),
    })?;
    let height_px = u32::try_from(height).map_err(|_| Error::ShapeMismatch {
        expected: "height fitting in u32".to_string(),
        actual: height.to_string(),
    })?;

    let img = ImageBuffer::from_fn(width_px, height_px, |x, y| {
        let (x, y) = (x as usize, y as usize);
        Rgb([
            denormalize(tensor[[0, y, x, 0]]),
            denormalize(tensor[[0, y, x, 1]]),
            denormalize(tensor[[0, y, x, 2]]),
        ])
    });

    let rgb = DynamicImage::ImageRgb8(img);
    Ok(if format.has_alpha() {
        DynamicImage::ImageRgba8(rgb.to_rgba8())
    } else {
        rgb
    })
}

/// Denormalize a value from [-1, 1] to [0, 255] with rounding and clamping.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn denormalize(value: f32) -> u8 {
    // NaN saturates to 0 through the `as` cast.
    let scaled = ((value + 1.0) * 127.5).round();
    scaled.clamp(0.0, 255.0) as u8
}

/// Encode an image into the requested container.
///
/// # Errors
///
/// Returns [`Error::ImageEncode`] if the encoder rejects the image.
pub fn encode_image(image: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, format.image_format())
        .map_err(|source| Error::ImageEncode {
            format: format.name(),
            source,
        })?;
    Ok(buffer.into_inner())
}

/// Encode an image and write it to `path`.
///
/// # Errors
///
/// Returns an error if the image cannot be encoded or the file cannot be written.
pub fn save_image<P: AsRef<Path>>(
    image: &DynamicImage,
    path: P,
    format: OutputFormat,
) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode_image(image, format)?;
    std::fs::write(path, bytes).map_err(|source| Error::ImageSave {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::normalize;
    use ndarray::Array4;

    #[test]
    fn test_denormalize() {
        assert_eq!(denormalize(-1.0), 0);
        assert_eq!(denormalize(0.0), 128);
        assert_eq!(denormalize(1.0), 255);
    }

    #[test]
    fn test_denormalize_clamp() {
        assert_eq!(denormalize(-2.0), 0);
        assert_eq!(denormalize(2.0), 255);
        assert_eq!(denormalize(f32::NAN), 0);
    }

    #[test]
    fn test_scalar_round_trip_is_exact() {
        for v in 0..=u8::MAX {
            assert_eq!(denormalize(normalize(v)), v, "value {v}");
        }
    }

    #[test]
    fn test_png_is_rgba() {
        let tensor = Array4::<f32>::zeros((1, 8, 6, 3));
        let img = tensor_to_image(&tensor, OutputFormat::Png).unwrap();

        assert!(matches!(img, DynamicImage::ImageRgba8(_)));
        assert_eq!((img.width(), img.height()), (6, 8));
    }

    #[test]
    fn test_other_formats_are_rgb() {
        let tensor = Array4::<f32>::zeros((1, 4, 4, 3));
        for format in [OutputFormat::Jpeg, OutputFormat::Webp, OutputFormat::Avif] {
            let img = tensor_to_image(&tensor, format).unwrap();
            assert!(matches!(img, DynamicImage::ImageRgb8(_)));
        }
    }

    #[test]
    fn test_rejects_bad_shape() {
        let batched = Array4::<f32>::zeros((2, 4, 4, 3));
        assert!(matches!(
            tensor_to_image(&batched, OutputFormat::Jpeg),
            Err(Error::ShapeMismatch { .. })
        ));

        let nchw = Array4::<f32>::zeros((1, 3, 4, 4));
        assert!(tensor_to_image(&nchw, OutputFormat::Jpeg).is_err());
    }

    #[test]
    fn test_encode_png_decodes_back() {
        let tensor = Array4::<f32>::from_elem((1, 5, 7, 3), 0.5);
        let img = tensor_to_image(&tensor, OutputFormat::Png).unwrap();
        let bytes = encode_image(&img, OutputFormat::Png).unwrap();

        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Png);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (7, 5));
        assert_eq!(decoded.to_rgba8().get_pixel(0, 0).0, [191, 191, 191, 255]);
    }

    #[test]
    fn test_encode_lossy_formats() {
        let img = DynamicImage::new_rgb8(16, 16);

        let jpeg = encode_image(&img, OutputFormat::Jpeg).unwrap();
        assert_eq!(image::guess_format(&jpeg).unwrap(), image::ImageFormat::Jpeg);

        let webp = encode_image(&img, OutputFormat::Webp).unwrap();
        assert_eq!(image::guess_format(&webp).unwrap(), image::ImageFormat::WebP);

        let avif = encode_image(&img, OutputFormat::Avif).unwrap();
        assert_eq!(image::guess_format(&avif).unwrap(), image::ImageFormat::Avif);
    }

    #[test]
    fn test_save_image_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        save_image(&DynamicImage::new_rgba8(3, 3), &path, OutputFormat::Png).unwrap();

        let written = image::open(&path).unwrap();
        assert_eq!((written.width(), written.height()), (3, 3));
    }
}
