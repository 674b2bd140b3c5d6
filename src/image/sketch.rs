//! Pencil-sketch extraction with classical filters.
//!
//! The sketch is a "dodge" blend of the grayscale image with its blurred negative, sharpened and
//! thresholded so that only ink (0) and paper (255) remain.

use image::{imageops, GrayImage, ImageBuffer, Luma, RgbImage};
use imageproc::filter::{separable_filter_equal, sharpen3x3};

/// Side length of the Gaussian blur kernel.
const BLUR_KERNEL_SIZE: usize = 21;

/// Pixels strictly above this value become paper, everything else ink.
const INK_THRESHOLD: u8 = 240;

/// Scale applied by the dodge division.
const DODGE_SCALE: f32 = 256.0;

/// Fixed-point precision used while blurring 8-bit samples.
const BLUR_FIXED_POINT: f32 = 256.0;

/// Convert a color image into a binary pencil sketch.
///
/// Steps, in order:
/// 1. BT.601 luma grayscale
/// 2. Invert
/// 3. 21x21 Gaussian blur (sigma derived from the kernel size, reflect-101 borders)
/// 4. Invert the blur
/// 5. Dodge: `gray * 256 / inverted_blur`, saturating on zero divisors
/// 6. Sharpen with `[[0,-1,0],[-1,5,-1],[0,-1,0]]`
/// 7. Threshold at 240
///
/// The output has the input's dimensions and every pixel is either 0 or 255.
#[must_use]
pub fn sketchify(image: &RgbImage) -> GrayImage {
    let gray = to_luma(image);

    let mut inverted = gray.clone();
    imageops::invert(&mut inverted);

    let mut inverted_blur = gaussian_blur(&inverted, BLUR_KERNEL_SIZE);
    imageops::invert(&mut inverted_blur);

    let dodged = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([dodge(gray.get_pixel(x, y)[0], inverted_blur.get_pixel(x, y)[0])])
    });

    let mut sketch = sharpen3x3(&dodged);
    for pixel in sketch.pixels_mut() {
        pixel[0] = if pixel[0] > INK_THRESHOLD { 255 } else { 0 };
    }
    sketch
}

/// BT.601 luma in 14-bit fixed point with rounding.
fn to_luma(image: &RgbImage) -> GrayImage {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    const SHIFT: u32 = 14;

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let luma = (R * u32::from(r) + G * u32::from(g) + B * u32::from(b) + (1 << (SHIFT - 1)))
            >> SHIFT;
        // Weights sum to 1 << SHIFT, so luma never exceeds 255.
        Luma([u8::try_from(luma).unwrap_or(u8::MAX)])
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn dodge(gray: u8, inverted_blur: u8) -> u8 {
    if inverted_blur == 0 {
        return u8::MAX;
    }
    let value = (f32::from(gray) * DODGE_SCALE / f32::from(inverted_blur)).round();
    value.clamp(0.0, 255.0) as u8
}

/// Sigma picked from the kernel size when none is given.
#[allow(clippy::cast_precision_loss)]
fn auto_sigma(kernel_size: usize) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian kernel of odd length `size`.
#[allow(clippy::cast_precision_loss)]
fn gaussian_kernel(size: usize) -> Vec<f32> {
    let sigma = auto_sigma(size);
    let center = (size as f32 - 1.0) * 0.5;
    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let x = i as f32 - center;
            (-(x * x) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Separable Gaussian blur with reflect-101 borders (`dcb|abcd|cba`).
///
/// Samples are lifted to 16-bit fixed point so the two filter passes do not accumulate
/// 8-bit truncation error. The image is padded by the kernel radius first, so the filter's
/// own edge handling never reaches the cropped result.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn gaussian_blur(image: &GrayImage, kernel_size: usize) -> GrayImage {
    let kernel = gaussian_kernel(kernel_size);
    let radius = (kernel_size / 2) as u32;
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let padded: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_fn(
        width + 2 * radius,
        height + 2 * radius,
        |x, y| {
            let src_x = reflect_101(i64::from(x) - i64::from(radius), width);
            let src_y = reflect_101(i64::from(y) - i64::from(radius), height);
            Luma([u16::from(image.get_pixel(src_x, src_y)[0]) << 8])
        },
    );
    let blurred = separable_filter_equal(&padded, &kernel);

    GrayImage::from_fn(width, height, |x, y| {
        let sample = blurred.get_pixel(x + radius, y + radius)[0];
        let value = (f32::from(sample) / BLUR_FIXED_POINT).round();
        Luma([value.clamp(0.0, 255.0) as u8])
    })
}

/// Map an out-of-range coordinate back into `0..len` by mirroring around the edge pixels.
fn reflect_101(mut index: i64, len: u32) -> u32 {
    let len = i64::from(len);
    if len <= 1 {
        return 0;
    }
    while index < 0 || index >= len {
        index = if index < 0 { -index } else { 2 * len - 2 - index };
    }
    u32::try_from(index).unwrap_or(0)
}
