//! ONNX generator loading and execution.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::{Tensor, ValueType};

use crate::error::{Error, Result};
use crate::image::{ImageTensor, RGB_CHANNELS};

use super::Generator;

/// Location of the generator artifact when none is configured.
pub const DEFAULT_MODEL_PATH: &str = "generator_final1.onnx";

/// Generator backed by an ONNX Runtime session.
pub struct OnnxGenerator {
    session: Mutex<Session>,
    input_size: Option<(u32, u32)>,
}

impl OnnxGenerator {
    /// Load the generator from `path`.
    ///
    /// The first input's declared shape is inspected once here; a model with dynamic spatial
    /// dimensions reports no input size.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or is not a loadable ONNX model.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::ModelNotFound {
                path: path.to_path_buf(),
            });
        }

        tracing::info!("Loading generator from {}", path.display());

        let session = Session::builder()
            .map_err(|source| Error::ModelLoad {
                path: path.to_path_buf(),
                source,
            })?
            .commit_from_file(path)
            .map_err(|source| Error::ModelLoad {
                path: path.to_path_buf(),
                source,
            })?;

        let declared = session.inputs.first().and_then(|input| match &input.input_type {
            ValueType::Tensor { shape, .. } => Some(shape.iter().copied().collect::<Vec<i64>>()),
            _ => None,
        });
        let input_size = declared.as_deref().and_then(spatial_size);

        match (&declared, input_size) {
            (Some(dims), Some((h, w))) => {
                tracing::info!("Generator declares input shape {dims:?} ({h}x{w})");
            }
            (Some(dims), None) => {
                tracing::info!("Generator declares input shape {dims:?} (dynamic spatial size)");
            }
            (None, _) => tracing::warn!("Generator does not declare a tensor input"),
        }

        Ok(Self {
            session: Mutex::new(session),
            input_size,
        })
    }
}

impl Generator for OnnxGenerator {
    fn input_size(&self) -> Option<(u32, u32)> {
        self.input_size
    }

    fn generate(&self, input: &ImageTensor) -> Result<ImageTensor> {
        let input_value =
            Tensor::from_array(input.clone()).map_err(|source| Error::Inference { source })?;

        // A poisoned lock only means another request panicked mid-run; the session is reusable.
        let mut session = self
            .session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|source| Error::Inference { source })?;

        let output = outputs
            .values()
            .next()
            .ok_or_else(|| Error::ShapeMismatch {
                expected: "generated image output".to_string(),
                actual: "no output".to_string(),
            })?;

        let (shape_info, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|source| Error::Inference { source })?;
        let dims: Vec<i64> = shape_info.iter().copied().collect();

        to_nhwc(&dims, data.to_vec())
    }
}

/// Spatial `(height, width)` of a declared image input in NHWC or NCHW layout.
///
/// Returns `None` when either dimension is dynamic (non-positive).
fn spatial_size(dims: &[i64]) -> Option<(u32, u32)> {
    let channels = i64::try_from(RGB_CHANNELS).ok()?;
    let (h, w) = match dims {
        [_, h, w, c] if *c == channels => (*h, *w),
        [_, c, h, w] if *c == channels => (*h, *w),
        _ => return None,
    };
    if h <= 0 || w <= 0 {
        return None;
    }
    Some((u32::try_from(h).ok()?, u32::try_from(w).ok()?))
}

/// Reshape raw output data into an NHWC tensor, transposing NCHW outputs.
fn to_nhwc(dims: &[i64], data: Vec<f32>) -> Result<ImageTensor> {
    let shape: Vec<usize> = dims
        .iter()
        .map(|&d| usize::try_from(d))
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| Error::ShapeMismatch {
            expected: "non-negative dimensions".to_string(),
            actual: format!("{dims:?}"),
        })?;

    let &[n, a, b, c] = shape.as_slice() else {
        return Err(Error::ShapeMismatch {
            expected: "4D tensor".to_string(),
            actual: format!("{}D tensor", shape.len()),
        });
    };

    let array = Array4::from_shape_vec((n, a, b, c), data).map_err(|_| Error::ShapeMismatch {
        expected: format!("{shape:?}"),
        actual: "reshape failed".to_string(),
    })?;

    if c == RGB_CHANNELS {
        Ok(array)
    } else if a == RGB_CHANNELS {
        Ok(array.permuted_axes([0, 2, 3, 1]).as_standard_layout().into_owned())
    } else {
        Err(Error::ShapeMismatch {
            expected: "(1, H, W, 3) or (1, 3, H, W)".to_string(),
            actual: format!("{shape:?}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_size_layouts() {
        assert_eq!(spatial_size(&[-1, 512, 512, 3]), Some((512, 512)));
        assert_eq!(spatial_size(&[1, 3, 256, 128]), Some((256, 128)));
        assert_eq!(spatial_size(&[-1, -1, -1, 3]), None);
        assert_eq!(spatial_size(&[1, 512, 512]), None);
        assert_eq!(spatial_size(&[1, 512, 512, 4]), None);
    }

    #[test]
    fn test_to_nhwc_passthrough() {
        let data: Vec<f32> = (0..2 * 2 * 3).map(|v| v as f32).collect();
        let tensor = to_nhwc(&[1, 2, 2, 3], data).unwrap();
        assert_eq!(tensor.shape(), &[1, 2, 2, 3]);
        assert!((tensor[[0, 1, 0, 2]] - 8.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_to_nhwc_transposes_nchw() {
        // Channel-major: channel c holds values 100 * c + pixel index.
        let mut data = Vec::new();
        for c in 0..3 {
            for p in 0..4 {
                data.push((100 * c + p) as f32);
            }
        }
        let tensor = to_nhwc(&[1, 3, 2, 2], data).unwrap();

        assert_eq!(tensor.shape(), &[1, 2, 2, 3]);
        assert!((tensor[[0, 1, 1, 0]] - 3.0).abs() < f32::EPSILON);
        assert!((tensor[[0, 1, 1, 2]] - 203.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_to_nhwc_rejects_bad_shapes() {
        assert!(matches!(
            to_nhwc(&[1, 4, 4], vec![0.0; 16]),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(to_nhwc(&[1, 2, 2, 4], vec![0.0; 16]).is_err());
        assert!(to_nhwc(&[1, 2, 2, 3], vec![0.0; 5]).is_err());
    }

    #[test]
    fn test_missing_model_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("generator.onnx");
        assert!(matches!(
            OnnxGenerator::load(&missing),
            Err(Error::ModelNotFound { path }) if path == missing
        ));
    }
}
