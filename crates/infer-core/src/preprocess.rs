use anyhow::{bail, Result};
use frame_ingest::{Frame, FrameFormat};
use image::{imageops, imageops::FilterType, ImageBuffer, Rgb};

/// Fixed input contract of the deployed model, supplied once at startup.
#[derive(Clone, Copy, Debug)]
pub struct InputSpec {
    pub width: u32,
    pub height: u32,
    /// Divisor applied to raw pixel intensities; 255.0 maps u8 into [0, 1].
    pub normalization_scale: f32,
}

impl Default for InputSpec {
    fn default() -> Self {
        Self {
            width: 224,
            height: 224,
            normalization_scale: 255.0,
        }
    }
}

/// Rank-4 NHWC float buffer (batch of one) ready for a classifier back end.
///
/// Channel order follows the source frame (BGR for camera captures), matching
/// what the deployed model was trained on.
pub struct InputTensor {
    pub data: Vec<f32>,
    pub width: u32,
    pub height: u32,
}

impl InputTensor {
    /// Logical tensor shape `[1, height, width, 3]`.
    pub fn shape(&self) -> [i64; 4] {
        [1, self.height as i64, self.width as i64, 3]
    }
}

/// Resize an ROI frame to the model input size and scale intensities into
/// the model's expected numeric range.
pub fn preprocess(frame: &Frame, spec: &InputSpec) -> Result<InputTensor> {
    if !matches!(frame.format, FrameFormat::Bgr8) {
        bail!("unsupported frame format for preprocessing");
    }
    if spec.width == 0 || spec.height == 0 {
        bail!("model input size must be non-zero");
    }
    if spec.normalization_scale <= 0.0 {
        bail!("normalization scale must be positive");
    }

    let width = frame.width as u32;
    let height = frame.height as u32;
    let expected = (width as usize) * (height as usize) * 3;
    if frame.data.len() != expected {
        bail!(
            "unexpected frame buffer size: got {} bytes, expected {}",
            frame.data.len(),
            expected
        );
    }

    let image = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(width, height, frame.data.clone())
        .ok_or_else(|| anyhow::anyhow!("failed to wrap frame into image buffer"))?;

    let resized = if width == spec.width && height == spec.height {
        image
    } else {
        imageops::resize(&image, spec.width, spec.height, FilterType::Triangle)
    };

    let data = resized
        .into_raw()
        .into_iter()
        .map(|value| value as f32 / spec.normalization_scale)
        .collect();

    Ok(InputTensor {
        data,
        width: spec.width,
        height: spec.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: i32, height: i32, value: u8) -> Frame {
        Frame {
            data: vec![value; (width * height * 3) as usize],
            width,
            height,
            timestamp_ms: 0,
            format: FrameFormat::Bgr8,
        }
    }

    fn spec(width: u32, height: u32) -> InputSpec {
        InputSpec {
            width,
            height,
            normalization_scale: 255.0,
        }
    }

    #[test]
    fn output_has_model_shape_and_unit_range() {
        let tensor = preprocess(&frame(40, 30, 255), &spec(8, 8)).unwrap();
        assert_eq!(tensor.shape(), [1, 8, 8, 3]);
        assert_eq!(tensor.data.len(), 8 * 8 * 3);
        assert!(tensor.data.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!((tensor.data[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn identity_size_skips_resampling() {
        let tensor = preprocess(&frame(8, 8, 51), &spec(8, 8)).unwrap();
        for value in tensor.data {
            assert!((value - 0.2).abs() < 1e-6);
        }
    }

    #[test]
    fn custom_scale_is_applied() {
        let input = InputSpec {
            width: 4,
            height: 4,
            normalization_scale: 100.0,
        };
        let tensor = preprocess(&frame(4, 4, 50), &input).unwrap();
        assert!((tensor.data[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        let mut bad = frame(8, 8, 0);
        bad.data.truncate(10);
        assert!(preprocess(&bad, &spec(8, 8)).is_err());
    }
}
