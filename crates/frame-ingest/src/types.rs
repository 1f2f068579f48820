use anyhow::Error;
use thiserror::Error;

/// Raw frame captured from a video source.
#[derive(Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: i32,
    pub height: i32,
    pub timestamp_ms: i64,
    pub format: FrameFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameFormat {
    Bgr8,
}

impl FrameFormat {
    /// Bytes per pixel for this format.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            FrameFormat::Bgr8 => 3,
        }
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to open video source {uri:?}")]
    Open { uri: String },
    #[error("frame source has been released")]
    Released,
    #[error(transparent)]
    Other(#[from] Error),
}

/// Fixed rectangular sub-window of a captured frame, configured once at
/// startup and applied to every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Roi {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Roi {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle lies fully inside a `frame_width` x
    /// `frame_height` frame.
    pub fn fits_within(&self, frame_width: i32, frame_height: i32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.width > 0
            && self.height > 0
            && self.x.saturating_add(self.width) <= frame_width
            && self.y.saturating_add(self.height) <= frame_height
    }
}

impl Frame {
    /// Copies the ROI out of the frame as a new frame with the same format
    /// and timestamp.
    pub fn crop(&self, roi: &Roi) -> anyhow::Result<Frame> {
        if !roi.fits_within(self.width, self.height) {
            anyhow::bail!(
                "ROI {}x{}+{}+{} does not fit inside a {}x{} frame",
                roi.width,
                roi.height,
                roi.x,
                roi.y,
                self.width,
                self.height
            );
        }

        let bpp = self.format.bytes_per_pixel();
        let expected = (self.width as usize) * (self.height as usize) * bpp;
        if self.data.len() != expected {
            anyhow::bail!(
                "unexpected frame buffer size: got {} bytes, expected {}",
                self.data.len(),
                expected
            );
        }

        let src_stride = (self.width as usize) * bpp;
        let row_bytes = (roi.width as usize) * bpp;
        let mut data = Vec::with_capacity((roi.height as usize) * row_bytes);
        for row in roi.y..roi.y + roi.height {
            let offset = (row as usize) * src_stride + (roi.x as usize) * bpp;
            data.extend_from_slice(&self.data[offset..offset + row_bytes]);
        }

        Ok(Frame {
            data,
            width: roi.width,
            height: roi.height,
            timestamp_ms: self.timestamp_ms,
            format: self.format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: i32, height: i32) -> Frame {
        // Each pixel encodes its own coordinates so crops are verifiable.
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[x as u8, y as u8, 0]);
            }
        }
        Frame {
            data,
            width,
            height,
            timestamp_ms: 42,
            format: FrameFormat::Bgr8,
        }
    }

    #[test]
    fn crop_extracts_expected_window() {
        let frame = frame(16, 12);
        let roi = Roi::new(4, 3, 8, 6);
        let cropped = frame.crop(&roi).unwrap();

        assert_eq!(cropped.width, 8);
        assert_eq!(cropped.height, 6);
        assert_eq!(cropped.timestamp_ms, 42);
        assert_eq!(cropped.data.len(), 8 * 6 * 3);
        // Top-left pixel of the crop carries the ROI origin coordinates.
        assert_eq!(&cropped.data[..3], &[4, 3, 0]);
        // Bottom-right pixel carries the far corner.
        let last = cropped.data.len() - 3;
        assert_eq!(&cropped.data[last..], &[11, 8, 0]);
    }

    #[test]
    fn crop_rejects_out_of_bounds_roi() {
        let frame = frame(16, 12);
        assert!(frame.crop(&Roi::new(10, 0, 8, 4)).is_err());
        assert!(frame.crop(&Roi::new(-1, 0, 4, 4)).is_err());
        assert!(frame.crop(&Roi::new(0, 0, 0, 4)).is_err());
        assert!(frame.crop(&Roi::new(0, 10, 4, 4)).is_err());
    }

    #[test]
    fn roi_fit_checks_edges() {
        let roi = Roi::new(0, 0, 16, 12);
        assert!(roi.fits_within(16, 12));
        assert!(!roi.fits_within(15, 12));
        assert!(!roi.fits_within(16, 11));
    }
}
