//! Debug overlay: the latest frame with the ROI box, dumped as a JPEG.
//!
//! Pure instrumentation for a human watching the gate; rendering failures are
//! logged and never reach the producer loop.

use std::fs;

use anyhow::{anyhow, Result};
use frame_ingest::{Frame, Roi};
use image::{codecs::jpeg::JpegEncoder, ImageBuffer, Rgb};
use tracing::warn;

use crate::pipeline::config::OverlayOptions;

const JPEG_QUALITY: u8 = 85;
const BOX_THICKNESS: i32 = 2;

pub(crate) struct OverlaySink {
    options: OverlayOptions,
    counter: u64,
}

impl OverlaySink {
    pub(crate) fn new(options: OverlayOptions) -> Self {
        Self {
            options,
            counter: 0,
        }
    }

    /// Refresh the overlay file every `every` frames. Best effort only.
    pub(crate) fn publish(&mut self, frame: &Frame, roi: &Roi) {
        self.counter = self.counter.wrapping_add(1);
        if self.counter % self.options.every != 0 {
            return;
        }
        if let Err(err) = self.render(frame, roi) {
            warn!("overlay render failed: {err:#}");
        }
    }

    fn render(&self, frame: &Frame, roi: &Roi) -> Result<()> {
        let mut data = frame.data.clone();
        draw_roi_box(&mut data, frame.width, frame.height, roi);

        // Frame buffers are BGR8; swap to RGB for the encoder.
        for pixel in data.chunks_exact_mut(3) {
            pixel.swap(0, 2);
        }

        let image =
            ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(frame.width as u32, frame.height as u32, data)
                .ok_or_else(|| anyhow!("failed to wrap frame into image buffer"))?;

        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)
            .encode_image(&image)
            .map_err(|err| anyhow!("JPEG encode failed: {err}"))?;
        fs::write(&self.options.path, buffer)?;
        Ok(())
    }
}

/// Draw a green rectangle outline around the ROI into a BGR8 buffer.
pub(crate) fn draw_roi_box(data: &mut [u8], width: i32, height: i32, roi: &Roi) {
    let left = roi.x;
    let top = roi.y;
    let right = roi.x + roi.width - 1;
    let bottom = roi.y + roi.height - 1;

    for t in 0..BOX_THICKNESS {
        for x in left..=right {
            set_green(data, width, height, x, top + t);
            set_green(data, width, height, x, bottom - t);
        }
        for y in top..=bottom {
            set_green(data, width, height, left + t, y);
            set_green(data, width, height, right - t, y);
        }
    }
}

fn set_green(data: &mut [u8], width: i32, height: i32, x: i32, y: i32) {
    if x < 0 || y < 0 || x >= width || y >= height {
        return;
    }
    let offset = ((y * width + x) * 3) as usize;
    if offset + 2 < data.len() {
        data[offset] = 0;
        data[offset + 1] = 255;
        data[offset + 2] = 0;
    }
}
