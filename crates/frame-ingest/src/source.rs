use chrono::Utc;
use tracing::debug;

use crate::types::{CaptureError, Frame, FrameFormat};

/// Synchronous frame supplier owned by the classifier producer.
///
/// `acquire_frame` blocks until the next frame is available (sources are
/// assumed to have bounded latency); `release` gives the source back to the
/// operating system and must be called on every producer exit path. Release
/// failures are logged by the implementation, never surfaced.
pub trait FrameSource {
    fn acquire_frame(&mut self) -> Result<Frame, CaptureError>;
    fn release(&mut self);
}

/// Frame generator used for bench runs and tests.
///
/// Produces BGR8 frames whose base intensity alternates between a bright and
/// a dark phase every `PHASE_FRAMES` frames, so a brightness-driven
/// classifier flips between both classes during a run.
pub struct SyntheticSource {
    width: i32,
    height: i32,
    counter: u64,
    released: bool,
}

const PHASE_FRAMES: u64 = 30;
const BRIGHT_LEVEL: u8 = 200;
const DARK_LEVEL: u8 = 40;

impl SyntheticSource {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            counter: 0,
            released: false,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn acquire_frame(&mut self) -> Result<Frame, CaptureError> {
        if self.released {
            return Err(CaptureError::Released);
        }

        let base = if (self.counter / PHASE_FRAMES) % 2 == 0 {
            BRIGHT_LEVEL
        } else {
            DARK_LEVEL
        };
        self.counter = self.counter.wrapping_add(1);

        let mut data = Vec::with_capacity((self.width * self.height * 3) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                // Mild diagonal gradient on top of the phase level keeps the
                // output from being a flat field.
                let value = base.saturating_add(((x + y) % 32) as u8);
                data.extend_from_slice(&[value, value, value]);
            }
        }

        Ok(Frame {
            data,
            width: self.width,
            height: self.height,
            timestamp_ms: Utc::now().timestamp_millis(),
            format: FrameFormat::Bgr8,
        })
    }

    fn release(&mut self) {
        self.released = true;
        debug!("synthetic frame source released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_frames_match_configured_size() {
        let mut source = SyntheticSource::new(32, 24);
        let frame = source.acquire_frame().unwrap();
        assert_eq!(frame.width, 32);
        assert_eq!(frame.height, 24);
        assert_eq!(frame.data.len(), 32 * 24 * 3);
        assert_eq!(frame.format, FrameFormat::Bgr8);
    }

    #[test]
    fn synthetic_phases_alternate_brightness() {
        let mut source = SyntheticSource::new(8, 8);
        let bright = source.acquire_frame().unwrap();
        for _ in 0..PHASE_FRAMES {
            source.acquire_frame().unwrap();
        }
        let dark = source.acquire_frame().unwrap();
        assert!(bright.data[0] > dark.data[0]);
    }

    #[test]
    fn acquire_after_release_fails() {
        let mut source = SyntheticSource::new(8, 8);
        source.release();
        assert!(matches!(
            source.acquire_frame(),
            Err(CaptureError::Released)
        ));
    }
}
