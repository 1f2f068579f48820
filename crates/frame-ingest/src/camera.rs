//! OpenCV-backed camera source.

use chrono::Utc;
use opencv::{
    core::{self, MatTraitConstManual},
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTrait},
};
use tracing::{debug, warn};

use crate::types::{CaptureError, Frame, FrameFormat};

/// Synchronous pull-based capture over an OpenCV `VideoCapture`.
///
/// Frames are resized to `target_size` (width, height) before being handed to
/// the caller. The producer loop owns this source exclusively, so no reader
/// thread or channel is involved.
pub struct CameraSource {
    cap: Option<VideoCapture>,
    target_size: (i32, i32),
    frame: Mat,
    scratch: Mat,
}

impl CameraSource {
    pub fn open(uri: &str, target_size: (i32, i32)) -> Result<Self, CaptureError> {
        let mut cap = open_video_capture(uri)?;
        configure_camera(&mut cap, target_size, 60.0);
        Ok(Self {
            cap: Some(cap),
            target_size,
            frame: Mat::default(),
            scratch: Mat::default(),
        })
    }
}

impl super::FrameSource for CameraSource {
    fn acquire_frame(&mut self) -> Result<Frame, CaptureError> {
        let cap = self.cap.as_mut().ok_or(CaptureError::Released)?;
        let (target_w, target_h) = self.target_size;

        loop {
            cap.read(&mut self.frame)
                .map_err(|e| CaptureError::Other(e.into()))?;

            let size = self
                .frame
                .size()
                .map_err(|e| CaptureError::Other(e.into()))?;
            if size.width <= 0 {
                continue;
            }

            let working = if size.width != target_w || size.height != target_h {
                opencv::imgproc::resize(
                    &self.frame,
                    &mut self.scratch,
                    core::Size {
                        width: target_w,
                        height: target_h,
                    },
                    0.0,
                    0.0,
                    opencv::imgproc::INTER_LINEAR,
                )
                .map_err(|e| CaptureError::Other(e.into()))?;
                &self.scratch
            } else {
                &self.frame
            };

            let data = working
                .data_bytes()
                .map_err(|e| CaptureError::Other(e.into()))?
                .to_vec();

            return Ok(Frame {
                data,
                width: target_w,
                height: target_h,
                timestamp_ms: Utc::now().timestamp_millis(),
                format: FrameFormat::Bgr8,
            });
        }
    }

    fn release(&mut self) {
        if self.cap.take().is_some() {
            debug!("camera source released");
        }
    }
}

fn parse_device_index(uri: &str) -> Option<i32> {
    if let Ok(index) = uri.parse::<i32>() {
        return Some(index);
    }
    if let Some(stripped) = uri.strip_prefix("/dev/video") {
        if stripped.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(index) = stripped.parse::<i32>() {
                return Some(index);
            }
        }
    }
    None
}

fn open_video_capture(uri: &str) -> Result<VideoCapture, CaptureError> {
    if let Some(index) = parse_device_index(uri) {
        for backend in [videoio::CAP_V4L, videoio::CAP_ANY] {
            match VideoCapture::new(index, backend) {
                Ok(cap) => {
                    if cap.is_opened().map_err(|e| CaptureError::Other(e.into()))? {
                        return Ok(cap);
                    }
                }
                Err(err) => {
                    warn!("failed to open device #{index} with backend {backend}: {err}");
                }
            }
        }
    }

    for backend in [videoio::CAP_V4L, videoio::CAP_ANY] {
        match VideoCapture::from_file(uri, backend) {
            Ok(cap) => {
                if cap.is_opened().map_err(|e| CaptureError::Other(e.into()))? {
                    return Ok(cap);
                }
            }
            Err(err) => {
                warn!("failed to open {uri} with backend {backend}: {err}");
            }
        }
    }

    Err(CaptureError::Open {
        uri: uri.to_string(),
    })
}

fn configure_camera(cap: &mut VideoCapture, target_size: (i32, i32), fps: f64) {
    if let Ok(fourcc) = videoio::VideoWriter::fourcc('M', 'J', 'P', 'G') {
        let _ = cap.set(videoio::CAP_PROP_FOURCC, fourcc as f64);
    }
    let _ = cap.set(videoio::CAP_PROP_FRAME_WIDTH, target_size.0 as f64);
    let _ = cap.set(videoio::CAP_PROP_FRAME_HEIGHT, target_size.1 as f64);
    let _ = cap.set(videoio::CAP_PROP_FPS, fps);
}
