//! Frame acquisition for the sortgate pipeline.
//!
//! The classifier producer owns exactly one [`FrameSource`] and polls it
//! synchronously; this crate provides the source contract, the frame and ROI
//! types, a synthetic source for bench runs and tests, and an OpenCV-backed
//! camera source behind the `camera-opencv` feature.

pub use source::{FrameSource, SyntheticSource};
pub use types::{CaptureError, Frame, FrameFormat, Roi};

#[cfg(feature = "camera-opencv")]
pub use camera::CameraSource;

#[cfg(feature = "camera-opencv")]
mod camera;
mod source;
mod types;
