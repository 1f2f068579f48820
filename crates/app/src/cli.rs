use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments accepted by the `sortgate` binary.
///
/// Defaults follow the deployed configuration: 640x480 capture, a 200x200 ROI
/// over the gate mouth, a five-slot decision channel, a 10 s actuation
/// cadence, and a 500 ms settle delay. The deployed rig placed the ROI at row
/// 400 and relied on the capture library clamping it to the frame; here the
/// ROI must fit the frame outright, so the default sits at row 240, the
/// lowest fully visible 200-row band.
#[derive(Debug, Parser)]
#[command(name = "sortgate", about = "Camera-driven sorting gate")]
pub struct GateArgs {
    /// Frame source: `synthetic`, a device index, or a V4L device path.
    #[arg(long = "source", value_name = "URI", default_value = "synthetic")]
    pub source_uri: String,
    /// TorchScript model path (requires the `with-tch` build).
    #[arg(long = "model", value_name = "PATH")]
    pub model_path: Option<PathBuf>,
    /// Capture width in pixels.
    #[arg(long = "width", value_name = "PX", default_value_t = 640)]
    pub width: i32,
    /// Capture height in pixels.
    #[arg(long = "height", value_name = "PX", default_value_t = 480)]
    pub height: i32,
    /// ROI left edge in pixels.
    #[arg(long = "roi-x", value_name = "PX", default_value_t = 210)]
    pub roi_x: i32,
    /// ROI top edge in pixels.
    #[arg(long = "roi-y", value_name = "PX", default_value_t = 240)]
    pub roi_y: i32,
    /// ROI width in pixels.
    #[arg(long = "roi-width", value_name = "PX", default_value_t = 200)]
    pub roi_width: i32,
    /// ROI height in pixels.
    #[arg(long = "roi-height", value_name = "PX", default_value_t = 200)]
    pub roi_height: i32,
    /// Model input width in pixels.
    #[arg(long = "input-width", value_name = "PX", default_value_t = 224)]
    pub input_width: u32,
    /// Model input height in pixels.
    #[arg(long = "input-height", value_name = "PX", default_value_t = 224)]
    pub input_height: u32,
    /// Divisor mapping raw pixel intensities into the model's input range.
    #[arg(long = "normalization-scale", value_name = "N", default_value_t = 255.0)]
    pub normalization_scale: f32,
    /// Decision channel capacity.
    #[arg(long = "capacity", value_name = "N", default_value_t = 5)]
    pub capacity: usize,
    /// Actuation tick interval in milliseconds.
    #[arg(long = "tick-interval-ms", value_name = "MS", default_value_t = 10_000)]
    pub tick_interval_ms: u64,
    /// Settle delay between the right and center commands, in milliseconds.
    #[arg(long = "settle-ms", value_name = "MS", default_value_t = 500)]
    pub settle_ms: u64,
    /// Write a JPEG of the latest frame with the ROI box to this path.
    #[arg(long = "overlay-path", value_name = "PATH")]
    pub overlay_path: Option<PathBuf>,
    /// Refresh the overlay every N frames.
    #[arg(long = "overlay-every", value_name = "N", default_value_t = 30)]
    pub overlay_every: u64,
    /// Emit verbose per-frame logging.
    #[arg(long = "verbose", action = clap::ArgAction::SetTrue)]
    pub verbose: bool,
}
