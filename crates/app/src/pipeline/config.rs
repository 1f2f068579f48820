//! Validation of CLI arguments into the canonical pipeline configuration.

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Result};
use frame_ingest::Roi;
use infer_core::InputSpec;

use crate::cli::GateArgs;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Back end used to source frames.
pub enum SourceKind {
    /// Built-in pattern generator, no hardware required.
    Synthetic,
    /// Camera device (index, V4L path, or file URI).
    Camera,
}

impl SourceKind {
    pub(crate) fn from_uri(uri: &str) -> Self {
        if uri.eq_ignore_ascii_case("synthetic") {
            SourceKind::Synthetic
        } else {
            SourceKind::Camera
        }
    }
}

#[derive(Clone, Debug)]
/// Overlay sink settings.
pub struct OverlayOptions {
    pub path: PathBuf,
    pub every: u64,
}

#[derive(Clone, Debug)]
/// Canonical configuration shared by every stage of the gate pipeline.
pub struct GateConfig {
    pub source_uri: String,
    pub source_kind: SourceKind,
    pub model_path: Option<PathBuf>,
    pub width: i32,
    pub height: i32,
    pub roi: Roi,
    pub input: InputSpec,
    pub capacity: usize,
    pub tick_interval: Duration,
    pub settle: Duration,
    pub overlay: Option<OverlayOptions>,
    pub verbose: bool,
}

impl TryFrom<GateArgs> for GateConfig {
    type Error = anyhow::Error;

    fn try_from(args: GateArgs) -> Result<Self> {
        if args.width <= 0 || args.height <= 0 {
            bail!("Capture width and height must be positive integers");
        }

        let roi = Roi::new(args.roi_x, args.roi_y, args.roi_width, args.roi_height);
        if !roi.fits_within(args.width, args.height) {
            bail!(
                "ROI {}x{}+{}+{} does not fit inside the {}x{} capture frame",
                roi.width,
                roi.height,
                roi.x,
                roi.y,
                args.width,
                args.height
            );
        }

        if args.input_width == 0 || args.input_height == 0 {
            bail!("--input-width and --input-height must be at least 1");
        }
        if args.normalization_scale <= 0.0 || !args.normalization_scale.is_finite() {
            bail!("--normalization-scale must be a positive number");
        }
        if args.capacity == 0 {
            bail!("--capacity must be at least 1");
        }
        if args.tick_interval_ms == 0 {
            bail!("--tick-interval-ms must be at least 1");
        }
        if args.settle_ms >= args.tick_interval_ms {
            bail!("--settle-ms must be shorter than --tick-interval-ms");
        }
        if args.overlay_every == 0 {
            bail!("--overlay-every must be at least 1");
        }

        let overlay = args.overlay_path.map(|path| OverlayOptions {
            path,
            every: args.overlay_every,
        });

        let source_kind = SourceKind::from_uri(&args.source_uri);

        Ok(Self {
            source_uri: args.source_uri,
            source_kind,
            model_path: args.model_path,
            width: args.width,
            height: args.height,
            roi,
            input: InputSpec {
                width: args.input_width,
                height: args.input_height,
                normalization_scale: args.normalization_scale,
            },
            capacity: args.capacity,
            tick_interval: Duration::from_millis(args.tick_interval_ms),
            settle: Duration::from_millis(args.settle_ms),
            overlay,
            verbose: args.verbose,
        })
    }
}
