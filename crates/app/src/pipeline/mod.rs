//! Perception-to-actuation loop joining a free-running classifier producer to
//! a fixed-cadence actuation consumer through a bounded decision mailbox.
//!
//! The module is split into focused submodules:
//! - `config`: CLI argument validation into `GateConfig`.
//! - `channel`: bounded overwrite-on-full decision mailbox.
//! - `producer`: acquire → crop → preprocess → score → publish loop.
//! - `consumer`: tick-driven drain and servo command sequences.
//! - `overlay`: best-effort ROI overlay JPEG sink.
//! - `telemetry`: tracing setup and dispatcher-aware thread spawning.

pub(crate) use config::GateConfig;

use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Once,
    },
    thread,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use frame_ingest::{FrameSource, SyntheticSource};
use infer_core::{Classifier, InputSpec, MeanLumaClassifier};
use servo_ctl::{Actuator, LoggingActuator};
use tracing::{debug, info, warn};

use self::{channel::DecisionChannel, config::SourceKind, overlay::OverlaySink};

pub(crate) mod channel;
pub(crate) mod config;
pub(crate) mod consumer;
pub(crate) mod overlay;
pub(crate) mod producer;
pub(crate) mod telemetry;

/// Poll interval of the orchestrator's watch loop.
const WATCH_INTERVAL: Duration = Duration::from_millis(100);

/// Run the gate pipeline until Ctrl+C or a fatal consumer fault.
pub(crate) fn run(config: GateConfig) -> Result<()> {
    static CTRL_HANDLER: Once = Once::new();

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_shutdown = shutdown.clone();
    CTRL_HANDLER.call_once(move || {
        if let Err(err) = ctrlc::set_handler({
            let handler_shutdown = handler_shutdown.clone();
            move || {
                handler_shutdown.store(true, Ordering::SeqCst);
            }
        }) {
            warn!("Failed to install Ctrl+C handler: {err}");
        }
    });

    // Every owned resource is constructed before a thread is spawned, so
    // initialization failures abort startup with a reported error.
    let source = build_source(&config)?;
    let classifier = build_classifier(&config)?;
    let actuator: Box<dyn Actuator + Send> = Box::new(LoggingActuator::new());
    let overlay = config.overlay.clone().map(OverlaySink::new);
    let channel = DecisionChannel::new(config.capacity);

    info!(
        source = %config.source_uri,
        capacity = channel.capacity(),
        tick_ms = config.tick_interval.as_millis() as u64,
        settle_ms = config.settle.as_millis() as u64,
        "starting gate pipeline"
    );

    let running = Arc::new(AtomicBool::new(true));
    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);

    let producer_handle = producer::spawn_classifier_worker(
        source,
        classifier,
        channel.clone(),
        overlay,
        config.roi,
        config.input,
        shutdown.clone(),
        config.verbose,
    )
    .context("failed to spawn classifier producer")?;

    let consumer_handle = consumer::spawn_actuation_worker(
        actuator,
        channel.clone(),
        stop_rx,
        running.clone(),
        config.tick_interval,
        config.settle,
    )
    .context("failed to spawn actuation consumer")?;

    while running.load(Ordering::Relaxed) && !shutdown.load(Ordering::Relaxed) {
        thread::sleep(WATCH_INTERVAL);
    }

    // Undrained decisions are simply discarded with the channel.
    debug!(undrained = channel.len(), "stopping gate pipeline");
    shutdown.store(true, Ordering::SeqCst);
    drop(stop_tx);

    if producer_handle.join().is_err() {
        warn!("classifier producer panicked during shutdown");
    }
    match consumer_handle.join() {
        Ok(result) => result.context("actuation consumer failed"),
        Err(_) => bail!("actuation consumer panicked"),
    }
}

fn build_source(config: &GateConfig) -> Result<Box<dyn FrameSource + Send>> {
    match config.source_kind {
        SourceKind::Synthetic => Ok(Box::new(SyntheticSource::new(config.width, config.height))),
        SourceKind::Camera => camera_source(&config.source_uri, (config.width, config.height)),
    }
}

#[cfg(feature = "camera-opencv")]
fn camera_source(uri: &str, target_size: (i32, i32)) -> Result<Box<dyn FrameSource + Send>> {
    let source = frame_ingest::CameraSource::open(uri, target_size)
        .with_context(|| format!("failed to open camera source {uri:?}"))?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "camera-opencv"))]
fn camera_source(uri: &str, _target_size: (i32, i32)) -> Result<Box<dyn FrameSource + Send>> {
    bail!("camera source {uri:?} requires a build with the `camera-opencv` feature")
}

fn build_classifier(config: &GateConfig) -> Result<Box<dyn Classifier + Send>> {
    match config.model_path.as_deref() {
        Some(path) => torch_classifier(path, &config.input),
        None => {
            debug!("no model configured, using the mean-luma debug classifier");
            Ok(Box::new(MeanLumaClassifier))
        }
    }
}

#[cfg(feature = "with-tch")]
fn torch_classifier(path: &Path, input: &InputSpec) -> Result<Box<dyn Classifier + Send>> {
    let device = infer_core::tch::Device::cuda_if_available();
    let classifier = infer_core::TorchClassifier::load(path, device, input)
        .with_context(|| format!("failed to load model {}", path.display()))?;
    info!(device = ?classifier.device(), "TorchScript classifier loaded");
    Ok(Box::new(classifier))
}

#[cfg(not(feature = "with-tch"))]
fn torch_classifier(path: &Path, _input: &InputSpec) -> Result<Box<dyn Classifier + Send>> {
    bail!(
        "model {} requires a build with the `with-tch` feature",
        path.display()
    )
}
