//! Classifier producer: acquire → crop → preprocess → score → publish.
//!
//! Runs at the natural rate of frame acquisition plus inference; the decision
//! channel decouples it from the actuation cadence, so nothing downstream
//! ever back-pressures this loop.

use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use frame_ingest::{Frame, FrameSource, Roi};
use infer_core::{preprocess, Classification, Classifier, InputSpec};
use tracing::{debug, warn};

use crate::pipeline::{channel::DecisionChannel, overlay::OverlaySink, telemetry};

/// Pause after a failed iteration so a wedged source cannot busy-spin.
const FAULT_PAUSE: Duration = Duration::from_millis(50);

pub(crate) fn spawn_classifier_worker(
    mut source: Box<dyn FrameSource + Send>,
    classifier: Box<dyn Classifier + Send>,
    channel: DecisionChannel,
    mut overlay: Option<OverlaySink>,
    roi: Roi,
    input: InputSpec,
    shutdown: Arc<AtomicBool>,
    verbose: bool,
) -> io::Result<thread::JoinHandle<()>> {
    telemetry::spawn_thread("classifier-producer", move || {
        run_classifier_loop(
            source.as_mut(),
            classifier.as_ref(),
            &channel,
            &mut overlay,
            roi,
            &input,
            &shutdown,
            verbose,
        );
    })
}

/// Classify frames until the shutdown flag is raised, then release the
/// source. Transient faults are logged and the iteration skipped; only the
/// stop signal ends the loop.
#[allow(clippy::too_many_arguments)]
pub(crate) fn run_classifier_loop(
    source: &mut dyn FrameSource,
    classifier: &dyn Classifier,
    channel: &DecisionChannel,
    overlay: &mut Option<OverlaySink>,
    roi: Roi,
    input: &InputSpec,
    shutdown: &AtomicBool,
    verbose: bool,
) {
    while !shutdown.load(Ordering::Relaxed) {
        let frame = match source.acquire_frame() {
            Ok(frame) => frame,
            Err(err) => {
                warn!("frame acquisition failed: {err:#}");
                metrics::counter!("gate_acquisition_failures_total").increment(1);
                thread::sleep(FAULT_PAUSE);
                continue;
            }
        };

        let (classification, score) = match classify_frame(&frame, roi, input, classifier) {
            Ok(result) => result,
            Err(err) => {
                warn!("classification failed: {err:#}");
                metrics::counter!("gate_classification_failures_total").increment(1);
                thread::sleep(FAULT_PAUSE);
                continue;
            }
        };

        if verbose {
            debug!(
                timestamp_ms = frame.timestamp_ms,
                score,
                class = classification.label(),
                "classified frame"
            );
        }

        channel.publish(classification);
        metrics::counter!("gate_classifications_published_total").increment(1);

        if let Some(sink) = overlay.as_mut() {
            sink.publish(&frame, &roi);
        }
    }

    source.release();
    debug!("classifier producer stopped");
}

/// One producer iteration after acquisition: crop, preprocess, score,
/// threshold.
pub(crate) fn classify_frame(
    frame: &Frame,
    roi: Roi,
    input: &InputSpec,
    classifier: &dyn Classifier,
) -> Result<(Classification, f32)> {
    let roi_frame = frame.crop(&roi).context("failed to crop ROI")?;
    let tensor = preprocess(&roi_frame, input).context("failed to preprocess ROI")?;
    let score = classifier.score(&tensor).context("inference failed")?;
    Ok((Classification::from_score(score), score))
}
