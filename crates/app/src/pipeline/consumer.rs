//! Actuation consumer: a fixed-cadence tick that drains one decision and
//! drives the servo gate.

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
use crossbeam_channel::{select, tick, Receiver};
use infer_core::Classification;
use servo_ctl::{Actuator, CENTER_DUTY, LEFT_DUTY, RIGHT_DUTY};
use tracing::{debug, error};

use crate::pipeline::{channel::DecisionChannel, telemetry};

pub(crate) fn spawn_actuation_worker(
    mut actuator: Box<dyn Actuator + Send>,
    channel: DecisionChannel,
    stop_rx: Receiver<()>,
    running: Arc<AtomicBool>,
    tick_interval: Duration,
    settle: Duration,
) -> io::Result<thread::JoinHandle<Result<()>>> {
    telemetry::spawn_thread("actuation-consumer", move || {
        let result = run_actuation_loop(
            actuator.as_mut(),
            &channel,
            &stop_rx,
            tick_interval,
            settle,
        );
        // Release the servo channel on every exit path, fatal or not.
        actuator.stop();
        if let Err(err) = result.as_ref() {
            error!("actuation consumer failed: {err:#}");
            running.store(false, Ordering::SeqCst);
        }
        result
    })
}

/// Tick on a fixed cadence until the stop channel fires or disconnects.
///
/// Each tick performs exactly one `try_take`. An empty channel is a normal
/// skip; an actuator command failure is fatal and propagates to the caller.
pub(crate) fn run_actuation_loop(
    actuator: &mut dyn Actuator,
    channel: &DecisionChannel,
    stop_rx: &Receiver<()>,
    tick_interval: Duration,
    settle: Duration,
) -> Result<()> {
    let ticker = tick(tick_interval);
    loop {
        select! {
            recv(stop_rx) -> _ => break,
            recv(ticker) -> _ => {
                match channel.try_take() {
                    None => {
                        debug!("no classification this cycle");
                        metrics::counter!("gate_empty_ticks_total").increment(1);
                    }
                    Some(Classification::Left) => {
                        actuator
                            .set_level(LEFT_DUTY)
                            .context("failed to drive gate left")?;
                        metrics::counter!("gate_commands_issued_total").increment(1);
                        debug!(class = "left", "gate driven left");
                    }
                    Some(Classification::Right) => {
                        actuator
                            .set_level(RIGHT_DUTY)
                            .context("failed to drive gate right")?;
                        // Bounded settle before recentering; the cadence is
                        // far larger than this delay (enforced by config).
                        thread::sleep(settle);
                        actuator
                            .set_level(CENTER_DUTY)
                            .context("failed to recenter gate")?;
                        metrics::counter!("gate_commands_issued_total").increment(2);
                        debug!(class = "right", "gate driven right and recentered");
                    }
                }
            }
        }
    }
    debug!("actuation consumer stopped");
    Ok(())
}
