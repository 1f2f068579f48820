//! Actuator side of the sortgate pipeline.
//!
//! The actuation consumer owns exactly one [`Actuator`] and drives it with
//! duty-cycle levels. Hardware PWM drivers live outside this workspace and
//! plug in behind the trait; the crate ships a logging back end for bench
//! runs and a recording back end for tests.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Instant,
};

use thiserror::Error;
use tracing::{debug, info};

/// PWM carrier frequency of the deployed servo.
pub const SERVO_PWM_HZ: f64 = 50.0;

/// Duty cycle driving the gate to its left extreme.
pub const LEFT_DUTY: f32 = 0.0;
/// Duty cycle driving the gate to its right extreme.
pub const RIGHT_DUTY: f32 = 12.0;
/// Duty cycle holding the gate at its neutral center position.
pub const CENTER_DUTY: f32 = 7.5;

#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("duty cycle {0} outside the 0-100 range")]
    InvalidDuty(f32),
    #[error("actuator hardware fault: {0}")]
    Hardware(String),
}

/// Duty-cycle actuator owned by the actuation consumer.
///
/// `set_level` takes effect immediately and its failure is fatal to the
/// consumer loop. `stop` releases the output channel; it is called on every
/// consumer exit path and tolerates repeated invocation, logging rather than
/// surfacing late failures.
pub trait Actuator: Send {
    fn set_level(&mut self, duty: f32) -> Result<(), ActuatorError>;
    fn stop(&mut self);
}

fn check_duty(duty: f32) -> Result<(), ActuatorError> {
    if !(0.0..=100.0).contains(&duty) || !duty.is_finite() {
        return Err(ActuatorError::InvalidDuty(duty));
    }
    Ok(())
}

/// Back end that logs commands instead of driving hardware.
#[derive(Default)]
pub struct LoggingActuator {
    stopped: bool,
}

impl LoggingActuator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Actuator for LoggingActuator {
    fn set_level(&mut self, duty: f32) -> Result<(), ActuatorError> {
        check_duty(duty)?;
        info!(duty, "servo level set");
        Ok(())
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            debug!("servo channel released");
        }
    }
}

/// One observed actuator command, for assertions in tests.
#[derive(Clone, Copy, Debug)]
pub struct CommandRecord {
    pub duty: f32,
    pub at: Instant,
}

/// Shared view of the commands a [`RecordingActuator`] has received.
pub type CommandLog = Arc<Mutex<Vec<CommandRecord>>>;

/// Test back end that records every command and can inject a hardware fault
/// after a configured number of successful commands.
pub struct RecordingActuator {
    log: CommandLog,
    fail_after: Option<usize>,
    issued: usize,
    stopped: Arc<AtomicBool>,
}

impl RecordingActuator {
    pub fn new() -> (Self, CommandLog) {
        let log: CommandLog = Arc::default();
        (
            Self {
                log: log.clone(),
                fail_after: None,
                issued: 0,
                stopped: Arc::default(),
            },
            log,
        )
    }

    /// Fail with a hardware fault once `count` commands have succeeded.
    pub fn fail_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Handle that observes `stop` after the actuator moves into a worker.
    pub fn stop_observer(&self) -> Arc<AtomicBool> {
        self.stopped.clone()
    }
}

impl Actuator for RecordingActuator {
    fn set_level(&mut self, duty: f32) -> Result<(), ActuatorError> {
        check_duty(duty)?;
        if let Some(limit) = self.fail_after {
            if self.issued >= limit {
                return Err(ActuatorError::Hardware("injected fault".into()));
            }
        }
        self.issued += 1;
        if let Ok(mut log) = self.log.lock() {
            log.push(CommandRecord {
                duty,
                at: Instant::now(),
            });
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duty_presets_are_valid_levels() {
        for duty in [LEFT_DUTY, RIGHT_DUTY, CENTER_DUTY] {
            assert!(check_duty(duty).is_ok());
        }
    }

    #[test]
    fn out_of_range_duty_is_rejected() {
        let mut actuator = LoggingActuator::new();
        assert!(matches!(
            actuator.set_level(120.0),
            Err(ActuatorError::InvalidDuty(_))
        ));
        assert!(matches!(
            actuator.set_level(-1.0),
            Err(ActuatorError::InvalidDuty(_))
        ));
    }

    #[test]
    fn recording_actuator_captures_command_order() {
        let (mut actuator, log) = RecordingActuator::new();
        actuator.set_level(RIGHT_DUTY).unwrap();
        actuator.set_level(CENTER_DUTY).unwrap();
        actuator.stop();

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].duty, RIGHT_DUTY);
        assert_eq!(log[1].duty, CENTER_DUTY);
        assert!(actuator.is_stopped());
    }

    #[test]
    fn injected_fault_fires_after_threshold() {
        let (actuator, log) = RecordingActuator::new();
        let mut actuator = actuator.fail_after(1);
        actuator.set_level(LEFT_DUTY).unwrap();
        assert!(matches!(
            actuator.set_level(LEFT_DUTY),
            Err(ActuatorError::Hardware(_))
        ));
        assert_eq!(log.lock().unwrap().len(), 1);
    }
}
