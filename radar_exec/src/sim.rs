//! # Simulated Equipment
//!
//! Stand-ins for the GPIO-backed equipment, used on hosts without GPIO and throughout the test
//! suite. Each simulated device exposes a probe handle so observers can inspect the commands it
//! received without owning the device itself.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::debug;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

// Internal
use crate::act_ctrl::{ServoDriver, ServoError};
use crate::panel::{ModeIndicator, Panel};
use crate::range_sensor::{Ranger, NO_READING};

// ------------------------------------------------------------------------------------------------
// SERVOS
// ------------------------------------------------------------------------------------------------

/// A servo which simply records the last duty commanded to it.
pub struct SimServo {
    duty: Arc<AtomicU16>,
}

/// Observer handle onto a [`SimServo`].
pub struct SimServoProbe {
    duty: Arc<AtomicU16>,
}

impl SimServo {
    /// Create a new simulated servo, initially de-energised.
    pub fn new() -> Self {
        Self {
            duty: Arc::new(AtomicU16::new(0)),
        }
    }

    /// Get a probe onto this servo.
    pub fn probe(&self) -> SimServoProbe {
        SimServoProbe {
            duty: self.duty.clone(),
        }
    }
}

impl Default for SimServo {
    fn default() -> Self {
        Self::new()
    }
}

impl ServoDriver for SimServo {
    fn set_duty(&mut self, duty: u16) -> Result<(), ServoError> {
        self.duty.store(duty, Ordering::SeqCst);
        Ok(())
    }
}

impl SimServoProbe {
    /// The last duty commanded to the servo.
    pub fn duty(&self) -> u16 {
        self.duty.load(Ordering::SeqCst)
    }
}

// ------------------------------------------------------------------------------------------------
// PANEL
// ------------------------------------------------------------------------------------------------

/// The observable record behind a [`SimPanel`].
#[derive(Debug, Default)]
struct PanelRecord {
    mode: Option<ModeIndicator>,
    sweep_on: bool,
    beeps: Vec<Duration>,
}

/// A panel which records every indication instead of driving hardware.
///
/// Unlike a hardware buzzer, `beep` does not block.
pub struct SimPanel {
    record: Arc<Mutex<PanelRecord>>,
}

/// Observer handle onto a [`SimPanel`].
pub struct SimPanelProbe {
    record: Arc<Mutex<PanelRecord>>,
}

impl SimPanel {
    /// Create a new simulated panel with nothing indicated.
    pub fn new() -> Self {
        Self {
            record: Arc::new(Mutex::new(PanelRecord::default())),
        }
    }

    /// Get a probe onto this panel.
    pub fn probe(&self) -> SimPanelProbe {
        SimPanelProbe {
            record: self.record.clone(),
        }
    }
}

impl Default for SimPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Panel for SimPanel {
    fn set_mode(&mut self, mode: ModeIndicator) {
        debug!("Panel mode indicator: {:?}", mode);
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .mode = Some(mode);
    }

    fn set_sweep(&mut self, on: bool) {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sweep_on = on;
    }

    fn beep(&mut self, duration: Duration) {
        debug!("Panel beep: {} ms", duration.as_millis());
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .beeps
            .push(duration);
    }

    fn silence(&mut self) {
        // The simulated buzzer has no sustained state to cut off
    }
}

impl SimPanelProbe {
    /// The last mode indicated, or `None` if no mode has been shown yet.
    pub fn mode(&self) -> Option<ModeIndicator> {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .mode
    }

    /// Whether the sweep indicator is currently on.
    pub fn sweep_on(&self) -> bool {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sweep_on
    }

    /// Every beep sounded so far, in order.
    pub fn beeps(&self) -> Vec<Duration> {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .beeps
            .clone()
    }
}

// ------------------------------------------------------------------------------------------------
// RANGERS
// ------------------------------------------------------------------------------------------------

/// A ranger which always reports the same distance.
pub struct FixedRanger(f64);

impl FixedRanger {
    /// Create a ranger which always reports `distance_cm`.
    pub fn new(distance_cm: f64) -> Self {
        Self(distance_cm)
    }
}

impl Ranger for FixedRanger {
    fn measure(&mut self) -> f64 {
        self.0
    }
}

/// A ranger which plays back a scripted sequence of readings.
///
/// Once the script is exhausted every further measurement reports [`NO_READING`].
pub struct ScriptedRanger {
    readings: VecDeque<f64>,
}

impl ScriptedRanger {
    /// Create a ranger which reports the given readings in order.
    pub fn new(readings: Vec<f64>) -> Self {
        Self {
            readings: readings.into(),
        }
    }
}

impl Ranger for ScriptedRanger {
    fn measure(&mut self) -> f64 {
        self.readings.pop_front().unwrap_or(NO_READING)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_scripted_ranger_exhaustion() {
        let mut ranger = ScriptedRanger::new(vec![10.0, 20.0]);
        assert_eq!(ranger.measure(), 10.0);
        assert_eq!(ranger.measure(), 20.0);
        assert_eq!(ranger.measure(), NO_READING);
    }

    #[test]
    fn test_panel_record() {
        let mut panel = SimPanel::new();
        let probe = panel.probe();

        assert_eq!(probe.mode(), None);
        assert!(!probe.sweep_on());

        panel.set_mode(ModeIndicator::Active);
        panel.set_sweep(true);
        panel.beep(Duration::from_millis(50));
        panel.beep(Duration::from_millis(200));

        assert_eq!(probe.mode(), Some(ModeIndicator::Active));
        assert!(probe.sweep_on());
        assert_eq!(
            probe.beeps(),
            vec![Duration::from_millis(50), Duration::from_millis(200)]
        );
    }
}
