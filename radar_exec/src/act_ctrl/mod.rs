//! # Actuator Control Module
//!
//! This module provides a unified servo control interface which abstracts over the servo
//! backend, and the controller which drives the rover's three servos:
//! - the positional mount servo carrying the rangefinder, and
//! - the two continuous-rotation wheel servos.
//!
//! Both actuation modes reduce to a single normalised duty command in the device duty unit
//! (a 16 bit PWM duty at 50 Hz).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use util::maths;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// PWM frequency for standard servos.
pub const SERVO_FREQ_HZ: f64 = 50.0;

/// Duty commanded for the positional servo at 0°.
pub const MIN_DUTY: u16 = 1000;

/// Duty commanded for the positional servo at 180°.
pub const MAX_DUTY: u16 = 9000;

/// Duty at which a continuous-rotation servo holds still.
pub const CENTRE_DUTY: f64 = 4915.0;

/// Duty units per unit of continuous-rotation speed.
pub const DUTY_PER_SPEED: f64 = 19.685;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait providing a unified API for commanding one servo.
pub trait ServoDriver {
    /// Set the raw duty of the servo, in the device duty unit.
    ///
    /// A duty of zero de-energises the servo, which is distinct from commanding a
    /// continuous-rotation servo to hold still ([`CENTRE_DUTY`]).
    fn set_duty(&mut self, duty: u16) -> Result<(), ServoError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur while commanding a servo.
#[derive(thiserror::Error, Debug)]
pub enum ServoError {
    #[error("Could not set the PWM duty: {0}")]
    SetDuty(String),
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Controller over the rover's three servos.
pub struct ActCtrl<S: ServoDriver> {
    mount: S,
    wheel_left: S,
    wheel_right: S,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Map a mount angle in degrees to a duty value.
///
/// Out of range angles are clamped into `[0, 180]`. The mapping is linear with `0 -> MIN_DUTY`
/// and `180 -> MAX_DUTY`.
pub fn angle_to_duty(angle_deg: i64) -> u16 {
    let angle = maths::clamp(&(angle_deg as f64), &0.0, &180.0);
    maths::lin_map((0.0, 180.0), (MIN_DUTY as f64, MAX_DUTY as f64), angle) as u16
}

/// Map a signed wheel speed in `[-100, 100]` to a duty value.
///
/// Speed 0 maps exactly to [`CENTRE_DUTY`]. Values outside the range are a caller contract
/// violation and are not clamped.
pub fn speed_to_duty(speed: i8) -> u16 {
    (CENTRE_DUTY + speed as f64 * DUTY_PER_SPEED) as u16
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<S: ServoDriver> ActCtrl<S> {
    /// Create a new actuator controller over the given servos.
    pub fn new(mount: S, wheel_left: S, wheel_right: S) -> Self {
        Self {
            mount,
            wheel_left,
            wheel_right,
        }
    }

    /// Command the rangefinder mount to the given angle.
    pub fn set_mount_angle(&mut self, angle_deg: i64) -> Result<(), ServoError> {
        self.mount.set_duty(angle_to_duty(angle_deg))
    }

    /// Command the wheel servos to the given signed speeds.
    pub fn set_wheel_speeds(&mut self, left: i8, right: i8) -> Result<(), ServoError> {
        self.wheel_left.set_duty(speed_to_duty(left))?;
        self.wheel_right.set_duty(speed_to_duty(right))
    }

    /// De-energise all three servos.
    ///
    /// Used by the sleep transition, not for ordinary speed-zero stops.
    pub fn stop_all(&mut self) -> Result<(), ServoError> {
        self.mount.set_duty(0)?;
        self.wheel_left.set_duty(0)?;
        self.wheel_right.set_duty(0)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::SimServo;

    #[test]
    fn test_angle_mapping_endpoints() {
        assert_eq!(angle_to_duty(0), MIN_DUTY);
        assert_eq!(angle_to_duty(180), MAX_DUTY);
        assert_eq!(angle_to_duty(90), 5000);
    }

    #[test]
    fn test_angle_mapping_clamps() {
        assert_eq!(angle_to_duty(-45), MIN_DUTY);
        assert_eq!(angle_to_duty(300), MAX_DUTY);
    }

    #[test]
    fn test_angle_mapping_monotonic() {
        let mut last = 0;
        for angle in 0..=180 {
            let duty = angle_to_duty(angle);
            assert!(duty >= last, "duty not monotonic at angle {}", angle);
            last = duty;
        }
    }

    #[test]
    fn test_speed_mapping() {
        assert_eq!(speed_to_duty(0), CENTRE_DUTY as u16);

        let mut last = 0;
        for speed in -100..=100 {
            let duty = speed_to_duty(speed);
            assert!(duty >= last, "duty not monotonic at speed {}", speed);
            last = duty;
        }
    }

    #[test]
    fn test_act_ctrl_commands() {
        let mount = SimServo::new();
        let left = SimServo::new();
        let right = SimServo::new();
        let (mount_probe, left_probe, right_probe) = (mount.probe(), left.probe(), right.probe());

        let mut acts = ActCtrl::new(mount, left, right);

        acts.set_mount_angle(90).unwrap();
        assert_eq!(mount_probe.duty(), 5000);

        acts.set_wheel_speeds(50, -50).unwrap();
        assert_eq!(left_probe.duty(), speed_to_duty(50));
        assert_eq!(right_probe.duty(), speed_to_duty(-50));

        acts.stop_all().unwrap();
        assert_eq!(mount_probe.duty(), 0);
        assert_eq!(left_probe.duty(), 0);
        assert_eq!(right_probe.duty(), 0);
    }
}
