//! # Raspberry Pi Equipment
//!
//! GPIO-backed implementations of the equipment seams: software-PWM servos, the pulse-echo
//! rangefinder pins and the LED/buzzer panel. Only compiled for Pi targets; everything here is
//! constructed once at boot by [`init`] from the pin assignments in the parameter file.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use rppal::gpio::{Gpio, InputPin, OutputPin};
use std::thread;
use std::time::Duration;
use thiserror::Error;

// Internal
use crate::act_ctrl::{ActCtrl, ServoDriver, ServoError, SERVO_FREQ_HZ};
use crate::panel::{ModeIndicator, Panel};
use crate::params::PinParams;
use crate::range_sensor::RangeSensor;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// The rangefinder over real GPIO pins.
pub type RpiRangeSensor = RangeSensor<OutputPin, InputPin>;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur while initialising the GPIO equipment.
#[derive(Debug, Error)]
pub enum GpioInitError {
    #[error("Could not access the GPIO peripheral: {0}")]
    GpioError(#[from] rppal::gpio::Error),
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A servo driven by software PWM on a plain GPIO pin.
pub struct SoftPwmServo {
    pin: OutputPin,
}

/// The LED/buzzer panel over real GPIO pins.
pub struct GpioPanel {
    red: OutputPin,
    green: OutputPin,
    blue: OutputPin,
    buzzer: OutputPin,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Initialise all GPIO equipment from the given pin assignments.
pub fn init(pins: &PinParams) -> Result<(ActCtrl<SoftPwmServo>, RpiRangeSensor, GpioPanel), GpioInitError> {
    let gpio = Gpio::new()?;

    let acts = ActCtrl::new(
        SoftPwmServo::new(&gpio, pins.mount_servo)?,
        SoftPwmServo::new(&gpio, pins.wheel_left_servo)?,
        SoftPwmServo::new(&gpio, pins.wheel_right_servo)?,
    );

    let sensor = RangeSensor::new(
        gpio.get(pins.trig)?.into_output(),
        gpio.get(pins.echo)?.into_input(),
    );

    let panel = GpioPanel {
        red: gpio.get(pins.led_red)?.into_output(),
        green: gpio.get(pins.led_green)?.into_output(),
        blue: gpio.get(pins.led_blue)?.into_output(),
        buzzer: gpio.get(pins.buzzer)?.into_output(),
    };

    Ok((acts, sensor, panel))
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SoftPwmServo {
    /// Claim the given pin for a software PWM servo.
    pub fn new(gpio: &Gpio, pin: u8) -> Result<Self, GpioInitError> {
        Ok(Self {
            pin: gpio.get(pin)?.into_output(),
        })
    }
}

impl ServoDriver for SoftPwmServo {
    fn set_duty(&mut self, duty: u16) -> Result<(), ServoError> {
        // The device duty unit is a 16 bit fraction of the PWM period
        let duty_cycle = duty as f64 / u16::MAX as f64;
        self.pin
            .set_pwm_frequency(SERVO_FREQ_HZ, duty_cycle)
            .map_err(|e| ServoError::SetDuty(e.to_string()))
    }
}

impl Panel for GpioPanel {
    fn set_mode(&mut self, mode: ModeIndicator) {
        match mode {
            ModeIndicator::Sleep => {
                self.red.set_high();
                self.green.set_low();
            }
            ModeIndicator::Active => {
                self.red.set_low();
                self.green.set_high();
            }
        }
    }

    fn set_sweep(&mut self, on: bool) {
        if on {
            self.blue.set_high();
        } else {
            self.blue.set_low();
        }
    }

    fn beep(&mut self, duration: Duration) {
        self.buzzer.set_high();
        thread::sleep(duration);
        self.buzzer.set_low();
    }

    fn silence(&mut self) {
        self.buzzer.set_low();
    }
}
