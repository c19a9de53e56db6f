//! # Range Sensor Module
//!
//! Pulse-echo distance measurement. One measurement triggers an ultrasonic pulse and times the
//! echo line: the echo's high time is proportional to the round trip of the pulse, so distance
//! is `elapsed_us * 0.0343 / 2` centimetres at the nominal ~343 m/s speed of sound.
//!
//! Measurement is a blocking, busy-polling operation which runs to completion (or timeout)
//! before returning - it is not cancellable mid-measurement. A timeout, an out-of-range result
//! or a pin fault is reported as the sentinel [`NO_READING`], never as an error.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use embedded_hal::digital::v2::{InputPin, OutputPin};
use std::thread;
use std::time::{Duration, Instant};

pub use comms_if::status::NO_READING;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Settle time holding the trigger line low before the pulse.
const TRIG_SETTLE: Duration = Duration::from_micros(2);

/// Width of the trigger pulse.
const TRIG_PULSE: Duration = Duration::from_micros(10);

/// Hard timeout for each echo wait stage.
const ECHO_TIMEOUT: Duration = Duration::from_micros(30_000);

/// Speed of sound in centimetres per microsecond.
const SPEED_OF_SOUND_CM_PER_US: f64 = 0.0343;

/// Computed distances at or beyond this value are treated as unreliable.
pub const MAX_RANGE_CM: f64 = 400.0;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Something which can produce one distance reading.
///
/// The sweep task depends on this seam rather than on the hardware sensor, so it can be driven
/// by scripted readings in tests and by synthetic equipment on hosts without GPIO.
pub trait Ranger {
    /// Take one reading: centimetres in `[0, 400)`, or [`NO_READING`].
    fn measure(&mut self) -> f64;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The pulse-echo rangefinder, generic over its trigger and echo pins.
pub struct RangeSensor<TRIG, ECHO> {
    trig: TRIG,
    echo: ECHO,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<TRIG, ECHO> RangeSensor<TRIG, ECHO>
where
    TRIG: OutputPin,
    ECHO: InputPin,
{
    /// Create a new sensor over the given pins.
    pub fn new(trig: TRIG, echo: ECHO) -> Self {
        Self { trig, echo }
    }

    /// Perform one measurement.
    ///
    /// Returns the distance in centimetres, or [`NO_READING`] on timeout, out-of-range result
    /// or pin fault. At this interface a pin fault is indistinguishable from "no echo".
    pub fn measure(&mut self) -> f64 {
        // Trigger pulse: low settle, 10 us high, low again
        if self.trig.set_low().is_err() {
            return NO_READING;
        }
        thread::sleep(TRIG_SETTLE);
        if self.trig.set_high().is_err() {
            return NO_READING;
        }
        thread::sleep(TRIG_PULSE);
        if self.trig.set_low().is_err() {
            return NO_READING;
        }

        // Wait for the echo line to rise
        let wait_start = Instant::now();
        loop {
            match self.echo.is_high() {
                Ok(true) => break,
                Ok(false) => (),
                Err(_) => return NO_READING,
            }
            if wait_start.elapsed() > ECHO_TIMEOUT {
                return NO_READING;
            }
        }

        // Wait for the echo line to fall, timing the pulse
        let rise = Instant::now();
        let pulse = loop {
            match self.echo.is_high() {
                Ok(false) => break rise.elapsed(),
                Ok(true) => (),
                Err(_) => return NO_READING,
            }
            if rise.elapsed() > ECHO_TIMEOUT {
                return NO_READING;
            }
        };

        let distance = pulse.as_micros() as f64 * SPEED_OF_SOUND_CM_PER_US / 2.0;

        if distance >= MAX_RANGE_CM {
            NO_READING
        } else {
            distance
        }
    }
}

impl<TRIG, ECHO> Ranger for RangeSensor<TRIG, ECHO>
where
    TRIG: OutputPin,
    ECHO: InputPin,
{
    fn measure(&mut self) -> f64 {
        RangeSensor::measure(self)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};

    /// Shared timestamp of the last trigger pulse's falling edge.
    type TrigInstant = Arc<Mutex<Option<Instant>>>;

    /// Trigger pin which records when the trigger pulse ends.
    struct TestTrigPin {
        fired: TrigInstant,
        level: bool,
    }

    /// Echo pin whose level follows a scripted profile relative to the trigger pulse.
    ///
    /// The line is high in the window `[rise_after, fall_after)` measured from the end of the
    /// trigger pulse. `None` for either bound means the edge never happens.
    struct TestEchoPin {
        fired: TrigInstant,
        rise_after: Option<Duration>,
        fall_after: Option<Duration>,
    }

    impl OutputPin for TestTrigPin {
        type Error = Infallible;

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.level = true;
            Ok(())
        }

        fn set_low(&mut self) -> Result<(), Infallible> {
            if self.level {
                *self.fired.lock().unwrap() = Some(Instant::now());
            }
            self.level = false;
            Ok(())
        }
    }

    impl InputPin for TestEchoPin {
        type Error = Infallible;

        fn is_high(&self) -> Result<bool, Infallible> {
            let fired = self.fired.lock().unwrap();
            let elapsed = match *fired {
                Some(t0) => t0.elapsed(),
                None => return Ok(false),
            };
            let high = match self.rise_after {
                Some(rise) => {
                    elapsed >= rise
                        && match self.fall_after {
                            Some(fall) => elapsed < fall,
                            None => true,
                        }
                }
                None => false,
            };
            Ok(high)
        }

        fn is_low(&self) -> Result<bool, Infallible> {
            self.is_high().map(|h| !h)
        }
    }

    fn sensor(
        rise_after: Option<Duration>,
        fall_after: Option<Duration>,
    ) -> RangeSensor<TestTrigPin, TestEchoPin> {
        let fired: TrigInstant = Arc::new(Mutex::new(None));
        RangeSensor::new(
            TestTrigPin {
                fired: fired.clone(),
                level: false,
            },
            TestEchoPin {
                fired,
                rise_after,
                fall_after,
            },
        )
    }

    #[test]
    fn test_nominal_reading() {
        // 583 us echo pulse is ~10 cm
        let mut sensor = sensor(
            Some(Duration::from_micros(100)),
            Some(Duration::from_micros(683)),
        );

        let distance = sensor.measure();
        assert!(
            distance > 8.0 && distance < 12.0,
            "expected ~10 cm, got {}",
            distance
        );
    }

    #[test]
    fn test_echo_never_rises() {
        let mut sensor = sensor(None, None);
        assert_eq!(sensor.measure(), NO_READING);
    }

    #[test]
    fn test_echo_never_falls() {
        let mut sensor = sensor(Some(Duration::from_micros(100)), None);
        assert_eq!(sensor.measure(), NO_READING);
    }

    #[test]
    fn test_out_of_range_reading() {
        // ~24 ms pulse computes to ~411 cm, which is beyond the reliable range
        let mut sensor = sensor(
            Some(Duration::from_micros(100)),
            Some(Duration::from_micros(24_100)),
        );
        assert_eq!(sensor.measure(), NO_READING);
    }
}
