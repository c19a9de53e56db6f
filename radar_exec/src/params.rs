//! # Radar Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::sweep::SweepParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the radar executable. Loaded from `radar_exec.toml`; every field has a
/// default, so a partial file is valid.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RadarExecParams {
    /// Command server parameters.
    pub server: ServerParams,

    /// Sweep task parameters.
    pub sweep: SweepParams,

    /// GPIO pin assignments (BCM numbering).
    pub pins: PinParams,
}

/// Command server parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerParams {
    /// Address to bind the command server to.
    pub bind_address: String,
}

/// GPIO pin assignments (BCM numbering).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PinParams {
    /// Rangefinder mount servo signal pin.
    pub mount_servo: u8,

    /// Left wheel servo signal pin.
    pub wheel_left_servo: u8,

    /// Right wheel servo signal pin.
    pub wheel_right_servo: u8,

    /// Rangefinder trigger pin.
    pub trig: u8,

    /// Rangefinder echo pin.
    pub echo: u8,

    /// Buzzer pin.
    pub buzzer: u8,

    /// Red (sleep mode) LED pin.
    pub led_red: u8,

    /// Green (active mode) LED pin.
    pub led_green: u8,

    /// Blue (sweep in progress) LED pin.
    pub led_blue: u8,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ServerParams {
    fn default() -> Self {
        Self {
            bind_address: String::from("0.0.0.0:8000"),
        }
    }
}

impl Default for PinParams {
    fn default() -> Self {
        Self {
            mount_servo: 15,
            wheel_left_servo: 11,
            wheel_right_servo: 10,
            trig: 17,
            echo: 18,
            buzzer: 16,
            led_red: 3,
            led_green: 5,
            led_blue: 4,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let params: RadarExecParams = toml::from_str(
            r#"
            [server]
            bind_address = "127.0.0.1:9000"

            [sweep]
            settle_ms = 50
            "#,
        )
        .unwrap();

        assert_eq!(params.server.bind_address, "127.0.0.1:9000");
        assert_eq!(params.sweep.settle_ms, 50);
        assert_eq!(params.sweep.idle_poll_ms, 100);
        assert_eq!(params.sweep.proximity_threshold_cm, 30.0);
        assert_eq!(params.pins.mount_servo, 15);
    }

    #[test]
    fn test_empty_file_is_valid() {
        let params: RadarExecParams = toml::from_str("").unwrap();
        assert_eq!(params.server.bind_address, "0.0.0.0:8000");
        assert_eq!(params.sweep.complete_pause_ms, 500);
        assert_eq!(params.pins.echo, 18);
    }
}
