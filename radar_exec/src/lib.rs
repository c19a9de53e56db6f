//! # Radar rover library.
//!
//! This library allows other crates in the workspace (and the integration tests) to access items
//! defined inside the radar executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Actuator control - drives the rangefinder mount and wheel servos
pub mod act_ctrl;

/// Command processor - validates and executes remote actions against the system state
pub mod cmd_proc;

/// Command server - the HTTP boundary which routes requests to the command processor
pub mod cmd_server;

/// Indicator panel - LED and buzzer boundary
pub mod panel;

/// Parameters for the radar executable
pub mod params;

/// Range sensor - pulse-echo distance measurement
pub mod range_sensor;

/// Raspberry Pi equipment - real GPIO-backed servos, sensor and panel
#[cfg(all(target_arch = "arm", target_os = "linux"))]
pub mod rpi;

/// Simulated equipment - servo, panel and ranger stand-ins for hosts without GPIO
pub mod sim;

/// System state - the shared state cell mutated by the sweep task and the command path
pub mod state;

/// Sweep scheduler - background task sweeping the rangefinder across its arc
pub mod sweep;
