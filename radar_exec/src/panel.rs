//! # Indicator Panel
//!
//! Boundary abstraction over the rover's status LEDs and buzzer. The panel is deliberately
//! dumb: mode/sweep indicators are on/off and the buzzer is a timed on/off pulse. Anything
//! smarter (tones, patterns) lives outside the scope of this software.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::time::Duration;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Beep used for command acknowledgment and proximity alerts.
pub const SHORT_BEEP: Duration = Duration::from_millis(50);

/// Beep used to signal a completed sweep arc.
pub const COMPLETION_BEEP: Duration = Duration::from_millis(200);

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The two system mode indications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeIndicator {
    /// Sleep mode - actuation disabled.
    Sleep,

    /// Active mode - actuation enabled.
    Active,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Trait over the indicator/buzzer hardware.
pub trait Panel {
    /// Show the given system mode.
    fn set_mode(&mut self, mode: ModeIndicator);

    /// Turn the sweep-in-progress indicator on or off.
    fn set_sweep(&mut self, on: bool);

    /// Sound the buzzer for the given duration. May block the calling thread.
    fn beep(&mut self, duration: Duration);

    /// Force the buzzer off.
    fn silence(&mut self);
}
