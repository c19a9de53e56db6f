//! # Command module
//!
//! This module defines the fixed set of actions which can be commanded by the remote operator.
//! Actions arrive as the `action` query parameter of a command request and are executed
//! synchronously by the command processor in `radar_exec`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An action commanded by the remote operator.
///
/// Each variant maps one-to-one to a wire-level action string. Strings outside this set are
/// treated as successful no-ops by the command processor, not as errors.
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, Copy, Clone)]
pub enum Action {
    /// Wake the system from sleep mode, enabling actuation.
    Activate,

    /// Enter sleep mode, de-energising all actuators.
    Deactivate,

    /// Drive forwards.
    Forward,

    /// Drive in reverse.
    Reverse,

    /// Pivot turn left.
    Left,

    /// Pivot turn right.
    Right,

    /// Stop all drive movement.
    Stop,

    /// Start the background sweep.
    StartScan,

    /// Stop the background sweep.
    StopScan,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Action {
    /// Parse an action from its wire-level string.
    ///
    /// Returns `None` if the string is not a recognised action.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "activate" => Some(Action::Activate),
            "deactivate" => Some(Action::Deactivate),
            "forward" => Some(Action::Forward),
            "reverse" => Some(Action::Reverse),
            "left" => Some(Action::Left),
            "right" => Some(Action::Right),
            "stop" => Some(Action::Stop),
            "start_scan" => Some(Action::StartScan),
            "stop_scan" => Some(Action::StopScan),
            _ => None,
        }
    }

    /// Get the wire-level string for this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Activate => "activate",
            Action::Deactivate => "deactivate",
            Action::Forward => "forward",
            Action::Reverse => "reverse",
            Action::Left => "left",
            Action::Right => "right",
            Action::Stop => "stop",
            Action::StartScan => "start_scan",
            Action::StopScan => "stop_scan",
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
