//! # Status document
//!
//! The status document is the response body for both a status query and every command
//! execution. It is a JSON snapshot of the shared system state.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Sentinel distance value meaning "no valid reading".
pub const NO_READING: f64 = -1.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Snapshot of the system state as reported to the remote operator.
///
/// `scan_data` maps sweep angles (multiples of 5 in `[0, 180]`) to distances in centimetres.
/// A `BTreeMap` is used so the document serialises with stable key ordering.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StatusReport {
    /// Whether actuation is enabled.
    pub active: bool,

    /// Whether the background sweep is running.
    pub sweeping: bool,

    /// Last commanded mount angle in degrees, in `[0, 180]`.
    pub angle: u16,

    /// Most recent valid reading in centimetres, rounded to 1 decimal, or [`NO_READING`].
    pub distance: f64,

    /// Per-angle readings accumulated by the current sweep.
    pub scan_data: BTreeMap<u16, f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StatusReport {
    /// Round a raw distance to the 1 decimal place used on the wire.
    ///
    /// The sentinel passes through unchanged.
    pub fn round_distance(distance: f64) -> f64 {
        (distance * 10.0).round() / 10.0
    }
}

impl Default for StatusReport {
    fn default() -> Self {
        Self {
            active: false,
            sweeping: false,
            angle: 90,
            distance: NO_READING,
            scan_data: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
