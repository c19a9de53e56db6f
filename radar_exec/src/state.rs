//! # System State
//!
//! The shared record of activation, sweep, current mount angle, last distance and the
//! accumulated per-angle scan map. It is mutated by both the sweep task and the command path,
//! so all access goes through [`StateHandle`], a synchronized cell offering snapshot reads and
//! guarded writes. A reader can never observe a partially-applied transition.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// Internal
use comms_if::status::{StatusReport, NO_READING};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The raw system state record.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarState {
    /// Whether actuation is enabled.
    pub active: bool,

    /// Whether the background sweep is running. Only ever set true while `active` is true,
    /// enforced at the transition point in [`StateHandle::start_sweep`].
    pub sweeping: bool,

    /// Last commanded mount angle in degrees, in `[0, 180]`.
    pub current_angle: u16,

    /// Most recent valid reading in centimetres, or [`NO_READING`].
    pub last_distance: f64,

    /// Readings of the current sweep, keyed by angle.
    pub scan_map: BTreeMap<u16, f64>,
}

/// Synchronized handle onto the single process-wide [`RadarState`].
///
/// Cheap to clone; all clones refer to the same state cell.
#[derive(Clone)]
pub struct StateHandle {
    inner: Arc<Mutex<RadarState>>,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Default for RadarState {
    fn default() -> Self {
        Self {
            active: false,
            sweeping: false,
            current_angle: 90,
            last_distance: NO_READING,
            scan_map: BTreeMap::new(),
        }
    }
}

impl StateHandle {
    /// Create a new state cell with the initial (sleep mode) state.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RadarState::default())),
        }
    }

    /// Lock the cell.
    ///
    /// A poisoned lock is recovered rather than propagated - the state record stays valid
    /// across a panicking writer since every mutation is a single assignment block.
    fn lock(&self) -> MutexGuard<RadarState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take a full snapshot of the state.
    pub fn snapshot(&self) -> RadarState {
        self.lock().clone()
    }

    /// Read `(active, sweeping)` as a single guarded snapshot.
    ///
    /// Decision points in the sweep task and command processor use this rather than two
    /// separate reads, so they never act on a stale combination.
    pub fn mode(&self) -> (bool, bool) {
        let state = self.lock();
        (state.active, state.sweeping)
    }

    /// Transition into sleep mode: actuation disabled and sweep stopped, in one guarded write.
    pub fn enter_sleep(&self) {
        let mut state = self.lock();
        state.active = false;
        state.sweeping = false;
    }

    /// Transition into active mode, recentring the recorded mount angle.
    pub fn activate(&self) {
        let mut state = self.lock();
        state.active = true;
        state.current_angle = 90;
    }

    /// Start the sweep, if and only if the system is active.
    ///
    /// Clears the scan map of the previous sweep. Returns whether the sweep was started; when
    /// inactive the request is silently dropped, not queued.
    pub fn start_sweep(&self) -> bool {
        let mut state = self.lock();
        if state.active {
            state.sweeping = true;
            state.scan_map.clear();
            true
        } else {
            false
        }
    }

    /// Stop the sweep. Always permitted.
    pub fn stop_sweep(&self) {
        self.lock().sweeping = false;
    }

    /// Record the mount angle just commanded by the sweep task.
    pub fn set_current_angle(&self, angle: u16) {
        self.lock().current_angle = angle;
    }

    /// Record one valid reading: updates the last distance and the scan map entry together.
    pub fn record_reading(&self, angle: u16, distance: f64) {
        let mut state = self.lock();
        state.last_distance = distance;
        state.scan_map.insert(angle, distance);
    }

    /// Build the wire status document from a single guarded snapshot.
    pub fn status(&self) -> StatusReport {
        let state = self.lock();
        StatusReport {
            active: state.active,
            sweeping: state.sweeping,
            angle: state.current_angle,
            distance: StatusReport::round_distance(state.last_distance),
            scan_data: state.scan_map.clone(),
        }
    }
}

impl Default for StateHandle {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = StateHandle::new().snapshot();
        assert!(!state.active);
        assert!(!state.sweeping);
        assert_eq!(state.current_angle, 90);
        assert_eq!(state.last_distance, NO_READING);
        assert!(state.scan_map.is_empty());
    }

    #[test]
    fn test_start_sweep_requires_active() {
        let handle = StateHandle::new();

        // Inactive: silently dropped
        assert!(!handle.start_sweep());
        assert_eq!(handle.mode(), (false, false));

        // Active: sweep starts and the previous map is cleared
        handle.activate();
        handle.record_reading(45, 120.0);
        assert!(handle.start_sweep());
        assert_eq!(handle.mode(), (true, true));
        assert!(handle.snapshot().scan_map.is_empty());
    }

    #[test]
    fn test_sleep_is_idempotent() {
        let handle = StateHandle::new();
        handle.activate();
        assert!(handle.start_sweep());

        handle.enter_sleep();
        let first = handle.snapshot();
        handle.enter_sleep();
        assert_eq!(handle.snapshot(), first);
        assert_eq!(handle.mode(), (false, false));
    }

    #[test]
    fn test_activate_is_idempotent() {
        let handle = StateHandle::new();
        handle.activate();
        handle.set_current_angle(45);

        // Repeating the transition converges on the same state, recentred angle included
        handle.activate();
        let first = handle.snapshot();
        handle.activate();
        assert_eq!(handle.snapshot(), first);
        assert_eq!(handle.mode(), (true, false));
        assert_eq!(first.current_angle, 90);
    }

    #[test]
    fn test_sleep_preserves_scan_map() {
        let handle = StateHandle::new();
        handle.activate();
        handle.start_sweep();
        handle.record_reading(45, 30.0);
        handle.record_reading(50, 25.0);

        handle.enter_sleep();

        let state = handle.snapshot();
        assert_eq!(state.scan_map.get(&45), Some(&30.0));
        assert_eq!(state.scan_map.get(&50), Some(&25.0));
    }

    #[test]
    fn test_status_rounds_distance() {
        let handle = StateHandle::new();
        handle.record_reading(10, 123.456);

        let report = handle.status();
        assert_eq!(report.distance, 123.5);
        assert_eq!(report.scan_data.get(&10), Some(&123.456));

        // Sentinel untouched
        let fresh = StateHandle::new();
        assert_eq!(fresh.status().distance, NO_READING);
    }
}
