//! # Sweep Scheduler
//!
//! Background task which sweeps the rangefinder mount across its arc while a sweep is
//! requested, taking one reading at each step. When no sweep is requested the task idles,
//! polling the shared state. Arcs repeat until the sweep is stopped.
//!
//! The task is cooperative: between steps it re-checks the state and aborts the arc as soon as
//! the sweep or the whole system is deactivated. A step in progress always completes, so an
//! abort can land at most one more reading in the scan map.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

// Internal
use crate::act_ctrl::{ActCtrl, ServoDriver};
use crate::panel::{Panel, COMPLETION_BEEP, SHORT_BEEP};
use crate::range_sensor::Ranger;
use crate::state::StateHandle;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Step between successive mount angles in a sweep arc.
pub const SWEEP_STEP_DEG: u16 = 5;

/// Final mount angle of a sweep arc. Arcs run `0..=SWEEP_MAX_DEG`.
pub const SWEEP_MAX_DEG: u16 = 180;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Timing and threshold parameters of the sweep task.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SweepParams {
    /// Period between state polls while no sweep is requested (ms).
    pub idle_poll_ms: u64,

    /// Settle time after commanding the mount, before measuring (ms).
    pub settle_ms: u64,

    /// Pause after a completed arc, before the next one starts (ms).
    pub complete_pause_ms: u64,

    /// Readings strictly below this distance raise a proximity alert (cm).
    pub proximity_threshold_cm: f64,
}

/// The sweep task itself. Built on the main thread, then consumed by [`SweepTask::spawn`].
pub struct SweepTask<S: ServoDriver, R: Ranger, P: Panel> {
    state: StateHandle,
    acts: Arc<Mutex<ActCtrl<S>>>,
    ranger: R,
    panel: Arc<Mutex<P>>,
    params: SweepParams,
    shutdown: Arc<AtomicBool>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            idle_poll_ms: 100,
            settle_ms: 100,
            complete_pause_ms: 500,
            proximity_threshold_cm: 30.0,
        }
    }
}

impl<S, R, P> SweepTask<S, R, P>
where
    S: ServoDriver + Send + 'static,
    R: Ranger + Send + 'static,
    P: Panel + Send + 'static,
{
    /// Create a new sweep task.
    pub fn new(
        state: StateHandle,
        acts: Arc<Mutex<ActCtrl<S>>>,
        ranger: R,
        panel: Arc<Mutex<P>>,
        params: SweepParams,
    ) -> Self {
        Self {
            state,
            acts,
            ranger,
            panel,
            params,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the flag which, once set, makes the task exit at its next decision point.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Spawn the task on its own named thread.
    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("sweep".into())
            .spawn(move || self.run())
    }

    /// The task body. Public so tests can run it on a thread they control.
    pub fn run(mut self) {
        info!("Sweep task running");

        while !self.shutdown.load(Ordering::Relaxed) {
            let (active, sweeping) = self.state.mode();

            if active && sweeping {
                lock(&self.panel).set_sweep(true);

                if self.run_arc() {
                    // Stop requests landing during the final step skip the completion tone
                    if self.state.mode() == (true, true) {
                        lock(&self.panel).beep(COMPLETION_BEEP);
                        lock(&self.panel).set_sweep(false);
                        thread::sleep(Duration::from_millis(self.params.complete_pause_ms));
                    } else {
                        lock(&self.panel).set_sweep(false);
                    }
                } else {
                    lock(&self.panel).set_sweep(false);
                }
            } else {
                thread::sleep(Duration::from_millis(self.params.idle_poll_ms));
            }
        }

        info!("Sweep task stopped");
    }

    /// Run one arc over `0..=180` degrees.
    ///
    /// Returns true if the arc ran to completion, false if it was aborted.
    fn run_arc(&mut self) -> bool {
        debug!("Sweep arc starting");

        for angle in (0..=SWEEP_MAX_DEG).step_by(SWEEP_STEP_DEG as usize) {
            if self.shutdown.load(Ordering::Relaxed) || self.state.mode() != (true, true) {
                debug!("Sweep arc aborted at {} deg", angle);
                return false;
            }

            if let Err(e) = lock(&self.acts).set_mount_angle(angle as i64) {
                warn!("Could not command the mount servo: {}", e);
            }
            self.state.set_current_angle(angle);

            thread::sleep(Duration::from_millis(self.params.settle_ms));

            let distance = self.ranger.measure();
            if distance >= 0.0 {
                self.state.record_reading(angle, distance);

                if distance < self.params.proximity_threshold_cm {
                    debug!("Proximity alert: {:.1} cm at {} deg", distance, angle);
                    lock(&self.panel).beep(SHORT_BEEP);
                }
            }
        }

        debug!("Sweep arc complete");
        true
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Lock a mutex, recovering from poisoning.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
