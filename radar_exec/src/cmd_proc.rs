//! # Command Processor
//!
//! Executes remote actions against the system state and the equipment. Every action is handled
//! to completion here; movement actions while asleep and sweep requests while inactive are
//! silently dropped rather than rejected, and each execution finishes by building the current
//! status for the reply.
//!
//! Equipment faults never fail a command. A servo which cannot be commanded is logged and the
//! state transition stands, so the operator keeps control of a partially degraded rover.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use std::sync::{Mutex, MutexGuard, PoisonError};

// Internal
use crate::act_ctrl::{ActCtrl, ServoDriver};
use crate::panel::{ModeIndicator, Panel, SHORT_BEEP};
use crate::state::StateHandle;
use comms_if::cmd::Action;
use comms_if::status::StatusReport;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Wheel speed magnitude used for all movement commands.
const DRIVE_SPEED: i8 = 50;

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Execute one action and return the resulting status.
pub fn exec<S: ServoDriver, P: Panel>(
    state: &StateHandle,
    acts: &Mutex<ActCtrl<S>>,
    panel: &Mutex<P>,
    action: Action,
) -> StatusReport {
    debug!("Executing \"{}\"", action.as_str());

    match action {
        Action::Activate => activate(state, acts, panel),
        Action::Deactivate => enter_sleep(state, acts, panel),
        Action::Forward => drive(state, acts, DRIVE_SPEED, -DRIVE_SPEED),
        Action::Reverse => drive(state, acts, -DRIVE_SPEED, DRIVE_SPEED),
        Action::Left => drive(state, acts, -DRIVE_SPEED, -DRIVE_SPEED),
        Action::Right => drive(state, acts, DRIVE_SPEED, DRIVE_SPEED),
        // Stopping is always honoured, even while asleep
        Action::Stop => {
            if let Err(e) = lock(acts).set_wheel_speeds(0, 0) {
                warn!("Could not command the wheel servos: {}", e);
            }
        }
        Action::StartScan => {
            if !state.start_sweep() {
                debug!("Sweep request dropped, system is not active");
            }
        }
        Action::StopScan => {
            state.stop_sweep();
            lock(panel).set_sweep(false);
        }
    }

    state.status()
}

/// Transition the system into sleep mode.
///
/// De-energises all servos, stops the sweep and shows the sleep indication. Also used at boot to
/// establish the initial state, and is safe to repeat.
pub fn enter_sleep<S: ServoDriver, P: Panel>(
    state: &StateHandle,
    acts: &Mutex<ActCtrl<S>>,
    panel: &Mutex<P>,
) {
    state.enter_sleep();

    if let Err(e) = lock(acts).stop_all() {
        warn!("Could not de-energise the servos: {}", e);
    }

    let mut panel = lock(panel);
    panel.set_sweep(false);
    panel.set_mode(ModeIndicator::Sleep);
    panel.silence();

    info!("System in sleep mode");
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Transition the system into active mode, recentring the mount and holding the wheels still.
fn activate<S: ServoDriver, P: Panel>(
    state: &StateHandle,
    acts: &Mutex<ActCtrl<S>>,
    panel: &Mutex<P>,
) {
    state.activate();

    {
        let mut acts = lock(acts);
        if let Err(e) = acts.set_mount_angle(90) {
            warn!("Could not recentre the mount servo: {}", e);
        }
        if let Err(e) = acts.set_wheel_speeds(0, 0) {
            warn!("Could not command the wheel servos: {}", e);
        }
    }

    let mut panel = lock(panel);
    panel.set_mode(ModeIndicator::Active);
    panel.beep(SHORT_BEEP);

    info!("System active");
}

/// Command the wheel servos, provided the system is active.
fn drive<S: ServoDriver>(state: &StateHandle, acts: &Mutex<ActCtrl<S>>, left: i8, right: i8) {
    let (active, _) = state.mode();
    if !active {
        debug!("Movement command dropped, system is not active");
        return;
    }

    if let Err(e) = lock(acts).set_wheel_speeds(left, right) {
        warn!("Could not command the wheel servos: {}", e);
    }
}

/// Lock a mutex, recovering from poisoning.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::act_ctrl::{speed_to_duty, CENTRE_DUTY};
    use crate::sim::{SimPanel, SimPanelProbe, SimServo, SimServoProbe};

    struct Rig {
        state: StateHandle,
        acts: Mutex<ActCtrl<SimServo>>,
        panel: Mutex<SimPanel>,
        mount: SimServoProbe,
        left: SimServoProbe,
        right: SimServoProbe,
        panel_probe: SimPanelProbe,
    }

    fn rig() -> Rig {
        let mount = SimServo::new();
        let left = SimServo::new();
        let right = SimServo::new();
        let panel = SimPanel::new();
        let (mount_probe, left_probe, right_probe) = (mount.probe(), left.probe(), right.probe());
        let panel_probe = panel.probe();

        Rig {
            state: StateHandle::new(),
            acts: Mutex::new(ActCtrl::new(mount, left, right)),
            panel: Mutex::new(panel),
            mount: mount_probe,
            left: left_probe,
            right: right_probe,
            panel_probe,
        }
    }

    #[test]
    fn test_activate() {
        let rig = rig();

        let report = exec(&rig.state, &rig.acts, &rig.panel, Action::Activate);

        assert!(report.active);
        assert!(!report.sweeping);
        assert_eq!(report.angle, 90);
        assert_eq!(rig.mount.duty(), 5000);
        assert_eq!(rig.left.duty(), CENTRE_DUTY as u16);
        assert_eq!(rig.right.duty(), CENTRE_DUTY as u16);
        assert_eq!(rig.panel_probe.mode(), Some(ModeIndicator::Active));
        assert_eq!(rig.panel_probe.beeps(), vec![SHORT_BEEP]);
    }

    #[test]
    fn test_deactivate_de_energises() {
        let rig = rig();
        exec(&rig.state, &rig.acts, &rig.panel, Action::Activate);

        let report = exec(&rig.state, &rig.acts, &rig.panel, Action::Deactivate);

        assert!(!report.active);
        assert!(!report.sweeping);
        assert_eq!(rig.mount.duty(), 0);
        assert_eq!(rig.left.duty(), 0);
        assert_eq!(rig.right.duty(), 0);
        assert_eq!(rig.panel_probe.mode(), Some(ModeIndicator::Sleep));
    }

    #[test]
    fn test_movement_requires_active() {
        let rig = rig();

        let report = exec(&rig.state, &rig.acts, &rig.panel, Action::Forward);

        // Dropped without touching the servos
        assert!(!report.active);
        assert_eq!(rig.left.duty(), 0);
        assert_eq!(rig.right.duty(), 0);
    }

    #[test]
    fn test_movement_pairs() {
        let rig = rig();
        exec(&rig.state, &rig.acts, &rig.panel, Action::Activate);

        exec(&rig.state, &rig.acts, &rig.panel, Action::Forward);
        assert_eq!(rig.left.duty(), speed_to_duty(50));
        assert_eq!(rig.right.duty(), speed_to_duty(-50));

        exec(&rig.state, &rig.acts, &rig.panel, Action::Reverse);
        assert_eq!(rig.left.duty(), speed_to_duty(-50));
        assert_eq!(rig.right.duty(), speed_to_duty(50));

        exec(&rig.state, &rig.acts, &rig.panel, Action::Left);
        assert_eq!(rig.left.duty(), speed_to_duty(-50));
        assert_eq!(rig.right.duty(), speed_to_duty(-50));

        exec(&rig.state, &rig.acts, &rig.panel, Action::Right);
        assert_eq!(rig.left.duty(), speed_to_duty(50));
        assert_eq!(rig.right.duty(), speed_to_duty(50));

        exec(&rig.state, &rig.acts, &rig.panel, Action::Stop);
        assert_eq!(rig.left.duty(), CENTRE_DUTY as u16);
        assert_eq!(rig.right.duty(), CENTRE_DUTY as u16);
    }

    #[test]
    fn test_stop_works_while_inactive() {
        let rig = rig();

        let report = exec(&rig.state, &rig.acts, &rig.panel, Action::Stop);

        // Unlike movement, stop is honoured in sleep mode: the wheels are commanded to hold
        assert!(!report.active);
        assert_eq!(rig.left.duty(), speed_to_duty(0));
        assert_eq!(rig.right.duty(), speed_to_duty(0));
    }

    #[test]
    fn test_scan_requires_active() {
        let rig = rig();

        let report = exec(&rig.state, &rig.acts, &rig.panel, Action::StartScan);
        assert!(!report.sweeping);

        exec(&rig.state, &rig.acts, &rig.panel, Action::Activate);
        let report = exec(&rig.state, &rig.acts, &rig.panel, Action::StartScan);
        assert!(report.sweeping);

        let report = exec(&rig.state, &rig.acts, &rig.panel, Action::StopScan);
        assert!(report.active);
        assert!(!report.sweeping);
    }

    #[test]
    fn test_deactivate_preserves_scan_map() {
        let rig = rig();
        exec(&rig.state, &rig.acts, &rig.panel, Action::Activate);
        exec(&rig.state, &rig.acts, &rig.panel, Action::StartScan);
        rig.state.record_reading(45, 102.3);

        let report = exec(&rig.state, &rig.acts, &rig.panel, Action::Deactivate);

        assert_eq!(report.scan_data.get(&45), Some(&102.3));
    }
}
