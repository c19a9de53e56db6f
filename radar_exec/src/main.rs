//! Main radar rover executable entry point.
//!
//! # Architecture
//!
//! The executable runs two threads:
//!
//!     - The main thread, which initialises the equipment and then runs the command server,
//!       servicing one request at a time.
//!     - The sweep thread, which idles until a sweep is requested and then steps the
//!       rangefinder mount across its arc, recording one reading per step.
//!
//! The two threads share the system state through `StateHandle` and the actuators and panel
//! through mutexes, so a movement command and a sweep step are serialised at the servo level.
//!
//! On targets without GPIO the executable runs against simulated equipment, which keeps the
//! whole command path exercisable on a development host.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::info;
use std::sync::{Arc, Mutex};

// Internal
use radar_lib::{
    act_ctrl::{ActCtrl, ServoDriver},
    cmd_proc,
    cmd_server::CmdServer,
    panel::Panel,
    params::RadarExecParams,
    range_sensor::Ranger,
    state::StateHandle,
    sweep::SweepTask,
};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("radar_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Radar Rover Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: RadarExecParams =
        util::params::load("radar_exec.toml").wrap_err("Could not load radar_exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE EQUIPMENT AND RUN ----

    run(params)
}

/// Initialise the GPIO equipment and run the rover.
#[cfg(all(target_arch = "arm", target_os = "linux"))]
fn run(params: RadarExecParams) -> Result<(), Report> {
    let (acts, sensor, panel) =
        radar_lib::rpi::init(&params.pins).wrap_err("Failed to initialise the GPIO equipment")?;

    info!("GPIO equipment initialised");

    serve(params, acts, sensor, panel)
}

/// Initialise simulated equipment and run the rover.
#[cfg(not(all(target_arch = "arm", target_os = "linux")))]
fn run(params: RadarExecParams) -> Result<(), Report> {
    use radar_lib::sim::{FixedRanger, SimPanel, SimServo};

    info!("No GPIO on this target, running with simulated equipment");

    let acts = ActCtrl::new(SimServo::new(), SimServo::new(), SimServo::new());
    let ranger = FixedRanger::new(150.0);
    let panel = SimPanel::new();

    serve(params, acts, ranger, panel)
}

/// Establish the initial state, start the sweep task and serve commands forever.
fn serve<S, R, P>(
    params: RadarExecParams,
    acts: ActCtrl<S>,
    ranger: R,
    panel: P,
) -> Result<(), Report>
where
    S: ServoDriver + Send + 'static,
    R: Ranger + Send + 'static,
    P: Panel + Send + 'static,
{
    let state = StateHandle::new();
    let acts = Arc::new(Mutex::new(acts));
    let panel = Arc::new(Mutex::new(panel));

    // Boot into sleep mode, so the servos are de-energised until the operator activates
    cmd_proc::enter_sleep(&state, &acts, &panel);

    let sweep = SweepTask::new(
        state.clone(),
        acts.clone(),
        ranger,
        panel.clone(),
        params.sweep.clone(),
    );
    sweep.spawn().wrap_err("Failed to spawn the sweep task")?;

    let server = CmdServer::new(&params.server.bind_address)
        .wrap_err("Failed to initialise the command server")?;

    server.serve(state, acts, panel);

    Ok(())
}
