//! # Command Server
//!
//! The HTTP boundary of the rover. Serves the control page, the status document and the
//! `/cmd?action=...` endpoint, routing recognised actions into the command processor.
//!
//! The server is deliberately simple: one connection serviced at a time on the calling thread,
//! one request per connection. The sweep runs on its own thread, so a slow client delays other
//! clients but never the sweep.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use std::io::Read;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

// Internal
use crate::act_ctrl::{ActCtrl, ServoDriver};
use crate::cmd_proc;
use crate::panel::Panel;
use crate::state::StateHandle;
use comms_if::cmd::Action;
use comms_if::net::{Method, Request, Response};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The control page served at the root path.
const CONTROL_PAGE: &str = include_str!("../assets/index.html");

/// Per-connection socket timeout. A stalled client is dropped, not waited on.
const SOCKET_TIMEOUT: Duration = Duration::from_secs(2);

/// Size of the request head buffer. GET requests with a short query string fit comfortably.
const REQUEST_BUF_SIZE: usize = 1024;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The command server, wrapping the bound listener.
pub struct CmdServer {
    listener: TcpListener,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in the command server.
#[derive(Debug, Error)]
pub enum CmdServerError {
    #[error("Could not bind the command server to {0}: {1}")]
    BindError(String, std::io::Error),

    #[error("I/O error while servicing a request: {0}")]
    IoError(#[from] std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CmdServer {
    /// Bind the server to the given address.
    pub fn new(bind_address: &str) -> Result<Self, CmdServerError> {
        let listener = TcpListener::bind(bind_address)
            .map_err(|e| CmdServerError::BindError(bind_address.into(), e))?;

        info!("Command server listening on {}", bind_address);

        Ok(Self { listener })
    }

    /// The address the server actually bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, CmdServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests forever, one connection at a time.
    ///
    /// A failure on one connection is logged and the next connection is accepted; only the
    /// listener itself failing ends the loop, and `incoming` never does.
    pub fn serve<S: ServoDriver, P: Panel>(
        self,
        state: StateHandle,
        acts: Arc<Mutex<ActCtrl<S>>>,
        panel: Arc<Mutex<P>>,
    ) {
        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    warn!("Could not accept a connection: {}", e);
                    continue;
                }
            };

            if let Err(e) = handle_client(stream, &state, &acts, &panel) {
                warn!("Error servicing a request: {}", e);
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Route one parsed request to its handler and build the response.
pub fn route<S: ServoDriver, P: Panel>(
    request: &Request,
    state: &StateHandle,
    acts: &Mutex<ActCtrl<S>>,
    panel: &Mutex<P>,
) -> Response {
    if request.method != Method::Get {
        return Response::not_found();
    }

    match request.path.as_str() {
        "/" => Response::ok_html(CONTROL_PAGE),
        p if p.starts_with("/index") => Response::ok_html(CONTROL_PAGE),
        "/status" => status_response(state),
        "/cmd" => match request.query.get("action") {
            None => Response::bad_request("missing action parameter"),
            Some(name) => {
                match Action::from_str(name) {
                    Some(action) => {
                        cmd_proc::exec(state, acts, panel, action);
                    }
                    // Unrecognised but well-formed actions are a no-op, answered with status
                    None => debug!("Ignoring unrecognised action {:?}", name),
                }
                status_response(state)
            }
        },
        _ => Response::not_found(),
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Service one connection: read the request head, route it and write the response.
fn handle_client<S: ServoDriver, P: Panel>(
    mut stream: TcpStream,
    state: &StateHandle,
    acts: &Mutex<ActCtrl<S>>,
    panel: &Mutex<P>,
) -> Result<(), CmdServerError> {
    stream.set_read_timeout(Some(SOCKET_TIMEOUT))?;
    stream.set_write_timeout(Some(SOCKET_TIMEOUT))?;

    let mut buf = [0u8; REQUEST_BUF_SIZE];
    let num_bytes = stream.read(&mut buf)?;
    let head = String::from_utf8_lossy(&buf[..num_bytes]);

    let response = match Request::parse(&head) {
        Ok(request) => route(&request, state, acts, panel),
        Err(e) => {
            debug!("Could not parse a request: {}", e);
            Response::bad_request("malformed request")
        }
    };

    response.write_to(&mut stream)?;

    // Dropping the stream closes the connection
    Ok(())
}

/// Build the JSON status response.
fn status_response(state: &StateHandle) -> Response {
    let body = serde_json::to_string(&state.status())
        .expect("StatusReport serialization failed. This should not happen");
    Response::ok_json(body)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{SimPanel, SimServo};
    use comms_if::net::Status;
    use comms_if::status::StatusReport;

    struct Rig {
        state: StateHandle,
        acts: Mutex<ActCtrl<SimServo>>,
        panel: Mutex<SimPanel>,
    }

    fn rig() -> Rig {
        Rig {
            state: StateHandle::new(),
            acts: Mutex::new(ActCtrl::new(
                SimServo::new(),
                SimServo::new(),
                SimServo::new(),
            )),
            panel: Mutex::new(SimPanel::new()),
        }
    }

    fn get(rig: &Rig, target: &str) -> Response {
        let request = Request::parse(&format!("GET {} HTTP/1.1\r\n\r\n", target)).unwrap();
        route(&request, &rig.state, &rig.acts, &rig.panel)
    }

    #[test]
    fn test_control_page() {
        let rig = rig();
        let response = get(&rig, "/");
        assert_eq!(response.status, Status::Ok);
        assert!(response.body.contains("<html"));

        // Same page under any of its explicit names
        assert_eq!(get(&rig, "/index.html").body, response.body);
        assert_eq!(get(&rig, "/index.htm").body, response.body);
        assert_eq!(get(&rig, "/index").body, response.body);
    }

    #[test]
    fn test_status_document() {
        let rig = rig();
        let response = get(&rig, "/status");
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.content_type, "application/json");

        let report: StatusReport = serde_json::from_str(&response.body).unwrap();
        assert_eq!(report, StatusReport::default());
    }

    #[test]
    fn test_cmd_executes_and_reports() {
        let rig = rig();
        let response = get(&rig, "/cmd?action=activate");
        assert_eq!(response.status, Status::Ok);

        let report: StatusReport = serde_json::from_str(&response.body).unwrap();
        assert!(report.active);
    }

    #[test]
    fn test_cmd_missing_action() {
        let rig = rig();
        assert_eq!(get(&rig, "/cmd").status, Status::BadRequest);
    }

    #[test]
    fn test_cmd_unknown_action_is_noop() {
        let rig = rig();
        let response = get(&rig, "/cmd?action=self_destruct");
        assert_eq!(response.status, Status::Ok);

        let report: StatusReport = serde_json::from_str(&response.body).unwrap();
        assert!(!report.active);
    }

    #[test]
    fn test_unknown_path() {
        let rig = rig();
        assert_eq!(get(&rig, "/nope").status, Status::NotFound);
    }

    #[test]
    fn test_non_get_rejected() {
        let rig = rig();
        let request = Request::parse("POST /status HTTP/1.1\r\n\r\n").unwrap();
        let response = route(&request, &rig.state, &rig.acts, &rig.panel);
        assert_eq!(response.status, Status::NotFound);
    }
}
