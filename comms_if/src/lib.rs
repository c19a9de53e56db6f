//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software: the command set accepted by
//! the rover, the status document it reports, and the structured request/response model used by
//! the command server boundary.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command definitions - the fixed set of actions the rover accepts
pub mod cmd;

/// Status document reported to the remote operator
pub mod status;

/// Network module - structured HTTP request/response model
pub mod net;
