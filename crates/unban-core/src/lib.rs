//! Navigation state machine for the group unban workflow.
//!
//! One fixed workflow: log in, open the group's blocked-members page,
//! remove a block, confirm, repeat. Each step arms an expectation (path
//! pattern plus selector conditions) that a DOM poller checks against the
//! live document every few seconds; a watchdog aborts steps that stall.
//! The rendering engine behind it all is only reached through the
//! `engine-bridge` seam, so the whole machine runs against a scripted
//! fake in tests.

pub mod controller;
pub mod errors;
pub mod expect;
pub mod poller;
pub mod scripts;
pub mod session;
pub mod testing;
pub mod transitions;
pub mod watchdog;

pub use controller::{BridgeSnapshot, StepController};
pub use errors::SessionError;
pub use expect::{ArmedPair, Expectation, Trigger};
pub use poller::{DomPoller, TransitionRequest};
pub use session::{Credentials, SessionConfig, UnbanSession};
pub use transitions::Workflow;
pub use watchdog::Watchdog;
