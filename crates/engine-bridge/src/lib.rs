//! Rendering-engine seam for the group unban workflow.
//!
//! The workflow core never talks to Chromium directly. It sees only the
//! narrow [`PageEngine`] surface: issue a navigation, evaluate a script,
//! probe the live document, abort an in-flight load, and subscribe to
//! engine events. The concrete [`ChromiumEngine`] drives a real browser
//! over the DevTools protocol.

pub mod chromium;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;

pub use chromium::ChromiumEngine;
pub use config::EngineConfig;
pub use engine::{DomProbeReport, PageEngine};
pub use error::EngineError;
pub use events::{ConsoleLevel, EngineEvent};
