//! Workflow core error types.

use engine_bridge::EngineError;
use thiserror::Error;

/// Errors surfaced by the workflow core.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The rendering engine rejected a command.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// An expectation was built with an unparseable path pattern.
    #[error("invalid expectation path pattern: {0}")]
    PathPattern(#[from] regex::Error),

    /// The configured home URL is not a valid absolute URL.
    #[error("invalid home URL: {0}")]
    HomeUrl(#[from] url::ParseError),

    /// The engine event stream closed without a `Closed` event.
    #[error("engine event stream closed unexpectedly")]
    EngineGone,

    /// The poller task stopped while the session was still running.
    #[error("dom poller stopped unexpectedly")]
    PollerGone,
}
