//! Engine bridge error types.

use thiserror::Error;

/// Errors surfaced by the rendering-engine bridge.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Browser process could not be launched or attached.
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// Navigation command was rejected by the engine.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Script evaluation failed inside the page.
    #[error("script evaluation failed: {0}")]
    Evaluation(String),

    /// Document probe came back in a shape we cannot decode.
    #[error("malformed probe payload: {0}")]
    MalformedProbe(String),
}
