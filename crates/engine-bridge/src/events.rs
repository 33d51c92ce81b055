//! Events emitted by the engine toward the session loop.

use serde::{Deserialize, Serialize};

/// Console severity reported by the page. The session maps these onto
/// tracing levels when it re-logs them.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// Raw events the workflow core observes from the rendering engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A top-level document finished loading.
    LoadFinished { ok: bool },

    /// The page wrote to its console. Script errors land here; they are
    /// diagnostic only and never abort the session.
    ConsoleMessage {
        level: ConsoleLevel,
        text: String,
        line: Option<u64>,
        source: Option<String>,
    },

    /// The engine shut down (window closed or browser process exited).
    Closed,
}
