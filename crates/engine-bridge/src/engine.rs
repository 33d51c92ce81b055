//! The `PageEngine` trait: everything the workflow core needs from a
//! rendering engine, and nothing more.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::EngineError;
use crate::events::EngineEvent;

/// Result of probing the live document: the current location pathname
/// plus, for each requested selector, whether it matched an element.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DomProbeReport {
    /// `document.location.pathname` at probe time.
    pub path: String,
    /// One entry per requested selector, in request order.
    pub found: Vec<bool>,
}

impl DomProbeReport {
    /// Whether the selector at `index` matched. Out-of-range indexes read
    /// as "not found" rather than panicking on a short payload.
    pub fn selector_found(&self, index: usize) -> bool {
        self.found.get(index).copied().unwrap_or(false)
    }
}

/// Narrow surface the workflow core consumes from a rendering engine.
///
/// The engine runs its own internal scheduling; the core only observes it
/// through [`EngineEvent`]s and the synchronous-looking calls below.
#[async_trait]
pub trait PageEngine: Send + Sync {
    /// Issue a top-level navigation. Completion is signalled through
    /// [`EngineEvent::LoadFinished`], not through the return value.
    async fn load_url(&self, url: &str) -> Result<(), EngineError>;

    /// Evaluate a script in the current document and return its value.
    async fn evaluate(&self, script: &str) -> Result<Value, EngineError>;

    /// Check the current pathname and the presence of each selector
    /// against the live document.
    async fn probe_document(&self, selectors: &[String]) -> Result<DomProbeReport, EngineError>;

    /// Abort the in-flight load, leaving the current document in place.
    async fn stop_load(&self) -> Result<(), EngineError>;

    /// Subscribe to engine events.
    fn subscribe(&self) -> broadcast::Receiver<EngineEvent>;
}
