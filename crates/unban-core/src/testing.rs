//! Scripted in-memory engine for tests: a fake document (path plus a set
//! of present selectors), with recording of every script, navigation and
//! stop request the workflow issues.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use engine_bridge::{DomProbeReport, EngineError, EngineEvent, PageEngine};
use serde_json::Value;
use tokio::sync::broadcast;

#[derive(Default)]
struct FakeDocument {
    path: String,
    selectors: HashSet<String>,
}

pub struct ScriptedEngine {
    document: Mutex<FakeDocument>,
    evaluated: Mutex<Vec<String>>,
    evaluate_error: Mutex<Option<String>>,
    loads: Mutex<Vec<String>>,
    stop_loads: AtomicUsize,
    probes: AtomicUsize,
    events: broadcast::Sender<EngineEvent>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            document: Mutex::new(FakeDocument::default()),
            evaluated: Mutex::new(Vec::new()),
            evaluate_error: Mutex::new(None),
            loads: Mutex::new(Vec::new()),
            stop_loads: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
            events,
        }
    }

    /// Replace the scripted document wholesale.
    pub fn set_document(&self, path: &str, selectors: &[&str]) {
        let mut document = self.document.lock().unwrap();
        document.path = path.to_string();
        document.selectors = selectors.iter().map(|s| s.to_string()).collect();
    }

    /// Add a selector to the scripted document, as if the page mutated
    /// after its initial load.
    pub fn add_selector(&self, selector: &str) {
        self.document
            .lock()
            .unwrap()
            .selectors
            .insert(selector.to_string());
    }

    pub fn remove_selector(&self, selector: &str) {
        self.document.lock().unwrap().selectors.remove(selector);
    }

    pub fn evaluated_scripts(&self) -> Vec<String> {
        self.evaluated.lock().unwrap().clone()
    }

    pub fn loaded_urls(&self) -> Vec<String> {
        self.loads.lock().unwrap().clone()
    }

    pub fn stop_load_count(&self) -> usize {
        self.stop_loads.load(Ordering::SeqCst)
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Make every subsequent `evaluate` fail with the given message, as
    /// if the injected script threw inside the page.
    pub fn fail_evaluations(&self, message: &str) {
        *self.evaluate_error.lock().unwrap() = Some(message.to_string());
    }

    /// Inject an engine event, e.g. a load-finished signal.
    pub fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageEngine for ScriptedEngine {
    async fn load_url(&self, url: &str) -> Result<(), EngineError> {
        self.loads.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, EngineError> {
        self.evaluated.lock().unwrap().push(script.to_string());
        if let Some(message) = self.evaluate_error.lock().unwrap().clone() {
            return Err(EngineError::Evaluation(message));
        }
        Ok(Value::Null)
    }

    async fn probe_document(&self, selectors: &[String]) -> Result<DomProbeReport, EngineError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let document = self.document.lock().unwrap();
        Ok(DomProbeReport {
            path: document.path.clone(),
            found: selectors
                .iter()
                .map(|s| document.selectors.contains(s))
                .collect(),
        })
    }

    async fn stop_load(&self) -> Result<(), EngineError> {
        self.stop_loads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }
}
