//! Session wiring: one engine, one controller, one poller, one watchdog,
//! and the single control loop that ties them together.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use engine_bridge::{ConsoleLevel, EngineEvent, PageEngine};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::controller::{BridgeSnapshot, StepController};
use crate::errors::SessionError;
use crate::poller::{DomPoller, TransitionRequest, DEFAULT_POLL_INTERVAL};
use crate::transitions::Workflow;
use crate::watchdog::{Watchdog, DEFAULT_TIMEOUT};

/// Login credentials, injected by the process entry point. Business
/// logic never reads the environment itself.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Tunables for one session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Base URL of the site.
    pub home_url: String,
    /// Group name as it appears in the URL path.
    pub group: String,
    pub poll_interval: Duration,
    pub watchdog_timeout: Duration,
    /// Pause before clicking the unban link; the list keeps mutating
    /// shortly after it renders.
    pub settle_delay: Duration,
}

impl SessionConfig {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            home_url: "https://www.facebook.com".to_string(),
            group: group.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            watchdog_timeout: DEFAULT_TIMEOUT,
            settle_delay: Duration::from_secs(3),
        }
    }

    pub fn group_path(&self) -> String {
        format!("/groups/{}", self.group)
    }
}

/// One serialized unban session against one group. Constructed
/// explicitly by the entry point; holds no global state and persists
/// nothing across runs.
pub struct UnbanSession {
    engine: Arc<dyn PageEngine>,
    workflow: Workflow,
    controller: StepController,
    bridge: watch::Receiver<BridgeSnapshot>,
    watchdog: Watchdog,
    poll_interval: Duration,
}

impl UnbanSession {
    pub fn new(
        engine: Arc<dyn PageEngine>,
        credentials: Credentials,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let (controller, bridge) = StepController::new();
        let workflow = Workflow::new(Arc::clone(&engine), credentials, &config)?;
        Ok(Self {
            engine,
            workflow,
            controller,
            bridge,
            watchdog: Watchdog::new(config.watchdog_timeout),
            poll_interval: config.poll_interval,
        })
    }

    /// Drive the workflow until the engine goes away. Normal exit is the
    /// engine reporting `Closed` (window closed); the steady state
    /// otherwise loops indefinitely.
    pub async fn run(mut self) -> Result<(), SessionError> {
        let mut events = self.engine.subscribe();
        let (request_tx, mut requests) = mpsc::channel(8);
        let poller = DomPoller::new(
            Arc::clone(&self.engine),
            self.bridge.clone(),
            request_tx,
            self.poll_interval,
        );
        let poller_handle = poller.spawn();

        info!(url = self.workflow.home_url(), "starting unban session");
        self.controller.arm(self.workflow.initial_expectation()?);
        self.watchdog.restart();
        self.engine.load_url(self.workflow.home_url()).await?;

        let result = self.event_loop(&mut events, &mut requests).await;
        poller_handle.abort();
        result
    }

    async fn event_loop(
        &mut self,
        events: &mut broadcast::Receiver<EngineEvent>,
        requests: &mut mpsc::Receiver<TransitionRequest>,
    ) -> Result<(), SessionError> {
        loop {
            let watchdog_fired = self.watchdog.expired();
            tokio::select! {
                event = events.recv() => match event {
                    Ok(EngineEvent::LoadFinished { ok }) => {
                        info!(ok, "document load finished");
                        self.controller.load_finished();
                    }
                    Ok(EngineEvent::ConsoleMessage { level, text, line, source }) => {
                        log_console(level, &text, line, source.as_deref());
                    }
                    Ok(EngineEvent::Closed) => {
                        info!("engine closed; session over");
                        return Ok(());
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "engine event stream lagged");
                    }
                    Err(RecvError::Closed) => return Err(SessionError::EngineGone),
                },
                request = requests.recv() => match request {
                    Some(request) => self.handle_request(request).await?,
                    None => return Err(SessionError::PollerGone),
                },
                _ = watchdog_fired => self.on_watchdog_timeout().await,
            }
        }
    }

    /// Consume one transition request from the poller. Requests that
    /// raced a transition already in progress are dropped; this is the
    /// explicit form of the controller's non-reentrancy guarantee.
    async fn handle_request(&mut self, request: TransitionRequest) -> Result<(), SessionError> {
        if !self.controller.is_active() {
            debug!(trigger = %request.trigger, "dropping transition while controller is inactive");
            return Ok(());
        }
        self.controller.begin_transition(request.trigger);
        self.workflow
            .dispatch(
                request.trigger,
                request.success,
                &mut self.controller,
                &mut self.watchdog,
            )
            .await
    }

    /// Hard cutoff, not a retry: stop the in-flight load, advance no
    /// transition, and stay parked until something else nudges the
    /// workflow forward.
    async fn on_watchdog_timeout(&mut self) {
        warn!(last_trigger = ?self.controller.last_trigger(), "TIMEOUT");
        if let Err(err) = self.engine.stop_load().await {
            warn!(error = %err, "failed to stop in-flight load");
        }
        self.watchdog.disarm();
    }
}

fn log_console(level: ConsoleLevel, text: &str, line: Option<u64>, source: Option<&str>) {
    match level {
        ConsoleLevel::Error => error!(line, source, "page console: {text}"),
        ConsoleLevel::Warning => warn!(line, source, "page console: {text}"),
        ConsoleLevel::Info => info!(line, source, "page console: {text}"),
        ConsoleLevel::Debug => debug!(line, source, "page console: {text}"),
    }
}
