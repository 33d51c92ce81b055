//! DOM poller: checks the armed expectations against the live document on
//! a fixed interval and requests transitions over a channel.
//!
//! The bridge to the controller is deliberately narrow: the poller reads
//! state snapshots from a watch channel and sends transition requests
//! over an mpsc channel. It never touches controller state directly, so
//! the non-reentrancy guarantee lives in the session loop, not in shared
//! mutation.

use std::sync::Arc;
use std::time::Duration;

use engine_bridge::PageEngine;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::controller::BridgeSnapshot;
use crate::expect::{Expectation, Trigger};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Message from the poller to the session loop: this expectation is
/// satisfied, invoke its trigger with the given outcome.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TransitionRequest {
    pub trigger: Trigger,
    pub success: bool,
}

pub struct DomPoller {
    engine: Arc<dyn PageEngine>,
    bridge: watch::Receiver<BridgeSnapshot>,
    requests: mpsc::Sender<TransitionRequest>,
    interval: Duration,
}

impl DomPoller {
    pub fn new(
        engine: Arc<dyn PageEngine>,
        bridge: watch::Receiver<BridgeSnapshot>,
        requests: mpsc::Sender<TransitionRequest>,
        interval: Duration,
    ) -> Self {
        Self {
            engine,
            bridge,
            requests,
            interval,
        }
    }

    /// Spawn the polling task. It exits when the session drops the
    /// request receiver.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if self.requests.is_closed() {
                break;
            }
            self.poll_once().await;
        }
    }

    /// One polling tick. A no-op while the controller is inactive or a
    /// reload is in flight; otherwise evaluates the success expectation
    /// first, then the failure expectation. Both may be evaluated on the
    /// same tick; the session drops whichever request arrives second.
    pub async fn poll_once(&self) {
        let snapshot = self.bridge.borrow().clone();
        if !snapshot.active || snapshot.wait_reload {
            return;
        }
        let Some(armed) = snapshot.armed else {
            return;
        };

        self.check(&armed.success, true).await;
        if let Some(failed) = &armed.failed {
            self.check(failed, false).await;
        }
    }

    async fn check(&self, expect: &Expectation, success: bool) {
        let selectors = expect.selectors();
        let report = match self.engine.probe_document(&selectors).await {
            Ok(report) => report,
            Err(err) => {
                warn!(error = %err, "document probe failed");
                return;
            }
        };

        debug!(
            trigger = %expect.trigger,
            pattern = expect.path_pattern(),
            path = %report.path,
            "evaluating expectation"
        );

        if !expect.is_satisfied(&report) {
            return;
        }

        info!(trigger = %expect.trigger, "expectation achieved");
        if self
            .requests
            .send(TransitionRequest {
                trigger: expect.trigger,
                success,
            })
            .await
            .is_err()
        {
            debug!("session loop gone, dropping transition request");
        }
    }
}
