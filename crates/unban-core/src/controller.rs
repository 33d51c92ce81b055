//! Step controller: holds the armed expectation pair and the two guard
//! flags the poller honours, and publishes both over the bridge.

use tokio::sync::watch;
use tracing::debug;

use crate::expect::{ArmedPair, Trigger};

/// Read-only view of controller state the poller consumes each tick.
#[derive(Clone, Debug)]
pub struct BridgeSnapshot {
    /// Whether any expectation is armed. Cleared for the duration of a
    /// transition handler so the poller cannot re-enter it.
    pub active: bool,
    /// True while a navigation is in flight; suppresses polling until the
    /// next load-finished signal so a half-loaded document is never read.
    pub wait_reload: bool,
    pub armed: Option<ArmedPair>,
}

impl BridgeSnapshot {
    fn initial() -> Self {
        Self {
            active: false,
            wait_reload: true,
            armed: None,
        }
    }
}

/// Owns the workflow's mutable step state. All mutation happens on the
/// session's single control task; the poller only ever sees snapshots.
pub struct StepController {
    active: bool,
    wait_reload: bool,
    last_trigger: Option<Trigger>,
    armed: Option<ArmedPair>,
    bridge: watch::Sender<BridgeSnapshot>,
}

impl StepController {
    /// Create a controller plus the bridge receiver handed to the poller.
    pub fn new() -> (Self, watch::Receiver<BridgeSnapshot>) {
        let (bridge, receiver) = watch::channel(BridgeSnapshot::initial());
        let controller = Self {
            active: false,
            wait_reload: true,
            last_trigger: None,
            armed: None,
            bridge,
        };
        (controller, receiver)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn wait_reload(&self) -> bool {
        self.wait_reload
    }

    pub fn last_trigger(&self) -> Option<Trigger> {
        self.last_trigger
    }

    pub fn armed(&self) -> Option<&ArmedPair> {
        self.armed.as_ref()
    }

    /// Arm the next expectation pair. Always a wholesale replacement:
    /// nothing from the previous pair survives.
    pub fn arm(&mut self, pair: ArmedPair) {
        debug!(trigger = %pair.success.trigger, "arming expectation");
        self.armed = Some(pair);
        self.active = true;
        self.publish();
    }

    /// Mark a transition as in progress, deactivating the poller for the
    /// duration of the handler.
    pub fn begin_transition(&mut self, trigger: Trigger) {
        self.active = false;
        self.last_trigger = Some(trigger);
        self.publish();
    }

    /// A navigation is about to start; suppress polling until the engine
    /// reports the next load-finished.
    pub fn begin_navigation(&mut self) {
        self.wait_reload = true;
        self.publish();
    }

    /// The engine finished loading a document; polling may resume.
    pub fn load_finished(&mut self) {
        self.wait_reload = false;
        self.publish();
    }

    fn publish(&self) {
        let snapshot = BridgeSnapshot {
            active: self.active,
            wait_reload: self.wait_reload,
            armed: self.armed.clone(),
        };
        // Send only fails with no receivers, which happens while the
        // poller is not running yet; state is still republished later.
        let _ = self.bridge.send(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expect::Expectation;

    fn pair(trigger: Trigger) -> ArmedPair {
        ArmedPair::success_only(
            Expectation::new("/", trigger)
                .unwrap()
                .with_selector_exists("form#login_form"),
        )
    }

    #[test]
    fn starts_inactive_and_reload_waiting() {
        let (controller, bridge) = StepController::new();
        assert!(!controller.is_active());
        assert!(controller.wait_reload());
        let snapshot = bridge.borrow();
        assert!(!snapshot.active);
        assert!(snapshot.wait_reload);
        assert!(snapshot.armed.is_none());
    }

    #[test]
    fn arming_activates_and_publishes() {
        let (mut controller, bridge) = StepController::new();
        controller.arm(pair(Trigger::Login));
        assert!(controller.is_active());
        let snapshot = bridge.borrow();
        assert!(snapshot.active);
        assert_eq!(
            snapshot.armed.as_ref().unwrap().success.trigger,
            Trigger::Login
        );
    }

    #[test]
    fn arming_replaces_the_previous_pair_wholesale() {
        let (mut controller, _bridge) = StepController::new();
        controller.arm(ArmedPair::success_only(
            Expectation::new("/", Trigger::Login)
                .unwrap()
                .with_selector_exists("form#login_form")
                .with_selector_not_exists("div.stale"),
        ));
        controller.arm(ArmedPair::success_only(
            Expectation::new("/next", Trigger::EnterBlocked).unwrap(),
        ));

        let armed = controller.armed().unwrap();
        assert_eq!(armed.success.trigger, Trigger::EnterBlocked);
        assert_eq!(armed.success.path_pattern(), "/next");
        // No fields bleed across from the replaced expectation.
        assert!(armed.success.selector_exists().is_none());
        assert!(armed.success.selector_not_exists().is_none());
        assert!(armed.failed.is_none());
    }

    #[test]
    fn begin_transition_deactivates_and_records_trigger() {
        let (mut controller, bridge) = StepController::new();
        controller.arm(pair(Trigger::Login));
        controller.begin_transition(Trigger::Login);
        assert!(!controller.is_active());
        assert_eq!(controller.last_trigger(), Some(Trigger::Login));
        assert!(!bridge.borrow().active);
    }

    #[test]
    fn reload_flag_follows_navigation_lifecycle() {
        let (mut controller, bridge) = StepController::new();
        controller.load_finished();
        assert!(!controller.wait_reload());
        controller.begin_navigation();
        assert!(controller.wait_reload());
        assert!(bridge.borrow().wait_reload);
        controller.load_finished();
        assert!(!controller.wait_reload());
    }
}
