//! Transition handlers: the one DOM mutation or navigation each workflow
//! step performs, plus the expectation it arms for the step after it.

use std::sync::Arc;
use std::time::Duration;

use engine_bridge::PageEngine;
use tracing::{debug, error, info};
use url::Url;

use crate::controller::StepController;
use crate::errors::SessionError;
use crate::expect::{ArmedPair, Expectation, Trigger};
use crate::scripts;
use crate::session::{Credentials, SessionConfig};
use crate::watchdog::Watchdog;

/// The fixed workflow: which script or navigation each trigger runs, and
/// which expectation follows it. Handlers are idempotent given the same
/// DOM state.
pub struct Workflow {
    engine: Arc<dyn PageEngine>,
    credentials: Credentials,
    home_url: Url,
    group_path: String,
    settle_delay: Duration,
}

impl Workflow {
    pub fn new(
        engine: Arc<dyn PageEngine>,
        credentials: Credentials,
        config: &SessionConfig,
    ) -> Result<Self, SessionError> {
        Ok(Self {
            engine,
            credentials,
            home_url: Url::parse(&config.home_url)?,
            group_path: config.group_path(),
            settle_delay: config.settle_delay,
        })
    }

    pub fn home_url(&self) -> &str {
        self.home_url.as_str()
    }

    /// First expectation of a session: the landing page shows its login
    /// form.
    pub fn initial_expectation(&self) -> Result<ArmedPair, SessionError> {
        Ok(ArmedPair::success_only(
            Expectation::new("/", Trigger::Login)?.with_selector_exists(scripts::LOGIN_FORM),
        ))
    }

    /// Run the handler for `trigger`. The caller has already deactivated
    /// the controller; every handler arms the next pair before returning
    /// and restarts the watchdog.
    pub async fn dispatch(
        &self,
        trigger: Trigger,
        success: bool,
        controller: &mut StepController,
        watchdog: &mut Watchdog,
    ) -> Result<(), SessionError> {
        debug!(trigger = %trigger, success, "dispatching transition");
        match trigger {
            Trigger::Login => self.handle_login(controller, watchdog).await,
            Trigger::EnterBlocked => self.handle_enter_blocked(controller, watchdog).await,
            Trigger::Unban => self.handle_unban(controller, watchdog).await,
            Trigger::UnbanConfirm => self.handle_unban_confirm(controller, watchdog).await,
        }
    }

    /// Run a handler script. Script failures are logged and swallowed:
    /// the page may have mutated between the probe and the click, and the
    /// workflow recovers by parking on its next expectation. Only
    /// transport loss ends the session, and that arrives as an engine
    /// event, not through this call.
    async fn run_script(&self, script: &str) {
        if let Err(err) = self.engine.evaluate(script).await {
            error!(error = %err, "handler script failed");
        }
    }

    /// Fill credentials into the login form and submit. Submission
    /// reloads the page, so polling is suspended until load-finished.
    async fn handle_login(
        &self,
        controller: &mut StepController,
        watchdog: &mut Watchdog,
    ) -> Result<(), SessionError> {
        info!("logging in");
        controller.begin_navigation();
        self.run_script(&scripts::fill_login(
            &self.credentials.username,
            &self.credentials.password,
        ))
        .await;
        watchdog.restart();
        controller.arm(ArmedPair::success_only(
            Expectation::new("/", Trigger::EnterBlocked)?
                .with_selector_exists(scripts::PROFILE_ICON),
        ));
        Ok(())
    }

    /// Logged in; navigate to the group's blocked-members page.
    async fn handle_enter_blocked(
        &self,
        controller: &mut StepController,
        watchdog: &mut Watchdog,
    ) -> Result<(), SessionError> {
        let url = self.blocked_url()?;
        info!(url = %url, "entering blocked-members page");
        controller.begin_navigation();
        self.engine.load_url(url.as_str()).await?;
        watchdog.restart();
        controller.arm(self.unban_expectation()?);
        Ok(())
    }

    /// A removable block is on screen; click its remove link. No
    /// navigation happens here, the confirm dialog renders in place.
    async fn handle_unban(
        &self,
        controller: &mut StepController,
        watchdog: &mut Watchdog,
    ) -> Result<(), SessionError> {
        info!("removing block");
        // The list keeps mutating shortly after it first renders; give it
        // a moment before clicking.
        tokio::time::sleep(self.settle_delay).await;
        self.run_script(&scripts::click_element(scripts::UNBAN_LINK))
            .await;
        watchdog.restart();
        controller.arm(ArmedPair::success_only(
            Expectation::new(&self.blocked_path_pattern(), Trigger::UnbanConfirm)?
                .with_selector_exists(scripts::CONFIRM_BUTTON),
        ));
        Ok(())
    }

    /// Confirm the removal, then re-arm the "member still blocked"
    /// expectation. The workflow is idempotent and safe to repeat, so the
    /// steady state keeps retrying until no removable block remains.
    async fn handle_unban_confirm(
        &self,
        controller: &mut StepController,
        watchdog: &mut Watchdog,
    ) -> Result<(), SessionError> {
        info!("confirming block removal");
        controller.begin_navigation();
        self.run_script(&scripts::click_element(scripts::CONFIRM_BUTTON))
            .await;
        watchdog.restart();
        controller.arm(self.unban_expectation()?);
        Ok(())
    }

    fn unban_expectation(&self) -> Result<ArmedPair, SessionError> {
        Ok(ArmedPair::success_only(
            Expectation::new(&self.blocked_path_pattern(), Trigger::Unban)?
                .with_selector_exists(scripts::UNBAN_LINK),
        ))
    }

    fn blocked_path_pattern(&self) -> String {
        format!("{}/blocked/?", self.group_path)
    }

    fn blocked_url(&self) -> Result<Url, SessionError> {
        Ok(self
            .home_url
            .join(&format!("{}/blocked/", self.group_path))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedEngine;

    fn workflow(engine: Arc<ScriptedEngine>) -> Workflow {
        let mut config = SessionConfig::new("demo.group");
        config.settle_delay = Duration::ZERO;
        Workflow::new(
            engine,
            Credentials {
                username: "user@example.com".into(),
                password: "hunter2".into(),
            },
            &config,
        )
        .unwrap()
    }

    #[test]
    fn blocked_url_is_rooted_at_home() {
        let engine = Arc::new(ScriptedEngine::new());
        let workflow = workflow(engine);
        let url = workflow.blocked_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.facebook.com/groups/demo.group/blocked/"
        );
    }

    #[tokio::test]
    async fn login_fills_credentials_and_arms_profile_check() {
        let engine = Arc::new(ScriptedEngine::new());
        let workflow = workflow(Arc::clone(&engine));
        let (mut controller, _bridge) = StepController::new();
        let mut watchdog = Watchdog::new(Duration::from_secs(300));

        controller.begin_transition(Trigger::Login);
        workflow
            .dispatch(Trigger::Login, true, &mut controller, &mut watchdog)
            .await
            .unwrap();

        let evaluated = engine.evaluated_scripts();
        assert!(evaluated.iter().any(|s| s.contains("login_form")));
        assert!(evaluated.iter().any(|s| s.contains("user@example.com")));
        assert!(controller.wait_reload());
        assert!(watchdog.is_armed());
        let armed = controller.armed().unwrap();
        assert_eq!(armed.success.trigger, Trigger::EnterBlocked);
        assert_eq!(armed.success.selector_exists(), Some(scripts::PROFILE_ICON));
    }

    #[tokio::test]
    async fn throwing_handler_script_still_arms_the_next_expectation() {
        let engine = Arc::new(ScriptedEngine::new());
        engine.fail_evaluations("TypeError: document.forms.login_form is null");
        let workflow = workflow(Arc::clone(&engine));
        let (mut controller, _bridge) = StepController::new();
        let mut watchdog = Watchdog::new(Duration::from_secs(300));

        controller.begin_transition(Trigger::Login);
        workflow
            .dispatch(Trigger::Login, true, &mut controller, &mut watchdog)
            .await
            .expect("script failure is not a session error");

        // The step still completed: next expectation armed, watchdog
        // restarted, navigation suspension in place.
        let armed = controller.armed().unwrap();
        assert_eq!(armed.success.trigger, Trigger::EnterBlocked);
        assert!(watchdog.is_armed());
        assert!(controller.wait_reload());
    }

    #[tokio::test]
    async fn unban_confirm_rearms_the_steady_loop() {
        let engine = Arc::new(ScriptedEngine::new());
        let workflow = workflow(Arc::clone(&engine));
        let (mut controller, _bridge) = StepController::new();
        let mut watchdog = Watchdog::new(Duration::from_secs(300));

        controller.begin_transition(Trigger::UnbanConfirm);
        workflow
            .dispatch(Trigger::UnbanConfirm, true, &mut controller, &mut watchdog)
            .await
            .unwrap();

        // The confirm click went out and the unban expectation is armed
        // again, so a still-blocked member re-triggers onUnban.
        assert!(engine
            .evaluated_scripts()
            .iter()
            .any(|s| s.contains("remove_block")));
        let armed = controller.armed().unwrap();
        assert_eq!(armed.success.trigger, Trigger::Unban);
        assert_eq!(armed.success.selector_exists(), Some(scripts::UNBAN_LINK));
    }
}
