//! Expectations: the success/failure predicates armed between workflow
//! transitions, and the triggers they invoke when satisfied.

use std::fmt;

use engine_bridge::DomProbeReport;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Named transitions of the workflow state machine. Dispatch is an
/// exhaustive match, so an unknown transition cannot exist at runtime.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Trigger {
    /// Login form is on screen; fill credentials and submit.
    Login,
    /// Logged in; navigate to the blocked-members page.
    EnterBlocked,
    /// A removable block is listed; click its remove link.
    Unban,
    /// The confirm button appeared; confirm the removal.
    UnbanConfirm,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Trigger::Login => "onLogin",
            Trigger::EnterBlocked => "onEnterBlocked",
            Trigger::Unban => "onUnban",
            Trigger::UnbanConfirm => "onUnbanConfirm",
        };
        f.write_str(name)
    }
}

/// One armed step predicate. Satisfied when the document path matches
/// `path` and both selector conditions hold against the live DOM.
///
/// Expectations are replaced wholesale on every transition; they are never
/// merged or partially updated.
#[derive(Clone, Debug)]
pub struct Expectation {
    /// Pattern the current `document.location.pathname` must match.
    /// Unanchored, so trailing query noise is tolerated.
    path: Regex,
    selector_exists: Option<String>,
    selector_not_exists: Option<String>,
    /// Transition to invoke once satisfied.
    pub trigger: Trigger,
}

impl Expectation {
    pub fn new(path_pattern: &str, trigger: Trigger) -> Result<Self, regex::Error> {
        Ok(Self {
            path: Regex::new(path_pattern)?,
            selector_exists: None,
            selector_not_exists: None,
            trigger,
        })
    }

    /// Require this selector to be present in the document.
    pub fn with_selector_exists(mut self, selector: impl Into<String>) -> Self {
        self.selector_exists = Some(selector.into());
        self
    }

    /// Require this selector to be absent from the document. Guards
    /// against acting on a page still listing a stale UI element.
    pub fn with_selector_not_exists(mut self, selector: impl Into<String>) -> Self {
        self.selector_not_exists = Some(selector.into());
        self
    }

    pub fn path_pattern(&self) -> &str {
        self.path.as_str()
    }

    pub fn selector_exists(&self) -> Option<&str> {
        self.selector_exists.as_deref()
    }

    pub fn selector_not_exists(&self) -> Option<&str> {
        self.selector_not_exists.as_deref()
    }

    /// Selectors to probe for this expectation, in the order
    /// [`Self::is_satisfied`] consumes the report: `selector_not_exists`
    /// first, then `selector_exists`.
    pub fn selectors(&self) -> Vec<String> {
        self.selector_not_exists
            .iter()
            .chain(self.selector_exists.iter())
            .cloned()
            .collect()
    }

    /// Evaluate the predicate against a probe of the live document taken
    /// with the selectors from [`Self::selectors`].
    pub fn is_satisfied(&self, report: &DomProbeReport) -> bool {
        if !self.path.is_match(&report.path) {
            return false;
        }

        let mut index = 0;
        if self.selector_not_exists.is_some() {
            if report.selector_found(index) {
                return false;
            }
            index += 1;
        }
        if self.selector_exists.is_some() && !report.selector_found(index) {
            return false;
        }
        true
    }
}

/// The expectation pair live between two transitions: exactly one success
/// expectation, at most one failure expectation.
#[derive(Clone, Debug)]
pub struct ArmedPair {
    pub success: Expectation,
    pub failed: Option<Expectation>,
}

impl ArmedPair {
    pub fn success_only(success: Expectation) -> Self {
        Self {
            success,
            failed: None,
        }
    }

    pub fn with_failed(success: Expectation, failed: Expectation) -> Self {
        Self {
            success,
            failed: Some(failed),
        }
    }
}
