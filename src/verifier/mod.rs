//! Content lifecycle verifier
//!
//! Expresses the expected lifecycle of a published artefact as a sequence of
//! poll assertions:
//!
//! - `wait_for_live`: after publish, the parent settles to 200
//! - `wait_for_gone`: after unpublish without redirect, the parent settles
//!   to 410 (and the body mentions the configured marker)
//! - `wait_for_not_found`: once the parent is gone, each child settles to 404
//!
//! All retry, backoff and budget logic lives in [`crate::poller`]. The
//! verifier only picks transient sets, interprets outcomes and enforces that
//! no child is checked before its parent is observed GONE.

mod batch;
mod error;
mod expectation;
mod report;
mod scenario;

pub use batch::RemovalTarget;
pub use error::VerifyError;
pub use expectation::{Expectation, Expected};
pub use report::{CheckReport, CheckResult, RemovalReport};
pub use scenario::{LifecycleReport, LifecycleSpec};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pv_content::{ResourceLocator, RetiredLocators};

use crate::cancel::CancelToken;
use crate::poller::{poll_until_settled, PollConfig, PollError, PollOutcome, PollReport, TransientSet};
use crate::probe::Probe;
use crate::state::{ObservedLifecycle, ObservedState, StateError};

/// Default marker the 410 page must mention
pub const DEFAULT_GONE_BODY_MARKER: &str = "gone";

/// Transient sets for each lifecycle check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransientSets {
    pub live: TransientSet,
    pub gone: TransientSet,
    pub not_found: TransientSet,
}

impl Default for TransientSets {
    fn default() -> Self {
        Self {
            live: TransientSet::of(&[404, 502, 503, 504]),
            gone: TransientSet::of(&[200]),
            not_found: TransientSet::of(&[200]),
        }
    }
}

/// Verifier configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifierConfig {
    pub poll: PollConfig,
    pub transient: TransientSets,
    /// None or "" disables the gone-page body check
    pub gone_body_marker: Option<String>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            poll: PollConfig::default(),
            transient: TransientSets::default(),
            gone_body_marker: Some(DEFAULT_GONE_BODY_MARKER.to_string()),
        }
    }
}

/// Runs lifecycle checks against one delivery surface
pub struct Verifier<P> {
    probe: P,
    config: VerifierConfig,
    cancel: CancelToken,
}

impl<P: Probe> Verifier<P> {
    pub fn new(probe: P, config: VerifierConfig) -> Self {
        Self {
            probe,
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Share a cancel token with the rest of the run
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// The configured expectation for a lifecycle state
    pub fn expectation(&self, expected: Expected) -> Expectation {
        let sets = &self.config.transient;
        match expected {
            Expected::Live => Expectation::new(expected, sets.live.clone()),
            Expected::Gone => {
                let exp = Expectation::new(expected, sets.gone.clone());
                match &self.config.gone_body_marker {
                    Some(marker) => exp.with_body_marker(marker.clone()),
                    None => exp,
                }
            }
            Expected::NotFound => Expectation::new(expected, sets.not_found.clone()),
            Expected::Status(_) | Expected::AnySettled => Expectation::new(expected, TransientSet::new()),
        }
    }

    /// Poll `locator` and judge the outcome against `expectation`
    pub fn check(&self, locator: &ResourceLocator, expectation: &Expectation) -> Result<CheckReport, VerifyError> {
        let poll = poll_until_settled(
            &self.probe,
            locator,
            &expectation.transient,
            &self.config.poll,
            &self.cancel,
        )
        .map_err(|e| match e {
            PollError::Config(e) => VerifyError::Config(e),
            PollError::Transport {
                locator,
                attempts,
                elapsed,
                source,
            } => VerifyError::TransportFailure {
                locator,
                attempts,
                elapsed,
                source,
            },
        })?;

        let result = judge(expectation, poll);
        match &result {
            Ok(report) => info!(
                locator = %locator,
                expected = %expectation.expected,
                attempts = report.poll.attempts,
                "check passed"
            ),
            Err(error) => warn!(locator = %locator, %error, "check failed"),
        }
        result
    }

    /// Wait for a freshly published locator to serve 200
    pub fn wait_for_live(&self, locator: &ResourceLocator) -> Result<CheckReport, VerifyError> {
        self.check(locator, &self.expectation(Expected::Live))
    }

    /// Wait for an unpublished parent to serve 410
    pub fn wait_for_gone(&self, locator: &ResourceLocator) -> Result<CheckReport, VerifyError> {
        self.check(locator, &self.expectation(Expected::Gone))
    }

    /// Wait for a retired child to serve 404.
    ///
    /// Callers must have seen the parent settle to 410 first; `verify_removed`
    /// enforces that ordering.
    pub fn wait_for_not_found(&self, locator: &ResourceLocator) -> Result<CheckReport, VerifyError> {
        self.check(locator, &self.expectation(Expected::NotFound))
    }

    /// Verify an unpublished parent and its parts: the parent must settle to
    /// 410 before any child is checked for 404
    pub fn verify_removed<S: AsRef<str>>(
        &self,
        parent: &ResourceLocator,
        part_slugs: &[S],
    ) -> Result<RemovalReport, VerifyError> {
        let children = part_slugs
            .iter()
            .map(|slug| parent.child(slug.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.verify_retired(&RetiredLocators {
            parent: parent.clone(),
            children,
        }))
    }

    /// Verify locators returned by an unpublish
    pub fn verify_retired(&self, retired: &RetiredLocators) -> RemovalReport {
        let lifecycle = ObservedLifecycle::new(retired.parent.clone(), retired.children.iter().cloned());
        self.verify_retired_tracked(retired, lifecycle)
    }

    pub(crate) fn verify_retired_tracked(
        &self,
        retired: &RetiredLocators,
        mut lifecycle: ObservedLifecycle,
    ) -> RemovalReport {
        let parent_check = tracked(self.wait_for_gone(&retired.parent), |observed| {
            lifecycle.record_parent(observed)
        });
        let parent = CheckResult::from_check(&retired.parent, Expected::Gone, parent_check);

        let mut children = Vec::with_capacity(retired.children.len());
        for child in &retired.children {
            if let Err(e) = lifecycle.ensure_parent_gone(child) {
                children.push(CheckResult::Skipped {
                    locator: child.clone(),
                    expected: Expected::NotFound,
                    reason: e.to_string(),
                });
                continue;
            }

            let child_check = tracked(self.wait_for_not_found(child), |observed| {
                lifecycle.record_child(child, observed)
            });
            children.push(CheckResult::from_check(child, Expected::NotFound, child_check));
        }

        RemovalReport {
            parent,
            children,
            lifecycle,
        }
    }
}

/// Feed a check's observed statuses into the lifecycle, failed checks included.
///
/// A contradiction on a passed check fails it; on an already failed check it
/// is only logged and the check keeps its own failure.
pub(crate) fn tracked(
    result: Result<CheckReport, VerifyError>,
    record: impl FnOnce(&[u16]) -> Result<ObservedState, StateError>,
) -> Result<CheckReport, VerifyError> {
    match result {
        Ok(report) => {
            record(&report.poll.observed)?;
            Ok(report)
        }
        Err(error) => {
            if let Some(report) = error.report() {
                if let Err(state_error) = record(&report.poll.observed) {
                    warn!(%state_error, "observations from failed check contradict lifecycle");
                }
            }
            Err(error)
        }
    }
}

/// Interpret a finished poll
fn judge(expectation: &Expectation, poll: PollReport) -> Result<CheckReport, VerifyError> {
    let report = CheckReport {
        expected: expectation.expected,
        transient: expectation.transient.clone(),
        poll,
    };

    match report.poll.outcome {
        PollOutcome::Settled(actual) if !report.expected.matches(actual) => Err(VerifyError::UnexpectedStatus {
            actual,
            report: Box::new(report),
        }),
        PollOutcome::Settled(_) => {
            let body = report.poll.body.as_deref().unwrap_or_default();
            match expectation.marker() {
                Some(marker) if !expectation.body_matches(body) => Err(VerifyError::UnexpectedBody {
                    marker: marker.to_string(),
                    report: Box::new(report),
                }),
                _ => Ok(report),
            }
        }
        PollOutcome::TimedOut => match (report.poll.never_reached(), &report.poll.last_error) {
            // Every probe failed below the status level
            (true, Some(source)) => Err(VerifyError::TransportFailure {
                locator: report.poll.locator.clone(),
                attempts: report.poll.attempts,
                elapsed: report.poll.elapsed,
                source: source.clone(),
            }),
            _ => Err(VerifyError::Timeout {
                report: Box::new(report),
            }),
        },
        PollOutcome::Cancelled => Err(VerifyError::Cancelled {
            report: Box::new(report),
        }),
    }
}
