//! Check and removal reports

use std::time::Duration;

use pv_content::ResourceLocator;

use super::error::VerifyError;
use super::expectation::Expected;
use crate::poller::{PollOutcome, PollReport, TransientSet};
use crate::state::ObservedLifecycle;
use crate::summary::Status;

/// A completed poll interpreted against an expectation
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub expected: Expected,
    pub transient: TransientSet,
    pub poll: PollReport,
}

impl CheckReport {
    pub fn locator(&self) -> &ResourceLocator {
        &self.poll.locator
    }

    pub fn outcome(&self) -> PollOutcome {
        self.poll.outcome
    }

    pub fn attempts(&self) -> u32 {
        self.poll.attempts
    }

    pub fn elapsed(&self) -> Duration {
        self.poll.elapsed
    }
}

/// Result of one check within a larger verification
#[derive(Debug, Clone)]
pub enum CheckResult {
    Passed(CheckReport),
    Failed {
        locator: ResourceLocator,
        expected: Expected,
        error: VerifyError,
    },
    /// Not run because an earlier check did not pass
    Skipped {
        locator: ResourceLocator,
        expected: Expected,
        reason: String,
    },
}

impl CheckResult {
    pub(crate) fn from_check(
        locator: &ResourceLocator,
        expected: Expected,
        result: Result<CheckReport, VerifyError>,
    ) -> Self {
        match result {
            Ok(report) => CheckResult::Passed(report),
            Err(error) => CheckResult::Failed {
                locator: locator.clone(),
                expected,
                error,
            },
        }
    }

    pub fn locator(&self) -> &ResourceLocator {
        match self {
            CheckResult::Passed(report) => report.locator(),
            CheckResult::Failed { locator, .. } | CheckResult::Skipped { locator, .. } => locator,
        }
    }

    pub fn expected(&self) -> Expected {
        match self {
            CheckResult::Passed(report) => report.expected,
            CheckResult::Failed { expected, .. } | CheckResult::Skipped { expected, .. } => *expected,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            CheckResult::Passed(_) => Status::Passed,
            CheckResult::Failed { error, .. } if error.is_cancelled() => Status::Cancelled,
            CheckResult::Failed { .. } => Status::Failed,
            CheckResult::Skipped { .. } => Status::Skipped,
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, CheckResult::Passed(_))
    }

    /// The poll behind this result, if one ran to completion
    pub fn report(&self) -> Option<&CheckReport> {
        match self {
            CheckResult::Passed(report) => Some(report),
            CheckResult::Failed { error, .. } => error.report(),
            CheckResult::Skipped { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&VerifyError> {
        match self {
            CheckResult::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Outcome of verifying that a parent and its children were retired
#[derive(Debug, Clone)]
pub struct RemovalReport {
    /// The parent's 410 check
    pub parent: CheckResult,
    /// One 404 check per child, in part order
    pub children: Vec<CheckResult>,
    /// Observed states after all checks
    pub lifecycle: ObservedLifecycle,
}

impl RemovalReport {
    /// True when the parent and every child passed
    pub fn is_success(&self) -> bool {
        self.parent.is_passed() && self.children.iter().all(CheckResult::is_passed)
    }

    /// Parent first, then children
    pub fn results(&self) -> impl Iterator<Item = &CheckResult> {
        std::iter::once(&self.parent).chain(self.children.iter())
    }

    /// First failure in check order
    pub fn first_error(&self) -> Option<&VerifyError> {
        self.results().find_map(CheckResult::error)
    }
}
