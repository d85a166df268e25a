//! Verification errors

use std::time::Duration;

use pv_content::{ContentError, LocatorError, ResourceLocator};

use super::report::CheckReport;
use crate::authoring::AuthoringError;
use crate::poller::PollConfigError;
use crate::probe::TransportError;
use crate::state::StateError;
use crate::summary::FailureKind;

/// Why a check or scenario failed.
///
/// Check failures box their [`CheckReport`] so the attempt count, elapsed
/// time and observed statuses travel with the error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VerifyError {
    #[error("{} settled to {actual}, expected {}", .report.locator(), .report.expected)]
    UnexpectedStatus { actual: u16, report: Box<CheckReport> },

    #[error("{} returned the expected status but the body does not mention {marker:?}", .report.locator())]
    UnexpectedBody { marker: String, report: Box<CheckReport> },

    #[error(
        "{} did not settle after {} attempt(s) in {:?} (last status {:?})",
        .report.locator(),
        .report.poll.attempts,
        .report.poll.elapsed,
        .report.poll.last_status()
    )]
    Timeout { report: Box<CheckReport> },

    #[error("transport failure probing {locator} after {attempts} attempt(s): {source}")]
    TransportFailure {
        locator: ResourceLocator,
        attempts: u32,
        elapsed: Duration,
        source: TransportError,
    },

    #[error("check of {} cancelled after {} attempt(s)", .report.locator(), .report.poll.attempts)]
    Cancelled { report: Box<CheckReport> },

    #[error(transparent)]
    Sequencing(#[from] StateError),

    #[error("invalid poll configuration: {0}")]
    Config(#[from] PollConfigError),

    #[error("authoring failed: {0}")]
    Authoring(#[from] AuthoringError),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Locator(#[from] LocatorError),
}

impl VerifyError {
    /// Failure category for summaries and exit codes
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            VerifyError::UnexpectedStatus { .. } => FailureKind::UnexpectedStatus,
            VerifyError::UnexpectedBody { .. } => FailureKind::UnexpectedBody,
            VerifyError::Timeout { .. } => FailureKind::Timeout,
            VerifyError::TransportFailure { .. } => FailureKind::Transport,
            VerifyError::Cancelled { .. } => FailureKind::Cancelled,
            VerifyError::Sequencing(_) => FailureKind::Sequencing,
            VerifyError::Authoring(_) => FailureKind::Authoring,
            VerifyError::Config(_) | VerifyError::Content(_) | VerifyError::Locator(_) => {
                FailureKind::Config
            }
        }
    }

    /// Poll details, when the failure came out of a completed poll
    pub fn report(&self) -> Option<&CheckReport> {
        match self {
            VerifyError::UnexpectedStatus { report, .. }
            | VerifyError::UnexpectedBody { report, .. }
            | VerifyError::Timeout { report }
            | VerifyError::Cancelled { report } => Some(report),
            _ => None,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            VerifyError::TransportFailure { attempts, .. } => *attempts,
            other => other.report().map_or(0, |r| r.poll.attempts),
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            VerifyError::TransportFailure { elapsed, .. } => *elapsed,
            other => other.report().map_or(Duration::ZERO, |r| r.poll.elapsed),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, VerifyError::Cancelled { .. })
    }
}
