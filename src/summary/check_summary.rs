//! Per-check summary

use serde::{Deserialize, Serialize};

use super::failure::{ExitCode, FailureKind, Status};
use crate::poller::PollOutcome;
use crate::verifier::{CheckResult, Expected, VerifyError};

/// Summary of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    /// Probed locator
    pub locator: String,

    /// Expected settled state
    pub expected: Expected,

    /// Transient set the poll used
    #[serde(default)]
    pub transient: Vec<u16>,

    /// Check status
    pub status: Status,

    /// Poll outcome, when a poll completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<PollOutcome>,

    /// Probes issued
    pub attempts: u32,

    /// Wall-clock time spent polling in milliseconds
    pub elapsed_ms: u64,

    /// Every status observed, in order
    #[serde(default)]
    pub observed: Vec<u16>,

    /// Failure kind (if failed or cancelled)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,

    /// Which budget bound ran out, for timeouts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_subkind: Option<String>,

    /// Human-readable failure or skip reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Exit code this check alone would produce
    pub exit_code: i32,
}

impl CheckSummary {
    pub fn from_result(result: &CheckResult) -> Self {
        let status = result.status();
        let report = result.report();

        let (failure_kind, message) = match result {
            CheckResult::Passed(_) => (None, None),
            CheckResult::Failed { error, .. } => (Some(error.failure_kind()), Some(error.to_string())),
            CheckResult::Skipped { reason, .. } => (None, Some(reason.clone())),
        };

        let (attempts, elapsed) = match (result.error(), report) {
            (Some(error), _) => (error.attempts(), error.elapsed()),
            (None, Some(report)) => (report.attempts(), report.elapsed()),
            (None, None) => (0, std::time::Duration::ZERO),
        };

        let exit_code = failure_kind.map_or(ExitCode::Success, |kind| kind.exit_code());

        Self {
            locator: result.locator().to_string(),
            expected: result.expected(),
            transient: report.map(|r| r.transient.to_vec()).unwrap_or_default(),
            status,
            outcome: report.map(|r| r.outcome()),
            attempts,
            elapsed_ms: elapsed.as_millis() as u64,
            observed: report.map(|r| r.poll.observed.clone()).unwrap_or_default(),
            failure_kind,
            failure_subkind: report
                .and_then(|r| r.poll.exhausted)
                .and_then(|b| b.failure_subkind())
                .map(str::to_string),
            message,
            exit_code: exit_code.as_i32(),
        }
    }

    /// Summary for a check that could not start
    pub fn from_error(locator: impl Into<String>, expected: Expected, error: &VerifyError) -> Self {
        let kind = error.failure_kind();
        Self {
            locator: locator.into(),
            expected,
            transient: Vec::new(),
            status: if error.is_cancelled() { Status::Cancelled } else { Status::Failed },
            outcome: None,
            attempts: error.attempts(),
            elapsed_ms: error.elapsed().as_millis() as u64,
            observed: Vec::new(),
            failure_kind: Some(kind),
            failure_subkind: None,
            message: Some(error.to_string()),
            exit_code: kind.exit_code().as_i32(),
        }
    }

    pub fn exit_code_enum(&self) -> Option<ExitCode> {
        ExitCode::from_i32(self.exit_code)
    }

    /// One line for terminal output
    pub fn human_line(&self) -> String {
        let label = match self.status {
            Status::Passed => "PASS",
            Status::Failed => "FAIL",
            Status::Skipped => "SKIP",
            Status::Cancelled => "CANC",
        };
        let mut line = format!(
            "{} {} expected {} ({} attempt(s), {} ms)",
            label, self.locator, self.expected, self.attempts, self.elapsed_ms
        );
        if let Some(message) = &self.message {
            line.push_str(": ");
            line.push_str(message);
        }
        line
    }
}
