//! Failure taxonomy and stable exit codes

use serde::{Deserialize, Serialize};

/// Check/run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Settled on the expected status
    Passed,
    /// Timed out, settled elsewhere, or could not probe
    Failed,
    /// Not run because an earlier check failed
    Skipped,
    /// Cancel token tripped
    Cancelled,
}

impl Status {
    /// Check if this is a failure state
    pub fn is_failure(&self) -> bool {
        matches!(self, Status::Failed | Status::Cancelled)
    }
}

/// Failure kind - categorizes the cause of failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Settled on a status other than the expected one
    UnexpectedStatus,
    /// Expected status, but the body lacks the required marker
    UnexpectedBody,
    /// Poll budget exhausted
    Timeout,
    /// Probe could not execute
    Transport,
    /// Cancel token tripped
    Cancelled,
    /// Check run out of order, or an observed state regressed
    Sequencing,
    /// Authoring surface rejected an operation
    Authoring,
    /// Invalid configuration or input
    Config,
}

impl FailureKind {
    /// Get the stable exit code for this failure kind
    pub fn exit_code(&self) -> ExitCode {
        match self {
            FailureKind::UnexpectedStatus | FailureKind::UnexpectedBody | FailureKind::Sequencing => {
                ExitCode::UnexpectedStatus
            }
            FailureKind::Timeout => ExitCode::Timeout,
            FailureKind::Transport => ExitCode::Transport,
            FailureKind::Cancelled => ExitCode::Cancelled,
            FailureKind::Authoring => ExitCode::Authoring,
            FailureKind::Config => ExitCode::Usage,
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            FailureKind::UnexpectedStatus => "Settled on an unexpected status",
            FailureKind::UnexpectedBody => "Response body missing expected marker",
            FailureKind::Timeout => "Did not settle within the poll budget",
            FailureKind::Transport => "Probe could not reach the delivery surface",
            FailureKind::Cancelled => "Check cancelled",
            FailureKind::Sequencing => "Lifecycle observed out of order",
            FailureKind::Authoring => "Authoring operation failed",
            FailureKind::Config => "Invalid configuration",
        }
    }
}

/// Stable exit codes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum ExitCode {
    /// Every check passed
    #[default]
    Success = 0,
    /// Bad arguments or configuration
    Usage = 2,
    /// Unexpected settled status or body
    UnexpectedStatus = 10,
    /// Transport failure
    Transport = 20,
    /// Poll budget exhausted
    Timeout = 30,
    /// Authoring surface failure
    Authoring = 40,
    /// Run was cancelled
    Cancelled = 80,
}

impl ExitCode {
    /// Get the integer value of the exit code
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// Create from integer value
    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(ExitCode::Success),
            2 => Some(ExitCode::Usage),
            10 => Some(ExitCode::UnexpectedStatus),
            20 => Some(ExitCode::Transport),
            30 => Some(ExitCode::Timeout),
            40 => Some(ExitCode::Authoring),
            80 => Some(ExitCode::Cancelled),
            _ => None,
        }
    }

    /// Check if this exit code indicates success
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }
}

/// Helper for aggregating exit codes across multiple checks
#[derive(Debug, Default)]
pub struct ExitCodeAggregator {
    has_cancelled: bool,
    first_failure_code: Option<ExitCode>,
}

impl ExitCodeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a check's status and exit code to the aggregation
    pub fn add(&mut self, status: Status, exit_code: ExitCode) {
        match status {
            Status::Cancelled => {
                self.has_cancelled = true;
            }
            Status::Failed => {
                if self.first_failure_code.is_none() {
                    self.first_failure_code = Some(exit_code);
                }
            }
            Status::Passed | Status::Skipped => {}
        }
    }

    /// Get the aggregated status
    pub fn status(&self) -> Status {
        if self.has_cancelled {
            Status::Cancelled
        } else if self.first_failure_code.is_some() {
            Status::Failed
        } else {
            Status::Passed
        }
    }

    /// Cancellation wins; otherwise the first failure's code
    pub fn exit_code(&self) -> ExitCode {
        if self.has_cancelled {
            ExitCode::Cancelled
        } else if let Some(code) = self.first_failure_code {
            code
        } else {
            ExitCode::Success
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&Status::Passed).unwrap(), r#""passed""#);
        assert_eq!(serde_json::to_string(&Status::Skipped).unwrap(), r#""skipped""#);
        assert_eq!(serde_json::to_string(&Status::Cancelled).unwrap(), r#""cancelled""#);
    }

    #[test]
    fn test_failure_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&FailureKind::UnexpectedStatus).unwrap(),
            r#""UNEXPECTED_STATUS""#
        );
        assert_eq!(serde_json::to_string(&FailureKind::Timeout).unwrap(), r#""TIMEOUT""#);
    }

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::Usage.as_i32(), 2);
        assert_eq!(ExitCode::UnexpectedStatus.as_i32(), 10);
        assert_eq!(ExitCode::Transport.as_i32(), 20);
        assert_eq!(ExitCode::Timeout.as_i32(), 30);
        assert_eq!(ExitCode::Authoring.as_i32(), 40);
        assert_eq!(ExitCode::Cancelled.as_i32(), 80);
    }

    #[test]
    fn test_exit_code_from_i32() {
        assert_eq!(ExitCode::from_i32(30), Some(ExitCode::Timeout));
        assert_eq!(ExitCode::from_i32(80), Some(ExitCode::Cancelled));
        assert_eq!(ExitCode::from_i32(999), None);
    }

    #[test]
    fn test_failure_kind_exit_code_mapping() {
        assert_eq!(FailureKind::UnexpectedStatus.exit_code(), ExitCode::UnexpectedStatus);
        assert_eq!(FailureKind::UnexpectedBody.exit_code(), ExitCode::UnexpectedStatus);
        assert_eq!(FailureKind::Timeout.exit_code(), ExitCode::Timeout);
        assert_eq!(FailureKind::Transport.exit_code(), ExitCode::Transport);
        assert_eq!(FailureKind::Authoring.exit_code(), ExitCode::Authoring);
        assert_eq!(FailureKind::Cancelled.exit_code(), ExitCode::Cancelled);
        assert_eq!(FailureKind::Config.exit_code(), ExitCode::Usage);
    }

    #[test]
    fn test_aggregator_all_passed() {
        let mut agg = ExitCodeAggregator::new();
        agg.add(Status::Passed, ExitCode::Success);
        agg.add(Status::Skipped, ExitCode::Success);

        assert_eq!(agg.status(), Status::Passed);
        assert_eq!(agg.exit_code(), ExitCode::Success);
    }

    #[test]
    fn test_aggregator_cancelled_wins() {
        let mut agg = ExitCodeAggregator::new();
        agg.add(Status::Failed, ExitCode::Timeout);
        agg.add(Status::Cancelled, ExitCode::Cancelled);

        assert_eq!(agg.status(), Status::Cancelled);
        assert_eq!(agg.exit_code(), ExitCode::Cancelled);
    }

    #[test]
    fn test_aggregator_first_failure_code() {
        let mut agg = ExitCodeAggregator::new();
        agg.add(Status::Passed, ExitCode::Success);
        agg.add(Status::Failed, ExitCode::Transport);
        agg.add(Status::Failed, ExitCode::Timeout);

        assert_eq!(agg.status(), Status::Failed);
        assert_eq!(agg.exit_code(), ExitCode::Transport);
    }

    #[test]
    fn test_status_is_failure() {
        assert!(!Status::Passed.is_failure());
        assert!(!Status::Skipped.is_failure());
        assert!(Status::Failed.is_failure());
        assert!(Status::Cancelled.is_failure());
    }
}
