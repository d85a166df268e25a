//! Run summary (run_summary.json)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

use super::check_summary::CheckSummary;
use super::failure::{ExitCode, ExitCodeAggregator, Status};

/// Schema version for run_summary.json
pub const RUN_SUMMARY_SCHEMA_VERSION: u32 = 1;

/// Schema identifier for run_summary.json
pub const RUN_SUMMARY_SCHEMA_ID: &str = "propagation-verifier/run_summary@1";

/// Run summary (run_summary.json)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// Run identifier
    pub run_id: String,

    /// When the summary was created
    pub created_at: DateTime<Utc>,

    /// Aggregated status
    pub status: Status,

    /// Aggregated exit code
    pub exit_code: i32,

    /// Total checks in the run
    pub check_count: usize,

    pub checks_passed: usize,

    pub checks_failed: usize,

    pub checks_cancelled: usize,

    /// Checks not run because their parent did not settle to 410
    pub checks_skipped: usize,

    /// Wall-clock duration of the entire run in milliseconds
    pub duration_ms: u64,

    /// Human-readable summary
    pub human_summary: String,

    /// Per-check detail, in the order checks ran
    pub checks: Vec<CheckSummary>,
}

impl RunSummary {
    /// Aggregate check summaries
    pub fn from_checks(run_id: String, checks: Vec<CheckSummary>, duration_ms: u64) -> Self {
        let mut aggregator = ExitCodeAggregator::new();
        let mut checks_passed = 0;
        let mut checks_failed = 0;
        let mut checks_cancelled = 0;
        let mut checks_skipped = 0;

        for check in &checks {
            let exit_code = ExitCode::from_i32(check.exit_code).unwrap_or(ExitCode::UnexpectedStatus);
            aggregator.add(check.status, exit_code);

            match check.status {
                Status::Passed => checks_passed += 1,
                Status::Failed => checks_failed += 1,
                Status::Cancelled => checks_cancelled += 1,
                Status::Skipped => checks_skipped += 1,
            }
        }

        let status = aggregator.status();
        let check_count = checks.len();
        let human_summary = Self::generate_human_summary(
            status,
            check_count,
            checks_passed,
            checks_failed,
            checks_cancelled,
            checks_skipped,
        );

        Self {
            schema_version: RUN_SUMMARY_SCHEMA_VERSION,
            schema_id: RUN_SUMMARY_SCHEMA_ID.to_string(),
            run_id,
            created_at: Utc::now(),
            status,
            exit_code: aggregator.exit_code().as_i32(),
            check_count,
            checks_passed,
            checks_failed,
            checks_cancelled,
            checks_skipped,
            duration_ms,
            human_summary,
            checks,
        }
    }

    fn generate_human_summary(
        status: Status,
        check_count: usize,
        passed: usize,
        failed: usize,
        cancelled: usize,
        skipped: usize,
    ) -> String {
        match status {
            Status::Passed if check_count == 0 => "No checks executed".to_string(),
            Status::Passed if check_count == 1 => "Check passed".to_string(),
            Status::Passed => format!("Run passed: {}/{} checks passed", passed, check_count),
            Status::Failed => format!(
                "Run failed: {} passed, {} failed, {} skipped",
                passed, failed, skipped
            ),
            Status::Cancelled => format!("Run cancelled: {} check(s) cancelled", cancelled),
            // The aggregator never reports a whole run as skipped
            Status::Skipped => format!("Run skipped: {} check(s) skipped", skipped),
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Write to file, creating parent directories
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e))
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)
    }

    /// Load from file
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e)))
    }

    /// Get the exit code as ExitCode enum
    pub fn exit_code_enum(&self) -> Option<ExitCode> {
        ExitCode::from_i32(self.exit_code)
    }
}
