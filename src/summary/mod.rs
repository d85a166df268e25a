//! Summary and failure taxonomy
//!
//! Every check yields a [`CheckSummary`]; a run aggregates them into a
//! [`RunSummary`] (run_summary.json) with a stable exit code.

mod check_summary;
mod failure;
mod run_summary;

pub use check_summary::CheckSummary;
pub use failure::{ExitCode, ExitCodeAggregator, FailureKind, Status};
pub use run_summary::{RunSummary, RUN_SUMMARY_SCHEMA_ID, RUN_SUMMARY_SCHEMA_VERSION};
