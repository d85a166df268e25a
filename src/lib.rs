//! Propagation verifier - eventual-consistency checks for published content
//!
//! This crate verifies that lifecycle changes made on an authoring surface
//! (publish, unpublish without redirect) eventually become visible on a
//! delivery surface. Each check polls a locator until it settles on a
//! non-transient status, then judges that status against what the lifecycle
//! step should have produced.

pub mod authoring;
pub mod cancel;
pub mod config;
pub mod mock;
pub mod poller;
pub mod probe;
pub mod signal;
pub mod state;
pub mod summary;
pub mod timeout;
pub mod verifier;

pub use authoring::{Authoring, AuthoringError};
pub use cancel::{CancelReason, CancelToken};
pub use config::{ConfigError, EffectiveConfig, Settings};
pub use poller::{
    poll_until_settled, Backoff, PollConfig, PollError, PollOutcome, PollReport, Poller, TransientSet,
    TransportPolicy,
};
pub use probe::{HttpProbe, Probe, ProbeResponse, TransportError};
pub use summary::{CheckSummary, ExitCode, FailureKind, RunSummary, Status};
pub use timeout::PollBudget;
pub use verifier::{
    CheckReport, CheckResult, Expectation, Expected, RemovalReport, RemovalTarget, Verifier, VerifierConfig,
    VerifyError,
};

pub use pv_content::{ArtefactFormat, ResourceLocator, RetiredLocators};
