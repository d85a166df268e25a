//! Eventual-consistency poller
//!
//! Repeatedly probes one locator until the observed status leaves a
//! caller-supplied transient set, the poll budget runs out, or the run is
//! cancelled. At most one probe is in flight per poll; waits between probes
//! sleep on the cancel token so cancellation wakes them immediately. An
//! in-flight probe is limited to the rest of the duration bound and the
//! token's deadline, and its result is discarded if the token trips meanwhile.
//!
//! Transport failures are handled per [`TransportPolicy`]: by default they
//! count as "not settled yet" and consume an attempt. Under
//! `FailFastUnrecoverable`, DNS/TLS/invalid-request failures end the poll
//! with [`PollError::Transport`].

mod backoff;
mod outcome;

pub use backoff::Backoff;
pub use outcome::{InvalidStatusCode, PollOutcome, PollReport, TransientSet};

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use pv_content::ResourceLocator;

use crate::cancel::CancelToken;
use crate::probe::{Probe, TransportError};
use crate::timeout::{BudgetStatus, BudgetTracker, BudgetValidationError, PollBudget};

/// How probe failures below the status level are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportPolicy {
    /// Every transport failure is "not settled yet"
    #[default]
    #[serde(rename = "transient")]
    TreatAsTransient,
    /// DNS, TLS and invalid-request failures end the poll immediately
    #[serde(rename = "fail_fast")]
    FailFastUnrecoverable,
}

/// Poll configuration shared by every check in a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PollConfig {
    pub budget: PollBudget,
    pub backoff: Backoff,
    /// Randomize each wait to 50-100% of the backoff delay
    pub jitter: bool,
    pub transport_policy: TransportPolicy,
}

impl PollConfig {
    pub fn validate(&self) -> Result<(), PollConfigError> {
        self.budget.validate()?;
        self.backoff.validate().map_err(PollConfigError::Backoff)?;
        Ok(())
    }

    /// Wait after the `attempt`-th probe, before budget clamping
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.backoff.delay(attempt);
        if self.jitter {
            Backoff::jittered(delay)
        } else {
            delay
        }
    }
}

/// Poll configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollConfigError {
    #[error("{0}")]
    Budget(#[from] BudgetValidationError),

    #[error("{0}")]
    Backoff(String),
}

/// Poll errors. Budget exhaustion and cancellation are outcomes, not errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PollError {
    #[error("invalid poll configuration: {0}")]
    Config(#[from] PollConfigError),

    #[error("unrecoverable transport failure probing {locator} (attempt {attempts}): {source}")]
    Transport {
        locator: ResourceLocator,
        attempts: u32,
        elapsed: Duration,
        source: TransportError,
    },
}

/// Poll `locator` until its status leaves `transient`.
///
/// Returns `Settled(status)` with the first non-transient status,
/// `TimedOut` when the budget is spent, or `Cancelled` when `cancel` trips.
/// No further probe is issued once the budget check fails, and the poller
/// never sleeps past the duration bound.
pub fn poll_until_settled<P: Probe + ?Sized>(
    probe: &P,
    locator: &ResourceLocator,
    transient: &TransientSet,
    config: &PollConfig,
    cancel: &CancelToken,
) -> Result<PollReport, PollError> {
    config.validate()?;

    let span = tracing::debug_span!("poll", locator = %locator, transient = %transient);
    let _enter = span.enter();

    let mut tracker = BudgetTracker::new(config.budget);
    let mut report = PollReport::new(locator.clone());

    loop {
        if cancel.is_cancelled() {
            info!(attempts = tracker.attempts(), "poll cancelled");
            report.outcome = PollOutcome::Cancelled;
            break;
        }

        let budget = tracker.check();
        if budget.is_exhausted() {
            warn!(attempts = tracker.attempts(), ?budget, last_status = ?report.last_status(), "poll budget exhausted");
            report.outcome = PollOutcome::TimedOut;
            report.exhausted = Some(budget);
            break;
        }

        tracker.record_attempt();
        let attempt = tracker.attempts();

        let limit = probe_limit(&tracker, cancel);
        let result = probe.probe_within(locator, limit);

        if cancel.is_cancelled() {
            info!(attempt, "poll cancelled during probe");
            report.outcome = PollOutcome::Cancelled;
            break;
        }

        match result {
            Err(TransportError::Timeout(_)) if tracker.check() == BudgetStatus::DeadlineExceeded => {
                debug!(attempt, ?limit, "probe cut short by the duration bound");
            }
            Ok(response) if transient.contains(response.status) => {
                debug!(attempt, status = response.status, "transient status");
                report.observed.push(response.status);
            }
            Ok(response) => {
                info!(attempt, status = response.status, "settled");
                report.observed.push(response.status);
                report.outcome = PollOutcome::Settled(response.status);
                report.body = Some(response.body);
                break;
            }
            Err(error) => {
                report.transport_failures += 1;
                if config.transport_policy == TransportPolicy::FailFastUnrecoverable
                    && error.is_unrecoverable()
                {
                    warn!(attempt, %error, "unrecoverable transport failure");
                    return Err(PollError::Transport {
                        locator: locator.clone(),
                        attempts: attempt,
                        elapsed: tracker.elapsed(),
                        source: error,
                    });
                }
                debug!(attempt, %error, "probe failed, treating as transient");
                report.last_error = Some(error);
            }
        }

        // Don't sleep when the next check would end the poll anyway.
        let budget = tracker.check();
        if budget.is_exhausted() {
            continue;
        }

        // A trip during the wait is picked up at the top of the loop.
        cancel.wait(tracker.clamp_wait(config.delay_for(attempt)));
    }

    report.attempts = tracker.attempts();
    report.elapsed = tracker.elapsed();
    Ok(report)
}

/// Longest the next probe may run: whatever is left of the duration bound
/// or of the cancel deadline, whichever is sooner.
fn probe_limit(tracker: &BudgetTracker, cancel: &CancelToken) -> Option<Duration> {
    let until_deadline = cancel
        .deadline()
        .map(|deadline| deadline.saturating_duration_since(Instant::now()));
    match (tracker.remaining(), until_deadline) {
        (Some(remaining), Some(until_deadline)) => Some(remaining.min(until_deadline)),
        (remaining, until_deadline) => remaining.or(until_deadline),
    }
}

/// A probe bundled with the poll configuration and cancel token of a run
pub struct Poller<P> {
    probe: P,
    config: PollConfig,
    cancel: CancelToken,
}

impl<P: Probe> Poller<P> {
    pub fn new(probe: P, config: PollConfig) -> Self {
        Self {
            probe,
            config,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn poll_until_settled(
        &self,
        locator: &ResourceLocator,
        transient: &TransientSet,
    ) -> Result<PollReport, PollError> {
        poll_until_settled(&self.probe, locator, transient, &self.config, &self.cancel)
    }
}
