//! Poll budget enforcement
//!
//! A poll is bounded by a maximum number of attempts, a maximum elapsed
//! duration, or both. At least one bound must be set; an unbounded budget
//! fails validation.
//!
//! The tracker only answers "may another probe be issued?". It never
//! sleeps or probes itself.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Upper limit on `max_attempts`
pub const MAX_ATTEMPTS_LIMIT: u32 = 100_000;

/// Upper limit on `max_duration` (24 hours)
pub const MAX_DURATION_LIMIT: Duration = Duration::from_secs(86_400);

/// Attempt and duration bounds for a single poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollBudget {
    /// Maximum number of probes
    pub max_attempts: Option<u32>,

    /// Maximum wall-clock time spent polling
    pub max_duration: Option<Duration>,
}

impl Default for PollBudget {
    fn default() -> Self {
        Self {
            max_attempts: Some(60),
            max_duration: Some(Duration::from_secs(300)),
        }
    }
}

impl PollBudget {
    /// Bound by attempts only
    pub fn attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            max_duration: None,
        }
    }

    /// Bound by duration only
    pub fn duration(max_duration: Duration) -> Self {
        Self {
            max_attempts: None,
            max_duration: Some(max_duration),
        }
    }

    /// Bound by both; whichever is hit first ends the poll
    pub fn both(max_attempts: u32, max_duration: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            max_duration: Some(max_duration),
        }
    }

    /// Validate bounds
    pub fn validate(&self) -> Result<(), BudgetValidationError> {
        if self.max_attempts.is_none() && self.max_duration.is_none() {
            return Err(BudgetValidationError::Unbounded);
        }

        if let Some(attempts) = self.max_attempts {
            if attempts == 0 || attempts > MAX_ATTEMPTS_LIMIT {
                return Err(BudgetValidationError::AttemptsOutOfBounds { value: attempts });
            }
        }

        if let Some(duration) = self.max_duration {
            if duration.is_zero() || duration > MAX_DURATION_LIMIT {
                return Err(BudgetValidationError::DurationOutOfBounds { value: duration });
            }
        }

        Ok(())
    }
}

/// Budget validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BudgetValidationError {
    #[error("poll budget must bound attempts, duration, or both")]
    Unbounded,

    #[error("max_attempts must be in (0, 100000], got {value}")]
    AttemptsOutOfBounds { value: u32 },

    #[error("max_duration must be in (0s, 86400s], got {value:?}")]
    DurationOutOfBounds { value: Duration },
}

/// Budget check result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    /// Another probe may be issued
    Ok,
    /// The attempt bound has been reached
    AttemptsExhausted,
    /// The duration bound has been reached
    DeadlineExceeded,
}

impl BudgetStatus {
    /// Returns true if the budget is spent
    pub fn is_exhausted(&self) -> bool {
        !matches!(self, BudgetStatus::Ok)
    }

    /// Stable label for reports
    pub fn failure_subkind(&self) -> Option<&'static str> {
        match self {
            BudgetStatus::Ok => None,
            BudgetStatus::AttemptsExhausted => Some("ATTEMPTS_EXHAUSTED"),
            BudgetStatus::DeadlineExceeded => Some("DEADLINE_EXCEEDED"),
        }
    }
}

/// Tracks attempts and elapsed time for one poll
#[derive(Debug)]
pub struct BudgetTracker {
    budget: PollBudget,
    start_time: Instant,
    attempts: u32,
}

impl BudgetTracker {
    /// Start tracking now
    pub fn new(budget: PollBudget) -> Self {
        Self {
            budget,
            start_time: Instant::now(),
            attempts: 0,
        }
    }

    /// Count one issued probe
    pub fn record_attempt(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }

    /// Probes issued so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Check the budget.
    ///
    /// The first probe is always allowed: a duration bound only applies
    /// once something has been observed.
    pub fn check(&self) -> BudgetStatus {
        if let Some(max) = self.budget.max_attempts {
            if self.attempts >= max {
                return BudgetStatus::AttemptsExhausted;
            }
        }

        if self.attempts > 0 {
            if let Some(max) = self.budget.max_duration {
                if self.elapsed() >= max {
                    return BudgetStatus::DeadlineExceeded;
                }
            }
        }

        BudgetStatus::Ok
    }

    /// Elapsed time since tracking started
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Time left before the duration bound, if there is one
    pub fn remaining(&self) -> Option<Duration> {
        self.budget
            .max_duration
            .map(|max| max.saturating_sub(self.elapsed()))
    }

    /// Shorten `wait` so it never sleeps past the duration bound
    pub fn clamp_wait(&self, wait: Duration) -> Duration {
        match self.remaining() {
            Some(remaining) => wait.min(remaining),
            None => wait,
        }
    }

    pub fn budget(&self) -> &PollBudget {
        &self.budget
    }
}
