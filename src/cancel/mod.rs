//! Cancellation support for verification runs
//!
//! Cancel flows:
//! - Explicit: a caller trips the token with reason=USER
//! - Signal handling (SIGINT/SIGTERM): reason=SIGNAL
//! - Deadline: an absolute instant after which the token reads as tripped
//!
//! A token is cheap to clone; every clone observes the same state. Waiting
//! on a token is a condition-variable wait that wakes as soon as it trips.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Why a run was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelReason {
    /// Cancelled by the caller
    User,
    /// SIGINT/SIGTERM
    Signal,
    /// Run deadline passed
    Deadline,
}

#[derive(Debug, Default)]
struct Inner {
    reason: Mutex<Option<CancelReason>>,
    wake: Condvar,
    deadline: Option<Instant>,
}

/// Shared cancellation flag with an optional deadline
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// A token that only trips when cancelled explicitly
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also trips at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            inner: Arc::new(Inner {
                deadline: Some(deadline),
                ..Inner::default()
            }),
        }
    }

    /// A token that trips `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    fn lock(&self) -> MutexGuard<'_, Option<CancelReason>> {
        self.inner.reason.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Trip the token. The first reason wins.
    pub fn cancel(&self, reason: CancelReason) {
        let mut guard = self.lock();
        if guard.is_none() {
            *guard = Some(reason);
        }
        drop(guard);
        self.inner.wake.notify_all();
    }

    fn deadline_passed(&self) -> bool {
        self.inner
            .deadline
            .map_or(false, |deadline| Instant::now() >= deadline)
    }

    /// Check if the token has tripped
    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// Reason the token tripped, if it has
    pub fn reason(&self) -> Option<CancelReason> {
        let explicit = *self.lock();
        explicit.or_else(|| self.deadline_passed().then_some(CancelReason::Deadline))
    }

    /// Deadline, if one was set
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Sleep for up to `timeout`, waking early if the token trips.
    ///
    /// Returns true if the token tripped before or during the wait.
    pub fn wait(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        let mut guard = self.lock();

        loop {
            if guard.is_some() || self.deadline_passed() {
                return true;
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return false;
            }

            let mut remaining = timeout - elapsed;
            if let Some(deadline) = self.inner.deadline {
                remaining = remaining.min(deadline.saturating_duration_since(Instant::now()));
            }

            guard = match self.inner.wake.wait_timeout(guard, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }
}
