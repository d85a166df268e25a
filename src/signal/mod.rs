//! Signal handling for graceful shutdown (SIGINT/SIGTERM)
//!
//! On the first SIGINT or SIGTERM the run's cancel token is tripped with
//! reason=SIGNAL: any sleeping poll wakes, no further probes are issued, and
//! the run reports CANCELLED with exit code 80.
//!
//! On a second signal the process exits immediately with the same code.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::cancel::{CancelReason, CancelToken};

/// Exit code for cancelled runs
pub const EXIT_CODE_CANCELLED: i32 = 80;

/// Action to take after receiving a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// First signal: cancel the run gracefully
    InitiateCancellation,
    /// Second signal: exit immediately
    ImmediateExit,
    /// Third+ signal: ignore
    Ignore,
}

/// Signal handler state
#[derive(Debug)]
pub struct SignalState {
    signal_count: AtomicU8,
    token: CancelToken,
}

impl SignalState {
    /// Track signals for the run guarded by `token`
    pub fn new(token: CancelToken) -> Self {
        Self {
            signal_count: AtomicU8::new(0),
            token,
        }
    }

    /// Number of signals received
    pub fn signal_count(&self) -> u8 {
        self.signal_count.load(Ordering::SeqCst)
    }

    /// The token this state trips
    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Handle a signal and return the action to take
    pub fn handle_signal(&self) -> SignalAction {
        let count = self.signal_count.fetch_add(1, Ordering::SeqCst);

        match count {
            0 => {
                self.token.cancel(CancelReason::Signal);
                SignalAction::InitiateCancellation
            }
            1 => SignalAction::ImmediateExit,
            _ => SignalAction::Ignore,
        }
    }
}

/// Installs the process-wide ctrlc handler
pub struct SignalHandler {
    state: Arc<SignalState>,
}

impl SignalHandler {
    pub fn new(token: CancelToken) -> Self {
        Self {
            state: Arc::new(SignalState::new(token)),
        }
    }

    pub fn state(&self) -> Arc<SignalState> {
        Arc::clone(&self.state)
    }

    /// Install the SIGINT/SIGTERM handler.
    ///
    /// Must be called at most once per process.
    pub fn install(&self) -> Result<(), ctrlc::Error> {
        let state = Arc::clone(&self.state);
        ctrlc::set_handler(move || match state.handle_signal() {
            SignalAction::InitiateCancellation => {
                tracing::warn!("received interrupt, cancelling verification run");
            }
            SignalAction::ImmediateExit => {
                tracing::warn!("received second interrupt, exiting immediately");
                std::process::exit(EXIT_CODE_CANCELLED);
            }
            SignalAction::Ignore => {}
        })
    }
}
