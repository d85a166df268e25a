//! Observed lifecycle state machine
//!
//! Tracks what the delivery surface has been seen serving for a parent
//! locator and its children:
//! - Parent: UNKNOWN → LIVE → GONE
//! - Child: UNKNOWN → LIVE → NOT_FOUND, and only once the parent is GONE
//!
//! The state is observational. It never drives the surface; it rejects
//! checks that would run out of order and observations that would move a
//! locator out of a terminal state.

mod observed;

pub use observed::{LocatorRole, ObservedLifecycle, ObservedLocator, ObservedState, StateError};

/// Check if a state is terminal (no further transitions possible)
pub trait TerminalState {
    fn is_terminal(&self) -> bool;
}
