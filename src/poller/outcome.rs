//! Transient sets, poll outcomes and poll reports

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use pv_content::ResourceLocator;

use crate::probe::TransportError;
use crate::timeout::BudgetStatus;

/// A status code outside 100..=599
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid status code {0:?}")]
pub struct InvalidStatusCode(pub String);

/// Status codes that mean "not settled yet" for one check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransientSet(BTreeSet<u16>);

impl TransientSet {
    /// An empty set: every status settles
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(codes: &[u16]) -> Self {
        codes.iter().copied().collect()
    }

    pub fn contains(&self, status: u16) -> bool {
        self.0.contains(&status)
    }

    pub fn insert(&mut self, status: u16) -> bool {
        self.0.insert(status)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Codes in ascending order
    pub fn to_vec(&self) -> Vec<u16> {
        self.0.iter().copied().collect()
    }
}

impl FromIterator<u16> for TransientSet {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for TransientSet {
    type Err = InvalidStatusCode;

    /// Parse a comma-separated list such as `"200,503"`. Empty input gives
    /// an empty set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| match part.parse::<u16>() {
                Ok(code) if (100..=599).contains(&code) => Ok(code),
                _ => Err(InvalidStatusCode(part.to_string())),
            })
            .collect()
    }
}

impl fmt::Display for TransientSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<String> = self.0.iter().map(u16::to_string).collect();
        write!(f, "{{{}}}", codes.join(","))
    }
}

/// Final outcome of one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum PollOutcome {
    /// A status outside the transient set was observed
    Settled(u16),
    /// The budget ran out before anything settled
    TimedOut,
    /// The run's cancel token tripped
    Cancelled,
}

impl PollOutcome {
    pub fn is_settled(&self) -> bool {
        matches!(self, PollOutcome::Settled(_))
    }

    pub fn settled_status(&self) -> Option<u16> {
        match self {
            PollOutcome::Settled(status) => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollOutcome::Settled(status) => write!(f, "settled({})", status),
            PollOutcome::TimedOut => f.write_str("timed_out"),
            PollOutcome::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Everything observed during one poll
#[derive(Debug, Clone)]
pub struct PollReport {
    /// Locator that was polled
    pub locator: ResourceLocator,
    /// How the poll ended
    pub outcome: PollOutcome,
    /// Probes issued
    pub attempts: u32,
    /// Wall-clock time spent
    pub elapsed: Duration,
    /// Every status seen, in order (failed probes contribute nothing)
    pub observed: Vec<u16>,
    /// Probes that failed at the transport level
    pub transport_failures: u32,
    /// Most recent transport failure
    pub last_error: Option<TransportError>,
    /// Which bound ended the poll, for `TimedOut`
    pub exhausted: Option<BudgetStatus>,
    /// Body of the settling response
    pub body: Option<String>,
}

impl PollReport {
    pub(crate) fn new(locator: ResourceLocator) -> Self {
        Self {
            locator,
            outcome: PollOutcome::TimedOut,
            attempts: 0,
            elapsed: Duration::ZERO,
            observed: Vec::new(),
            transport_failures: 0,
            last_error: None,
            exhausted: None,
            body: None,
        }
    }

    /// Last status seen, if any probe got a response
    pub fn last_status(&self) -> Option<u16> {
        self.observed.last().copied()
    }

    /// True when no probe ever got a response
    pub fn never_reached(&self) -> bool {
        self.observed.is_empty() && self.transport_failures > 0
    }
}
