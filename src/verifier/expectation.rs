//! What a check expects a locator to settle on

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::poller::TransientSet;

/// Expected settled state of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expected {
    /// 200
    Live,
    /// 410
    Gone,
    /// 404
    NotFound,
    /// An explicit status code
    Status(u16),
    /// Anything outside the transient set
    AnySettled,
}

impl Expected {
    /// The exact status expected, if there is one
    pub fn status(&self) -> Option<u16> {
        match self {
            Expected::Live => Some(200),
            Expected::Gone => Some(410),
            Expected::NotFound => Some(404),
            Expected::Status(status) => Some(*status),
            Expected::AnySettled => None,
        }
    }

    pub fn matches(&self, status: u16) -> bool {
        self.status().map_or(true, |expected| expected == status)
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Live => f.write_str("live (200)"),
            Expected::Gone => f.write_str("gone (410)"),
            Expected::NotFound => f.write_str("not found (404)"),
            Expected::Status(status) => write!(f, "status {}", status),
            Expected::AnySettled => f.write_str("any settled status"),
        }
    }
}

/// A fully specified check: the expected state, the statuses that mean
/// "keep waiting", and an optional marker the settling body must contain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    pub expected: Expected,
    pub transient: TransientSet,
    /// Case-insensitive substring of the settling body; empty or None skips
    /// the body check
    pub body_marker: Option<String>,
}

impl Expectation {
    pub fn new(expected: Expected, transient: TransientSet) -> Self {
        Self {
            expected,
            transient,
            body_marker: None,
        }
    }

    pub fn with_body_marker(mut self, marker: impl Into<String>) -> Self {
        self.body_marker = Some(marker.into());
        self
    }

    /// The marker to check, if the body check is enabled
    pub fn marker(&self) -> Option<&str> {
        self.body_marker.as_deref().filter(|marker| !marker.is_empty())
    }

    /// True when `body` contains the marker, or no marker is set
    pub fn body_matches(&self, body: &str) -> bool {
        match self.marker() {
            Some(marker) => body.to_lowercase().contains(&marker.to_lowercase()),
            None => true,
        }
    }
}
