//! Per-locator observed states

use serde::{Deserialize, Serialize};

use pv_content::ResourceLocator;

use super::TerminalState;

/// What a locator has last been seen serving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObservedState {
    /// Nothing conclusive observed yet
    Unknown,
    /// Serving content (200)
    Live,
    /// Explicitly retired (410)
    Gone,
    /// Not served (404)
    NotFound,
}

impl TerminalState for ObservedState {
    fn is_terminal(&self) -> bool {
        matches!(self, ObservedState::Gone | ObservedState::NotFound)
    }
}

/// Position of a locator in an artefact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocatorRole {
    Parent,
    Child,
}

impl LocatorRole {
    /// Map a status to a state for this role.
    ///
    /// Statuses that say nothing about the lifecycle (5xx, a parent 404
    /// before first propagation) map to None.
    pub fn state_for(&self, status: u16) -> Option<ObservedState> {
        match (self, status) {
            (_, 200) => Some(ObservedState::Live),
            (LocatorRole::Parent, 410) => Some(ObservedState::Gone),
            (LocatorRole::Child, 404) => Some(ObservedState::NotFound),
            _ => None,
        }
    }

    /// Check if transition between observed states is valid for this role
    pub fn can_transition(&self, from: ObservedState, to: ObservedState) -> bool {
        match (self, from, to) {
            (LocatorRole::Parent, ObservedState::Unknown, ObservedState::Live) => true,
            (LocatorRole::Parent, ObservedState::Unknown, ObservedState::Gone) => true,
            (LocatorRole::Parent, ObservedState::Live, ObservedState::Gone) => true,

            (LocatorRole::Child, ObservedState::Unknown, ObservedState::Live) => true,
            (LocatorRole::Child, ObservedState::Unknown, ObservedState::NotFound) => true,
            (LocatorRole::Child, ObservedState::Live, ObservedState::NotFound) => true,

            _ => false,
        }
    }
}

/// Observed-state errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("{locator} regressed from {from:?} to {to:?}")]
    Regression {
        locator: ResourceLocator,
        from: ObservedState,
        to: ObservedState,
    },

    #[error("child {child} checked before parent {parent} was observed GONE (parent is {parent_state:?})")]
    ParentNotGone {
        parent: ResourceLocator,
        parent_state: ObservedState,
        child: ResourceLocator,
    },

    #[error("{0} is not a child of this artefact")]
    UnknownChild(ResourceLocator),
}

/// One locator's observed state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedLocator {
    pub locator: ResourceLocator,
    pub role: LocatorRole,
    state: ObservedState,
}

impl ObservedLocator {
    pub fn new(locator: ResourceLocator, role: LocatorRole) -> Self {
        Self {
            locator,
            role,
            state: ObservedState::Unknown,
        }
    }

    pub fn state(&self) -> ObservedState {
        self.state
    }

    /// Fold one observed status into the state.
    ///
    /// Re-observing the current state is a no-op, so repeated checks are
    /// idempotent.
    pub fn observe(&mut self, status: u16) -> Result<ObservedState, StateError> {
        let Some(next) = self.role.state_for(status) else {
            return Ok(self.state);
        };
        if next == self.state {
            return Ok(self.state);
        }
        if !self.role.can_transition(self.state, next) {
            return Err(StateError::Regression {
                locator: self.locator.clone(),
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(next)
    }

    /// Fold a sequence of statuses in order
    pub fn observe_all(&mut self, statuses: &[u16]) -> Result<ObservedState, StateError> {
        for status in statuses {
            self.observe(*status)?;
        }
        Ok(self.state)
    }
}

/// Observed states of an artefact's parent and children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedLifecycle {
    parent: ObservedLocator,
    children: Vec<ObservedLocator>,
}

impl ObservedLifecycle {
    pub fn new(parent: ResourceLocator, children: impl IntoIterator<Item = ResourceLocator>) -> Self {
        Self {
            parent: ObservedLocator::new(parent, LocatorRole::Parent),
            children: children
                .into_iter()
                .map(|child| ObservedLocator::new(child, LocatorRole::Child))
                .collect(),
        }
    }

    pub fn parent(&self) -> &ObservedLocator {
        &self.parent
    }

    pub fn children(&self) -> &[ObservedLocator] {
        &self.children
    }

    pub fn record_parent(&mut self, statuses: &[u16]) -> Result<ObservedState, StateError> {
        self.parent.observe_all(statuses)
    }

    /// Fail unless the parent has been observed GONE
    pub fn ensure_parent_gone(&self, child: &ResourceLocator) -> Result<(), StateError> {
        if self.parent.state() == ObservedState::Gone {
            return Ok(());
        }
        Err(StateError::ParentNotGone {
            parent: self.parent.locator.clone(),
            parent_state: self.parent.state(),
            child: child.clone(),
        })
    }

    /// Record statuses for a child.
    ///
    /// A child may only reach NOT_FOUND once the parent is GONE.
    pub fn record_child(&mut self, child: &ResourceLocator, statuses: &[u16]) -> Result<ObservedState, StateError> {
        let parent_gone = self.parent.state() == ObservedState::Gone;
        let parent = self.parent.locator.clone();
        let parent_state = self.parent.state();

        let entry = self
            .children
            .iter_mut()
            .find(|c| &c.locator == child)
            .ok_or_else(|| StateError::UnknownChild(child.clone()))?;

        if !parent_gone && statuses.iter().any(|s| entry.role.state_for(*s) == Some(ObservedState::NotFound)) {
            return Err(StateError::ParentNotGone {
                parent,
                parent_state,
                child: child.clone(),
            });
        }
        entry.observe_all(statuses)
    }

    /// True once the parent is GONE and every child is NOT_FOUND
    pub fn is_fully_retired(&self) -> bool {
        self.parent.state() == ObservedState::Gone
            && self
                .children
                .iter()
                .all(|c| c.state() == ObservedState::NotFound)
    }
}
