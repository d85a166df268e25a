//! Artefact state machine
//!
//! Artefact states: DRAFT → PUBLISHED → UNPUBLISHED

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::locator::{LocatorError, ResourceLocator};
use crate::slug::{is_valid_slug, slugify};

/// Artefact lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtefactState {
    /// Editable, not visible on the delivery surface
    Draft,
    /// Visible at its published locator
    Published,
    /// Removed from the delivery surface without a redirect
    Unpublished,
}

impl ArtefactState {
    /// Check if transition from this state to target is valid
    pub fn can_transition_to(&self, target: ArtefactState) -> bool {
        matches!(
            (self, target),
            (ArtefactState::Draft, ArtefactState::Published)
                | (ArtefactState::Published, ArtefactState::Unpublished)
        )
    }

    /// No transition leaves a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, ArtefactState::Unpublished)
    }
}

/// Content format of an artefact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtefactFormat {
    Guide,
    Answer,
    Transaction,
    SimpleSmartAnswer,
    Place,
    Other(String),
}

impl ArtefactFormat {
    /// Only multi-page formats carry parts
    pub fn supports_parts(&self) -> bool {
        matches!(self, ArtefactFormat::Guide)
    }
}

/// A subpage of an artefact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub slug: String,
    pub title: String,
}

/// Locators retired by an unpublish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetiredLocators {
    /// The artefact's former published locator
    pub parent: ResourceLocator,
    /// Derived part locators, in part order
    pub children: Vec<ResourceLocator>,
}

/// Errors for artefact operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("Invalid slug {0:?}")]
    InvalidSlug(String),

    #[error("Title must not be empty")]
    EmptyTitle,

    #[error("Invalid state transition from {from:?} to {to:?}")]
    InvalidTransition { from: ArtefactState, to: ArtefactState },

    #[error("Parts can only be added to a draft artefact (state is {0:?})")]
    NotDraft(ArtefactState),

    #[error("Format {0:?} does not support parts")]
    PartsUnsupported(ArtefactFormat),

    #[error("Duplicate part slug {0:?}")]
    DuplicatePart(String),

    #[error("Artefact {0:?} has never been published")]
    NeverPublished(String),

    #[error("Locator error: {0}")]
    Locator(#[from] LocatorError),
}

/// A unit of content and its parts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artefact {
    pub slug: String,
    pub title: String,
    pub format: ArtefactFormat,
    parts: Vec<Part>,
    state: ArtefactState,
    published_url: Option<ResourceLocator>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Artefact {
    /// Create a new artefact in DRAFT state
    pub fn new(slug: impl Into<String>, title: impl Into<String>, format: ArtefactFormat) -> Result<Self, ContentError> {
        let slug = slug.into();
        let title = title.into();
        if !is_valid_slug(&slug) {
            return Err(ContentError::InvalidSlug(slug));
        }
        if title.trim().is_empty() {
            return Err(ContentError::EmptyTitle);
        }
        let now = Utc::now();
        Ok(Self {
            slug,
            title,
            format,
            parts: Vec::new(),
            state: ArtefactState::Draft,
            published_url: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn state(&self) -> ArtefactState {
        self.state
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Append a part whose slug is derived from its title.
    ///
    /// Returns the new part's slug.
    pub fn add_part(&mut self, title: impl Into<String>) -> Result<String, ContentError> {
        let title = title.into();
        let slug = slugify(&title);
        self.add_part_with_slug(title, slug)
    }

    /// Append a part with an explicit slug
    pub fn add_part_with_slug(
        &mut self,
        title: impl Into<String>,
        slug: impl Into<String>,
    ) -> Result<String, ContentError> {
        let title = title.into();
        let slug = slug.into();

        if self.state != ArtefactState::Draft {
            return Err(ContentError::NotDraft(self.state));
        }
        if !self.format.supports_parts() {
            return Err(ContentError::PartsUnsupported(self.format.clone()));
        }
        if title.trim().is_empty() {
            return Err(ContentError::EmptyTitle);
        }
        if !is_valid_slug(&slug) {
            return Err(ContentError::InvalidSlug(slug));
        }
        if self.parts.iter().any(|p| p.slug == slug) {
            return Err(ContentError::DuplicatePart(slug));
        }

        self.parts.push(Part { slug: slug.clone(), title });
        self.updated_at = Utc::now();
        Ok(slug)
    }

    fn check_transition(&self, target: ArtefactState) -> Result<(), ContentError> {
        if !self.state.can_transition_to(target) {
            return Err(ContentError::InvalidTransition {
                from: self.state,
                to: target,
            });
        }
        Ok(())
    }

    fn transition(&mut self, target: ArtefactState) -> Result<(), ContentError> {
        self.check_transition(target)?;
        self.state = target;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Publish at `url` (DRAFT → PUBLISHED)
    pub fn publish(&mut self, url: ResourceLocator) -> Result<(), ContentError> {
        self.transition(ArtefactState::Published)?;
        self.published_url = Some(url);
        Ok(())
    }

    /// Unpublish without a redirect (PUBLISHED → UNPUBLISHED).
    ///
    /// Returns the parent and part locators that must stop serving content.
    /// The state only changes once those locators have been derived.
    pub fn unpublish_without_redirect(&mut self) -> Result<RetiredLocators, ContentError> {
        self.check_transition(ArtefactState::Unpublished)?;
        let retired = self.retired_locators()?;
        self.transition(ArtefactState::Unpublished)?;
        Ok(retired)
    }

    /// Locator the artefact is (or was last) published at
    pub fn published_url(&self) -> Option<&ResourceLocator> {
        self.published_url.as_ref()
    }

    /// Locator currently serving this artefact, only while PUBLISHED
    pub fn live_url(&self) -> Option<&ResourceLocator> {
        match self.state {
            ArtefactState::Published => self.published_url.as_ref(),
            _ => None,
        }
    }

    /// Derived locator of one part
    pub fn part_locator(&self, part_slug: &str) -> Result<ResourceLocator, ContentError> {
        let parent = self
            .published_url
            .as_ref()
            .ok_or_else(|| ContentError::NeverPublished(self.slug.clone()))?;
        Ok(parent.child(part_slug)?)
    }

    /// Derived locators of every part, in part order
    pub fn part_locators(&self) -> Result<Vec<ResourceLocator>, ContentError> {
        self.parts.iter().map(|p| self.part_locator(&p.slug)).collect()
    }

    fn retired_locators(&self) -> Result<RetiredLocators, ContentError> {
        let parent = self
            .published_url
            .clone()
            .ok_or_else(|| ContentError::NeverPublished(self.slug.clone()))?;
        Ok(RetiredLocators {
            children: self.part_locators()?,
            parent,
        })
    }
}
