//! Authoring surface
//!
//! The verifier never mutates content through a probe. Scenarios that need
//! to create, publish or unpublish an artefact go through this trait, which
//! a real deployment implements against its publishing backend and tests
//! implement with [`crate::mock::MockPublisher`].

use pv_content::{ArtefactFormat, ContentError, ResourceLocator, RetiredLocators};

/// Mutating operations on the authoring surface.
///
/// Artefacts are identified by slug.
pub trait Authoring {
    /// Create a DRAFT artefact
    fn create_artefact(&self, slug: &str, title: &str, format: ArtefactFormat) -> Result<(), AuthoringError>;

    /// Add a part to a DRAFT artefact; returns the part slug
    fn add_part(&self, slug: &str, title: &str) -> Result<String, AuthoringError>;

    /// Publish; returns the locator the artefact will be served at
    fn publish(&self, slug: &str) -> Result<ResourceLocator, AuthoringError>;

    /// Unpublish without a redirect; returns every locator that must stop
    /// serving content
    fn unpublish_without_redirect(&self, slug: &str) -> Result<RetiredLocators, AuthoringError>;
}

impl<A: Authoring + ?Sized> Authoring for &A {
    fn create_artefact(&self, slug: &str, title: &str, format: ArtefactFormat) -> Result<(), AuthoringError> {
        (**self).create_artefact(slug, title, format)
    }

    fn add_part(&self, slug: &str, title: &str) -> Result<String, AuthoringError> {
        (**self).add_part(slug, title)
    }

    fn publish(&self, slug: &str) -> Result<ResourceLocator, AuthoringError> {
        (**self).publish(slug)
    }

    fn unpublish_without_redirect(&self, slug: &str) -> Result<RetiredLocators, AuthoringError> {
        (**self).unpublish_without_redirect(slug)
    }
}

/// Authoring errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthoringError {
    #[error("Artefact {0:?} already exists")]
    AlreadyExists(String),

    #[error("Artefact {0:?} not found")]
    NotFound(String),

    #[error("Authoring surface rejected {operation}: {message}")]
    Rejected { operation: String, message: String },

    #[error(transparent)]
    Content(#[from] ContentError),
}
