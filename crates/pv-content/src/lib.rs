//! Content lifecycle model.
//!
//! An artefact is created in draft, gains parts (subpages) while in draft,
//! is published to a public locator and may later be unpublished without a
//! redirect. Parts have no lifecycle of their own: their locators are derived
//! from the parent's published locator and retire with it.

mod artefact;
mod locator;
mod slug;

pub use artefact::{Artefact, ArtefactFormat, ArtefactState, ContentError, Part, RetiredLocators};
pub use locator::{LocatorError, ResourceLocator};
pub use slug::{is_valid_slug, slug_with_timestamp, slugify, title_with_timestamp};
