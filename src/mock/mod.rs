//! Mock delivery and authoring surfaces
//!
//! In-process stand-ins used by unit and integration tests:
//!
//! - [`MockSurface`]: a [`crate::probe::Probe`] serving scripted status
//!   sequences per locator, with transport-failure injection
//! - [`MockPublisher`]: an [`crate::authoring::Authoring`] implementation
//!   that publishes into a `MockSurface` with configurable propagation lag

mod failure;
mod publisher;
mod surface;

pub use failure::{FailureConfig, FailureInjector};
pub use publisher::{MockPublisher, PropagationLag, LIVE_BODY};
pub use surface::{MockSurface, GONE_BODY, NOT_FOUND_BODY};
