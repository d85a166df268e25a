//! In-process authoring surface wired to a [`MockSurface`]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use pv_content::{Artefact, ArtefactFormat, ResourceLocator, RetiredLocators};

use super::surface::{MockSurface, GONE_BODY};
use crate::authoring::{Authoring, AuthoringError};
use crate::probe::ProbeResponse;

/// Body served by live artefacts
pub const LIVE_BODY: &str = "<html><body>Published content</body></html>";

/// Number of probes that still see the previous state after a change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationLag {
    pub parent: u32,
    pub children: u32,
}

impl PropagationLag {
    pub fn new(parent: u32, children: u32) -> Self {
        Self { parent, children }
    }
}

/// Authoring surface that publishes into a [`MockSurface`] with a
/// configurable propagation lag
pub struct MockPublisher {
    surface: Arc<MockSurface>,
    base: ResourceLocator,
    lag: PropagationLag,
    artefacts: Mutex<HashMap<String, Artefact>>,
    reject: Mutex<Option<String>>,
}

impl MockPublisher {
    pub fn new(surface: Arc<MockSurface>, base: ResourceLocator) -> Self {
        Self {
            surface,
            base,
            lag: PropagationLag::default(),
            artefacts: Mutex::new(HashMap::new()),
            reject: Mutex::new(None),
        }
    }

    pub fn with_lag(mut self, lag: PropagationLag) -> Self {
        self.lag = lag;
        self
    }

    /// Make the next call to `operation` fail
    pub fn reject_next(&self, operation: &str) {
        *self.reject.lock().unwrap_or_else(|e| e.into_inner()) = Some(operation.to_string());
    }

    pub fn artefact(&self, slug: &str) -> Option<Artefact> {
        self.artefacts().get(slug).cloned()
    }

    fn artefacts(&self) -> MutexGuard<'_, HashMap<String, Artefact>> {
        self.artefacts.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_rejected(&self, operation: &str) -> Result<(), AuthoringError> {
        let mut reject = self.reject.lock().unwrap_or_else(|e| e.into_inner());
        if reject.as_deref() == Some(operation) {
            *reject = None;
            return Err(AuthoringError::Rejected {
                operation: operation.to_string(),
                message: "injected rejection".to_string(),
            });
        }
        Ok(())
    }
}

impl Authoring for MockPublisher {
    fn create_artefact(&self, slug: &str, title: &str, format: ArtefactFormat) -> Result<(), AuthoringError> {
        self.check_rejected("create_artefact")?;
        let mut artefacts = self.artefacts();
        if artefacts.contains_key(slug) {
            return Err(AuthoringError::AlreadyExists(slug.to_string()));
        }
        let artefact = Artefact::new(slug, title, format)?;
        artefacts.insert(slug.to_string(), artefact);
        Ok(())
    }

    fn add_part(&self, slug: &str, title: &str) -> Result<String, AuthoringError> {
        self.check_rejected("add_part")?;
        let mut artefacts = self.artefacts();
        let artefact = artefacts
            .get_mut(slug)
            .ok_or_else(|| AuthoringError::NotFound(slug.to_string()))?;
        Ok(artefact.add_part(title)?)
    }

    fn publish(&self, slug: &str) -> Result<ResourceLocator, AuthoringError> {
        self.check_rejected("publish")?;
        let mut artefacts = self.artefacts();
        let artefact = artefacts
            .get_mut(slug)
            .ok_or_else(|| AuthoringError::NotFound(slug.to_string()))?;

        let url = self.base.child(slug).map_err(pv_content::ContentError::from)?;
        artefact.publish(url.clone())?;

        self.surface
            .transition(&url, self.lag.parent, ProbeResponse::new(200, LIVE_BODY));
        for child in artefact.part_locators()? {
            self.surface
                .transition(&child, self.lag.children, ProbeResponse::new(200, LIVE_BODY));
        }
        Ok(url)
    }

    fn unpublish_without_redirect(&self, slug: &str) -> Result<RetiredLocators, AuthoringError> {
        self.check_rejected("unpublish_without_redirect")?;
        let mut artefacts = self.artefacts();
        let artefact = artefacts
            .get_mut(slug)
            .ok_or_else(|| AuthoringError::NotFound(slug.to_string()))?;

        let retired = artefact.unpublish_without_redirect()?;
        self.surface
            .transition(&retired.parent, self.lag.parent, ProbeResponse::new(410, GONE_BODY));
        for child in &retired.children {
            self.surface
                .transition(child, self.lag.children, ProbeResponse::status(404));
        }
        Ok(retired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::Probe;
    use pv_content::{ArtefactState, ContentError};

    fn publisher(lag: PropagationLag) -> (Arc<MockSurface>, MockPublisher) {
        let surface = Arc::new(MockSurface::new());
        let base = ResourceLocator::parse("https://www.example.org/").unwrap();
        let publisher = MockPublisher::new(Arc::clone(&surface), base).with_lag(lag);
        (surface, publisher)
    }

    #[test]
    fn test_publish_makes_parent_and_parts_live() {
        let (surface, publisher) = publisher(PropagationLag::default());
        publisher.create_artefact("my-guide", "My guide", ArtefactFormat::Guide).unwrap();
        let part = publisher.add_part("my-guide", "Part one").unwrap();
        assert_eq!(part, "part-one");

        let url = publisher.publish("my-guide").unwrap();
        assert_eq!(url.as_str(), "https://www.example.org/my-guide");
        assert_eq!(surface.probe(&url).unwrap().status, 200);
        assert_eq!(surface.probe(&url.child("part-one").unwrap()).unwrap().status, 200);
    }

    #[test]
    fn test_publish_lag_serves_not_found_first() {
        let (surface, publisher) = publisher(PropagationLag::new(2, 0));
        publisher.create_artefact("lagged", "Lagged", ArtefactFormat::Answer).unwrap();
        let url = publisher.publish("lagged").unwrap();

        let seen: Vec<u16> = (0..3).map(|_| surface.probe(&url).unwrap().status).collect();
        assert_eq!(seen, vec![404, 404, 200]);
    }

    #[test]
    fn test_unpublish_retires_parent_and_children() {
        let (surface, publisher) = publisher(PropagationLag::default());
        publisher.create_artefact("g", "G", ArtefactFormat::Guide).unwrap();
        publisher.add_part("g", "One").unwrap();
        publisher.add_part("g", "Two").unwrap();
        publisher.publish("g").unwrap();

        let retired = publisher.unpublish_without_redirect("g").unwrap();
        assert_eq!(retired.children.len(), 2);

        let parent = surface.probe(&retired.parent).unwrap();
        assert_eq!(parent.status, 410);
        assert!(parent.body.contains("gone"));
        assert_eq!(surface.probe(&retired.children[1]).unwrap().status, 404);
        assert_eq!(publisher.artefact("g").unwrap().state(), ArtefactState::Unpublished);
    }

    #[test]
    fn test_unknown_and_duplicate_artefacts() {
        let (_, publisher) = publisher(PropagationLag::default());
        assert_eq!(
            publisher.publish("nope"),
            Err(AuthoringError::NotFound("nope".into()))
        );
        publisher.create_artefact("dup", "Dup", ArtefactFormat::Guide).unwrap();
        assert_eq!(
            publisher.create_artefact("dup", "Dup", ArtefactFormat::Guide),
            Err(AuthoringError::AlreadyExists("dup".into()))
        );
    }

    #[test]
    fn test_unpublish_draft_is_invalid_transition() {
        let (_, publisher) = publisher(PropagationLag::default());
        publisher.create_artefact("draft", "Draft", ArtefactFormat::Guide).unwrap();
        assert!(matches!(
            publisher.unpublish_without_redirect("draft"),
            Err(AuthoringError::Content(ContentError::InvalidTransition { .. }))
        ));
    }

    #[test]
    fn test_reject_next_applies_once() {
        let (_, publisher) = publisher(PropagationLag::default());
        publisher.reject_next("create_artefact");
        assert!(matches!(
            publisher.create_artefact("x", "X", ArtefactFormat::Guide),
            Err(AuthoringError::Rejected { .. })
        ));
        assert!(publisher.create_artefact("x", "X", ArtefactFormat::Guide).is_ok());
    }
}
