//! Authoring-driven lifecycle scenario

use tracing::info;

use pv_content::{slugify, title_with_timestamp, ArtefactFormat, ResourceLocator};

use super::report::{CheckResult, RemovalReport};
use super::{tracked, Expected, Verifier, VerifyError};
use crate::authoring::Authoring;
use crate::probe::Probe;
use crate::state::ObservedLifecycle;

/// An artefact to create, publish and retire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleSpec {
    pub slug: String,
    pub title: String,
    pub format: ArtefactFormat,
    pub part_titles: Vec<String>,
}

impl LifecycleSpec {
    pub fn new(slug: impl Into<String>, title: impl Into<String>, format: ArtefactFormat) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            format,
            part_titles: Vec::new(),
        }
    }

    pub fn with_part(mut self, title: impl Into<String>) -> Self {
        self.part_titles.push(title.into());
        self
    }

    /// A guide with a title unique to this run and `parts` uniquely titled
    /// parts
    pub fn timestamped_guide(prefix: &str, parts: usize) -> Self {
        let title = title_with_timestamp(prefix);
        let mut spec = Self::new(slugify(&title), title, ArtefactFormat::Guide);
        for n in 1..=parts {
            spec = spec.with_part(title_with_timestamp(&format!("Part {}", n)));
        }
        spec
    }
}

/// Everything observed during one lifecycle scenario
#[derive(Debug, Clone)]
pub struct LifecycleReport {
    pub slug: String,
    pub published: ResourceLocator,
    /// Part slugs as returned by the authoring surface
    pub part_slugs: Vec<String>,
    pub live: CheckResult,
    /// None when the artefact never went live, so was not unpublished
    pub removal: Option<RemovalReport>,
}

impl LifecycleReport {
    pub fn is_success(&self) -> bool {
        self.live.is_passed() && self.removal.as_ref().map_or(false, RemovalReport::is_success)
    }

    /// Every check in the order it ran
    pub fn results(&self) -> Vec<&CheckResult> {
        let mut results = vec![&self.live];
        if let Some(removal) = &self.removal {
            results.extend(removal.results());
        }
        results
    }
}

impl<P: Probe> Verifier<P> {
    /// Create, publish and unpublish an artefact through `authoring`,
    /// verifying each externally visible step.
    ///
    /// Authoring failures abort the scenario with an error. Check failures
    /// are reported in the returned [`LifecycleReport`].
    pub fn verify_lifecycle<A: Authoring + ?Sized>(
        &self,
        authoring: &A,
        spec: &LifecycleSpec,
    ) -> Result<LifecycleReport, VerifyError> {
        authoring.create_artefact(&spec.slug, &spec.title, spec.format.clone())?;
        let part_slugs = spec
            .part_titles
            .iter()
            .map(|title| authoring.add_part(&spec.slug, title))
            .collect::<Result<Vec<_>, _>>()?;

        let published = authoring.publish(&spec.slug)?;
        info!(slug = %spec.slug, %published, parts = part_slugs.len(), "published artefact");

        let children = part_slugs
            .iter()
            .map(|slug| published.child(slug))
            .collect::<Result<Vec<_>, _>>()?;
        let mut lifecycle = ObservedLifecycle::new(published.clone(), children);

        let live_check = tracked(self.wait_for_live(&published), |observed| {
            lifecycle.record_parent(observed)
        });
        let live = CheckResult::from_check(&published, Expected::Live, live_check);

        let removal = if live.is_passed() {
            let retired = authoring.unpublish_without_redirect(&spec.slug)?;
            info!(slug = %spec.slug, children = retired.children.len(), "unpublished artefact");
            Some(self.verify_retired_tracked(&retired, lifecycle))
        } else {
            None
        };

        Ok(LifecycleReport {
            slug: spec.slug.clone(),
            published,
            part_slugs,
            live,
            removal,
        })
    }
}
