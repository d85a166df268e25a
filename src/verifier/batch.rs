//! Concurrent removal checks across independent artefacts

use std::thread;

use pv_content::ResourceLocator;

use super::report::RemovalReport;
use super::{Verifier, VerifyError};
use crate::probe::Probe;

/// One artefact to verify as removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalTarget {
    pub parent: ResourceLocator,
    pub part_slugs: Vec<String>,
}

impl RemovalTarget {
    pub fn new(parent: ResourceLocator) -> Self {
        Self {
            parent,
            part_slugs: Vec::new(),
        }
    }

    pub fn with_parts<I, S>(mut self, slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.part_slugs.extend(slugs.into_iter().map(Into::into));
        self
    }
}

impl<P: Probe> Verifier<P> {
    /// Run `verify_removed` for every target, one scoped thread per target.
    ///
    /// Targets share only the probe and the cancel token. Results come back
    /// in target order.
    pub fn verify_batch(&self, targets: &[RemovalTarget]) -> Vec<Result<RemovalReport, VerifyError>> {
        thread::scope(|scope| {
            let handles: Vec<_> = targets
                .iter()
                .map(|target| scope.spawn(move || self.verify_removed(&target.parent, target.part_slugs.as_slice())))
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::{CancelReason, CancelToken};
    use crate::mock::{MockSurface, GONE_BODY};
    use crate::poller::{Backoff, PollConfig};
    use crate::probe::ProbeResponse;
    use crate::summary::Status;
    use crate::timeout::PollBudget;
    use crate::verifier::VerifierConfig;
    use std::time::Duration;

    fn verifier(surface: &MockSurface, max_attempts: u32) -> Verifier<&MockSurface> {
        Verifier::new(
            surface,
            VerifierConfig {
                poll: PollConfig {
                    budget: PollBudget::attempts(max_attempts),
                    backoff: Backoff::fixed(Duration::from_millis(1)),
                    ..PollConfig::default()
                },
                ..VerifierConfig::default()
            },
        )
    }

    fn retire(surface: &MockSurface, parent: &ResourceLocator, parts: &[&str]) {
        surface.script(parent, vec![ProbeResponse::status(200), ProbeResponse::new(410, GONE_BODY)]);
        for part in parts {
            surface.script_statuses(&parent.child(part).unwrap(), &[200, 404]);
        }
    }

    #[test]
    fn test_batch_results_in_target_order() {
        let surface = MockSurface::new();
        let a = ResourceLocator::parse("https://www.example.org/a").unwrap();
        let b = ResourceLocator::parse("https://www.example.org/b").unwrap();
        retire(&surface, &a, &["one", "two"]);
        surface.set_status(&b, 200);

        let targets = vec![
            RemovalTarget::new(a.clone()).with_parts(["one", "two"]),
            RemovalTarget::new(b.clone()).with_parts(["x"]),
        ];
        let results = verifier(&surface, 5).verify_batch(&targets);

        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().unwrap();
        assert!(first.is_success());
        assert_eq!(first.children.len(), 2);

        let second = results[1].as_ref().unwrap();
        assert_eq!(second.parent.locator(), &b);
        assert_eq!(second.parent.status(), Status::Failed);
        assert_eq!(second.children[0].status(), Status::Skipped);
    }

    #[test]
    fn test_batch_shares_cancellation() {
        let surface = MockSurface::new();
        let token = CancelToken::new();
        token.cancel(CancelReason::User);

        let targets: Vec<_> = (0..4)
            .map(|n| RemovalTarget::new(ResourceLocator::parse(&format!("https://www.example.org/{n}")).unwrap()))
            .collect();
        let results = verifier(&surface, 5).with_cancel(token).verify_batch(&targets);

        for result in results {
            assert_eq!(result.unwrap().parent.status(), Status::Cancelled);
        }
        assert!(surface.probe_log().is_empty());
    }

    #[test]
    fn test_empty_batch() {
        let surface = MockSurface::new();
        assert!(verifier(&surface, 1).verify_batch(&[]).is_empty());
    }
}
