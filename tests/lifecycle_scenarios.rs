//! Content Lifecycle Verification Tests
//!
//! End-to-end scenarios through the authoring interface and the verifier:
//! publish then unpublish without redirect, parent-before-child ordering,
//! idempotent re-checks and concurrent batches.

use std::sync::Arc;
use std::time::Duration;

use propagation_verifier::cancel::{CancelReason, CancelToken};
use propagation_verifier::mock::{FailureConfig, MockPublisher, MockSurface, PropagationLag, GONE_BODY};
use propagation_verifier::state::ObservedState;
use propagation_verifier::verifier::LifecycleSpec;
use propagation_verifier::{
    ArtefactFormat, Authoring, Backoff, CheckResult, Expected, FailureKind, PollBudget, PollConfig, PollOutcome,
    ProbeResponse, RemovalTarget, ResourceLocator, Status, TransportError, Verifier, VerifierConfig, VerifyError,
};

fn base() -> ResourceLocator {
    ResourceLocator::parse("https://www.example.org/").unwrap()
}

fn fast_config(max_attempts: u32) -> VerifierConfig {
    VerifierConfig {
        poll: PollConfig {
            budget: PollBudget::attempts(max_attempts),
            backoff: Backoff::fixed(Duration::ZERO),
            ..PollConfig::default()
        },
        ..VerifierConfig::default()
    }
}

fn setup(lag: PropagationLag, max_attempts: u32) -> (Arc<MockSurface>, MockPublisher, Verifier<Arc<MockSurface>>) {
    let surface = Arc::new(MockSurface::new());
    let publisher = MockPublisher::new(Arc::clone(&surface), base()).with_lag(lag);
    let verifier = Verifier::new(Arc::clone(&surface), fast_config(max_attempts));
    (surface, publisher, verifier)
}

// =============================================================================
// Test 1: Artefact with one part, unpublished without redirect
// =============================================================================

#[test]
fn test_unpublished_guide_and_part_are_retired() {
    let (surface, publisher, verifier) = setup(PropagationLag::new(3, 2), 20);

    publisher
        .create_artefact("childcare-guide", "Childcare guide", ArtefactFormat::Guide)
        .unwrap();
    let part_slug = publisher.add_part("childcare-guide", "Eligibility").unwrap();
    let published = publisher.publish("childcare-guide").unwrap();
    assert_eq!(published.as_str(), "https://www.example.org/childcare-guide");

    let live = verifier.wait_for_live(&published).unwrap();
    assert_eq!(live.outcome(), PollOutcome::Settled(200));

    let retired = publisher.unpublish_without_redirect("childcare-guide").unwrap();
    assert_eq!(retired.children, vec![published.child(&part_slug).unwrap()]);

    let removal = verifier.verify_retired(&retired);
    assert!(removal.is_success(), "{removal:?}");
    assert_eq!(removal.parent.report().unwrap().outcome(), PollOutcome::Settled(410));
    assert_eq!(
        removal.children[0].report().unwrap().outcome(),
        PollOutcome::Settled(404)
    );
    assert!(removal.lifecycle.is_fully_retired());

    // The parent was probed lag + 1 times after unpublish, before any child
    let log = surface.probe_log();
    let first_child = log
        .iter()
        .position(|probed| probed.ends_with("/eligibility"))
        .unwrap();
    assert!(log[..first_child]
        .iter()
        .rev()
        .take(4)
        .all(|probed| probed == published.as_str()));
}

#[test]
fn test_verify_lifecycle_end_to_end() {
    let (_, publisher, verifier) = setup(PropagationLag::new(1, 1), 10);
    let spec = LifecycleSpec::timestamped_guide("Propagation check", 2);

    let report = verifier.verify_lifecycle(&publisher, &spec).unwrap();

    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.part_slugs.len(), 2);
    let removal = report.removal.as_ref().unwrap();
    assert_eq!(removal.children.len(), 2);
    assert!(removal
        .lifecycle
        .children()
        .iter()
        .all(|child| child.state() == ObservedState::NotFound));
    assert!(report.results().iter().all(|r| r.status() == Status::Passed));
}

#[test]
fn test_authoring_rejection_aborts_scenario() {
    let (surface, publisher, verifier) = setup(PropagationLag::default(), 5);
    publisher.reject_next("publish");
    let spec = LifecycleSpec::new("rejected", "Rejected", ArtefactFormat::Answer);

    let err = verifier.verify_lifecycle(&publisher, &spec).unwrap_err();

    assert_eq!(err.failure_kind(), FailureKind::Authoring);
    assert!(surface.probe_log().is_empty());
}

// =============================================================================
// Test 2: Parent before child
// =============================================================================

#[test]
fn test_children_skipped_when_parent_still_live() {
    let surface = MockSurface::new();
    let parent = base().child("still-up").unwrap();
    surface.set_status(&parent, 200);

    let verifier = Verifier::new(&surface, fast_config(3));
    let report = verifier.verify_removed(&parent, &["part-one", "part-two"]).unwrap();

    assert!(!report.is_success());
    assert!(matches!(report.parent.error(), Some(VerifyError::Timeout { .. })));
    for child in &report.children {
        assert_eq!(child.status(), Status::Skipped);
    }
    assert!(surface
        .probe_log()
        .iter()
        .all(|probed| probed == parent.as_str()));
}

#[test]
fn test_children_skipped_when_parent_redirects() {
    let surface = MockSurface::new();
    let parent = base().child("redirected").unwrap();
    surface.set_status(&parent, 301);

    let verifier = Verifier::new(&surface, fast_config(3));
    let report = verifier.verify_removed(&parent, &["part"]).unwrap();

    match report.parent.error() {
        Some(VerifyError::UnexpectedStatus { actual, .. }) => assert_eq!(*actual, 301),
        other => panic!("expected unexpected status, got {other:?}"),
    }
    assert!(matches!(report.children[0], CheckResult::Skipped { .. }));
    assert_eq!(report.lifecycle.parent().state(), ObservedState::Unknown);
}

#[test]
fn test_gone_page_without_marker_fails_body_check() {
    let surface = MockSurface::new();
    let parent = base().child("blank-410").unwrap();
    surface.set(&parent, ProbeResponse::new(410, "<html></html>"));

    let verifier = Verifier::new(&surface, fast_config(3));
    let err = verifier.wait_for_gone(&parent).unwrap_err();

    assert_eq!(err.failure_kind(), FailureKind::UnexpectedBody);
}

#[test]
fn test_child_still_serving_times_out() {
    let surface = MockSurface::new();
    let parent = base().child("half-retired").unwrap();
    let child = parent.child("details").unwrap();
    surface.set(&parent, ProbeResponse::new(410, GONE_BODY));
    surface.set_status(&child, 200);

    let verifier = Verifier::new(&surface, fast_config(4));
    let report = verifier.verify_removed(&parent, &["details"]).unwrap();

    assert!(report.parent.is_passed());
    let err = report.children[0].error().unwrap();
    assert_eq!(err.failure_kind(), FailureKind::Timeout);
    assert_eq!(err.attempts(), 4);
    assert_eq!(report.lifecycle.children()[0].state(), ObservedState::Live);
}

// =============================================================================
// Test 3: Idempotence
// =============================================================================

#[test]
fn test_already_gone_settles_in_one_attempt() {
    let surface = MockSurface::new();
    let parent = base().child("long-gone").unwrap();
    surface.set(&parent, ProbeResponse::new(410, GONE_BODY));

    let verifier = Verifier::new(&surface, fast_config(10));
    let first = verifier.wait_for_gone(&parent).unwrap();
    let second = verifier.wait_for_gone(&parent).unwrap();

    assert_eq!(first.attempts(), 1);
    assert_eq!(second.attempts(), 1);
    assert_eq!(second.outcome(), PollOutcome::Settled(410));
}

#[test]
fn test_repeated_removal_check_is_stable() {
    let surface = MockSurface::new();
    let parent = base().child("retired").unwrap();
    surface.set(&parent, ProbeResponse::new(410, GONE_BODY));
    surface.set_status(&parent.child("a").unwrap(), 404);

    let verifier = Verifier::new(&surface, fast_config(10));
    for _ in 0..3 {
        let report = verifier.verify_removed(&parent, &["a"]).unwrap();
        assert!(report.is_success());
        assert_eq!(report.results().map(|r| r.report().unwrap().attempts()).sum::<u32>(), 2);
    }
}

// =============================================================================
// Test 4: Transport failures and cancellation through the verifier
// =============================================================================

#[test]
fn test_unreachable_surface_is_transport_failure() {
    let surface = MockSurface::new();
    let parent = base().child("unreachable").unwrap();
    surface.inject_failure(
        &parent,
        FailureConfig::error(TransportError::ConnectionFailed("refused".into())),
    );

    let verifier = Verifier::new(&surface, fast_config(3));
    let err = verifier.wait_for_gone(&parent).unwrap_err();

    assert_eq!(err.failure_kind(), FailureKind::Transport);
    assert_eq!(err.attempts(), 3);
}

#[test]
fn test_cancelled_verifier_reports_cancelled() {
    let surface = MockSurface::new();
    let parent = base().child("cancelled").unwrap();
    let token = CancelToken::new();
    token.cancel(CancelReason::Signal);

    let verifier = Verifier::new(&surface, fast_config(3)).with_cancel(token);
    let report = verifier.verify_removed(&parent, &["x"]).unwrap();

    assert_eq!(report.parent.status(), Status::Cancelled);
    assert_eq!(report.children[0].status(), Status::Skipped);
    assert!(surface.probe_log().is_empty());
}

#[test]
fn test_invalid_part_slug_is_locator_error() {
    let surface = MockSurface::new();
    let verifier = Verifier::new(&surface, fast_config(3));
    let err = verifier
        .verify_removed(&base().child("parent").unwrap(), &["a/b"])
        .unwrap_err();
    assert!(matches!(err, VerifyError::Locator(_)));
}

// =============================================================================
// Test 5: Batches
// =============================================================================

#[test]
fn test_batch_of_independent_artefacts() {
    let (surface, publisher, verifier) = setup(PropagationLag::new(2, 1), 20);

    let mut targets = Vec::new();
    for n in 0..3 {
        let slug = format!("batch-{n}");
        publisher
            .create_artefact(&slug, &format!("Batch {n}"), ArtefactFormat::Guide)
            .unwrap();
        let part = publisher.add_part(&slug, "Summary").unwrap();
        let url = publisher.publish(&slug).unwrap();
        verifier.wait_for_live(&url).unwrap();
        publisher.unpublish_without_redirect(&slug).unwrap();
        targets.push(RemovalTarget::new(url).with_parts([part]));
    }

    let results = verifier.verify_batch(&targets);

    assert_eq!(results.len(), 3);
    for (target, result) in targets.iter().zip(&results) {
        let report = result.as_ref().unwrap();
        assert!(report.is_success(), "{report:?}");
        assert_eq!(report.parent.locator(), &target.parent);
        assert_eq!(report.parent.expected(), Expected::Gone);
    }
    assert!(surface.probe_log().len() >= 6);
}
