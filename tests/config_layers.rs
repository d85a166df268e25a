//! Configuration Layer Tests
//!
//! Host and repo TOML files merged over the built-in defaults, with CLI
//! overrides on top, resolved into verifier and probe settings.

use std::fs;
use std::path::Path;
use std::time::Duration;

use propagation_verifier::config::{BackoffMode, ConfigError, ConfigOrigin, EffectiveConfig};
use propagation_verifier::{Backoff, PollBudget, TransientSet, TransportPolicy};
use serde_json::json;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

// =============================================================================
// Test 1: Layer precedence
// =============================================================================

#[test]
fn test_repo_overrides_host_and_cli_overrides_repo() {
    let dir = TempDir::new().unwrap();
    let host = write(
        &dir,
        "host.toml",
        r#"
interval_ms = 500
max_attempts = 10
user_agent = "host-agent"
"#,
    );
    let repo = write(
        &dir,
        "repo.toml",
        r#"
max_attempts = 20
base_url = "https://www.example.org/"

[transient]
gone = [200, 503]
"#,
    );

    let config = EffectiveConfig::build(Some(&host), Some(&repo), Some(json!({"max_attempts": 5}))).unwrap();
    let settings = config.settings().unwrap();

    assert_eq!(settings.max_attempts, 5);
    assert_eq!(settings.interval_ms, 500);
    assert_eq!(settings.user_agent, "host-agent");
    assert_eq!(settings.transient.gone, TransientSet::of(&[200, 503]));
    assert_eq!(settings.transient.live, TransientSet::of(&[404, 502, 503, 504]));

    let origins: Vec<_> = config.sources.iter().map(|s| s.origin.clone()).collect();
    assert_eq!(
        origins,
        vec![ConfigOrigin::Builtin, ConfigOrigin::Host, ConfigOrigin::Repo, ConfigOrigin::Cli]
    );
}

#[test]
fn test_settings_resolve_to_verifier_config() {
    let dir = TempDir::new().unwrap();
    let repo = write(
        &dir,
        "verify.toml",
        r#"
max_attempts = 0
max_duration_seconds = 120
backoff = "exponential"
interval_ms = 250
max_interval_ms = 4000
jitter = true
transport_policy = "fail_fast"
gone_body_marker = ""
"#,
    );

    let settings = EffectiveConfig::build(None, Some(&repo), None)
        .unwrap()
        .settings()
        .unwrap();
    assert_eq!(settings.backoff, BackoffMode::Exponential);

    let verifier = settings.verifier_config().unwrap();
    assert_eq!(verifier.poll.budget, PollBudget::duration(Duration::from_secs(120)));
    assert_eq!(
        verifier.poll.backoff,
        Backoff::exponential(Duration::from_millis(250), Duration::from_secs(4))
    );
    assert!(verifier.poll.jitter);
    assert_eq!(verifier.poll.transport_policy, TransportPolicy::FailFastUnrecoverable);
    assert!(verifier.gone_body_marker.is_none());
}

// =============================================================================
// Test 2: Validation
// =============================================================================

#[test]
fn test_unbounded_repo_config_rejected() {
    let dir = TempDir::new().unwrap();
    let repo = write(&dir, "verify.toml", "max_attempts = 0\nmax_duration_seconds = 0\n");

    let err = EffectiveConfig::build(None, Some(&repo), None).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
fn test_backoff_cap_below_initial_rejected() {
    let err = EffectiveConfig::build(
        None,
        None,
        Some(json!({"backoff": "exponential", "interval_ms": 5000, "max_interval_ms": 100})),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
fn test_transient_set_holding_expected_status_rejected() {
    let dir = TempDir::new().unwrap();
    let repo = write(&dir, "verify.toml", "[transient]\ngone = [200, 410]\n");

    let err = EffectiveConfig::build(None, Some(&repo), None).unwrap_err();
    match err {
        ConfigError::ValidationError(message) => assert!(message.contains("transient.gone"), "{message}"),
        other => panic!("expected validation error, got {other:?}"),
    }

    let err = EffectiveConfig::build(None, None, Some(json!({"transient": {"live": [200]}}))).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
fn test_wrong_type_rejected() {
    let dir = TempDir::new().unwrap();
    let repo = write(&dir, "verify.toml", "max_attempts = \"many\"\n");

    let err = EffectiveConfig::build(None, Some(&repo), None).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
fn test_missing_layers_fall_back_to_defaults() {
    let config = EffectiveConfig::build(
        Some(Path::new("/nonexistent/host.toml")),
        Some(Path::new("/nonexistent/verify.toml")),
        None,
    )
    .unwrap();

    let settings = config.settings().unwrap();
    assert_eq!(settings.max_attempts, 60);
    assert_eq!(settings.transport_policy, TransportPolicy::TreatAsTransient);
}

// =============================================================================
// Test 3: Secrets
// =============================================================================

#[test]
fn test_written_config_has_secrets_redacted() {
    let dir = TempDir::new().unwrap();
    let host = write(&dir, "host.toml", "[auth]\nbearer_token = \"s3cr3t\"\n");

    let config = EffectiveConfig::build(Some(&host), None, None).unwrap();
    let out = dir.path().join("effective_config.json");
    config.write_to_file(&out).unwrap();

    let written = fs::read_to_string(&out).unwrap();
    assert!(!written.contains("s3cr3t"));
    assert!(written.contains("[REDACTED]"));
    assert!(written.contains("propagation-verifier/effective_config@1"));

    let probe = config.settings().unwrap().http_probe_config().unwrap();
    assert!(probe.credentials.is_some());
}
