//! Typed view of the merged configuration

use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use pv_content::ResourceLocator;

use super::effective::ConfigError;
use crate::poller::{Backoff, PollConfig, TransportPolicy};
use crate::probe::{Credentials, HttpProbeConfig};
use crate::timeout::PollBudget;
use crate::verifier::{TransientSets, VerifierConfig};

/// Upper limit on request/connect timeouts
const MAX_REQUEST_TIMEOUT_SECONDS: u64 = 300;

/// Backoff selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffMode {
    Fixed,
    Exponential,
}

/// Credentials section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthSettings {
    pub bearer_token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Fully merged settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Base for relative locators given on the command line
    #[serde(default)]
    pub base_url: Option<String>,
    pub max_attempts: u32,
    pub max_duration_seconds: u64,
    pub interval_ms: u64,
    pub backoff: BackoffMode,
    pub max_interval_ms: u64,
    pub jitter: bool,
    pub transport_policy: TransportPolicy,
    pub request_timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
    pub user_agent: String,
    pub max_body_bytes: usize,
    pub gone_body_marker: String,
    pub transient: TransientSets,
    #[serde(default)]
    pub auth: AuthSettings,
}

impl Settings {
    /// Deserialize from an unredacted merged value
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        Settings::deserialize(value).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Check every derived configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.verifier_config()?;
        self.http_probe_config()?;
        self.base_locator()?;
        Ok(())
    }

    pub fn poll_config(&self) -> Result<PollConfig, ConfigError> {
        let budget = PollBudget {
            max_attempts: (self.max_attempts > 0).then_some(self.max_attempts),
            max_duration: (self.max_duration_seconds > 0).then(|| Duration::from_secs(self.max_duration_seconds)),
        };
        let interval = Duration::from_millis(self.interval_ms);
        let backoff = match self.backoff {
            BackoffMode::Fixed => Backoff::fixed(interval),
            BackoffMode::Exponential => Backoff::exponential(interval, Duration::from_millis(self.max_interval_ms)),
        };

        let config = PollConfig {
            budget,
            backoff,
            jitter: self.jitter,
            transport_policy: self.transport_policy,
        };
        config
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Ok(config)
    }

    pub fn verifier_config(&self) -> Result<VerifierConfig, ConfigError> {
        // A check whose expected status is also transient can never pass
        for (key, set, expected) in [
            ("transient.live", &self.transient.live, 200),
            ("transient.gone", &self.transient.gone, 410),
            ("transient.not_found", &self.transient.not_found, 404),
        ] {
            if set.contains(expected) {
                return Err(ConfigError::ValidationError(format!(
                    "{} must not contain {}, the status that check waits for",
                    key, expected
                )));
            }
        }

        let marker = self.gone_body_marker.trim();
        Ok(VerifierConfig {
            poll: self.poll_config()?,
            transient: self.transient.clone(),
            gone_body_marker: (!marker.is_empty()).then(|| marker.to_string()),
        })
    }

    pub fn credentials(&self) -> Result<Option<Credentials>, ConfigError> {
        let auth = &self.auth;
        match (&auth.bearer_token, &auth.username, &auth.password) {
            (Some(_), Some(_), _) => Err(ConfigError::ValidationError(
                "auth.bearer_token and auth.username are mutually exclusive".to_string(),
            )),
            (Some(token), None, _) => Ok(Some(Credentials::Bearer(token.clone()))),
            (None, Some(username), Some(password)) => Ok(Some(Credentials::Basic {
                username: username.clone(),
                password: password.clone(),
            })),
            (None, Some(_), None) => Err(ConfigError::ValidationError(
                "auth.username requires auth.password".to_string(),
            )),
            (None, None, Some(_)) => Err(ConfigError::ValidationError(
                "auth.password requires auth.username".to_string(),
            )),
            (None, None, None) => Ok(None),
        }
    }

    pub fn http_probe_config(&self) -> Result<HttpProbeConfig, ConfigError> {
        for (key, value) in [
            ("request_timeout_seconds", self.request_timeout_seconds),
            ("connect_timeout_seconds", self.connect_timeout_seconds),
        ] {
            if value == 0 || value > MAX_REQUEST_TIMEOUT_SECONDS {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be in (0, {}]",
                    key, MAX_REQUEST_TIMEOUT_SECONDS
                )));
            }
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::ValidationError("user_agent must not be empty".to_string()));
        }

        Ok(HttpProbeConfig {
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
            connect_timeout: Duration::from_secs(self.connect_timeout_seconds),
            user_agent: self.user_agent.clone(),
            credentials: self.credentials()?,
            max_body_bytes: self.max_body_bytes,
        })
    }

    pub fn base_locator(&self) -> Result<Option<ResourceLocator>, ConfigError> {
        self.base_url
            .as_deref()
            .map(|url| {
                ResourceLocator::parse(url).map_err(|e| ConfigError::ValidationError(format!("base_url: {}", e)))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuiltinDefaults;
    use crate::config::deep_merge;
    use serde_json::json;

    fn settings(overlay: Value) -> Result<Settings, ConfigError> {
        Settings::from_value(&deep_merge(BuiltinDefaults::default().to_value(), overlay))
    }

    #[test]
    fn test_defaults_produce_valid_settings() {
        let s = settings(json!({})).unwrap();
        s.validate().unwrap();

        let cfg = s.verifier_config().unwrap();
        assert_eq!(cfg.poll.budget, PollBudget::both(60, Duration::from_secs(300)));
        assert_eq!(cfg.poll.backoff, Backoff::fixed(Duration::from_secs(2)));
        assert_eq!(cfg.gone_body_marker.as_deref(), Some("gone"));
        assert_eq!(cfg.transient, TransientSets::default());
        assert!(s.credentials().unwrap().is_none());
        assert!(s.base_locator().unwrap().is_none());
    }

    #[test]
    fn test_zero_disables_one_bound() {
        let s = settings(json!({"max_attempts": 0})).unwrap();
        assert_eq!(
            s.poll_config().unwrap().budget,
            PollBudget::duration(Duration::from_secs(300))
        );
    }

    #[test]
    fn test_expected_status_cannot_be_transient() {
        let s = settings(json!({"transient": {"not_found": [200, 404]}})).unwrap();
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("transient.not_found"));
    }

    #[test]
    fn test_both_bounds_disabled_rejected() {
        let s = settings(json!({"max_attempts": 0, "max_duration_seconds": 0})).unwrap();
        let err = s.poll_config().unwrap_err();
        assert!(err.to_string().contains("bound"));
    }

    #[test]
    fn test_exponential_backoff() {
        let s = settings(json!({"backoff": "exponential", "interval_ms": 100, "max_interval_ms": 400})).unwrap();
        assert_eq!(
            s.poll_config().unwrap().backoff,
            Backoff::exponential(Duration::from_millis(100), Duration::from_millis(400))
        );
    }

    #[test]
    fn test_unknown_backoff_rejected() {
        assert!(settings(json!({"backoff": "linear"})).is_err());
    }

    #[test]
    fn test_fail_fast_policy() {
        let s = settings(json!({"transport_policy": "fail_fast"})).unwrap();
        assert_eq!(
            s.poll_config().unwrap().transport_policy,
            TransportPolicy::FailFastUnrecoverable
        );
    }

    #[test]
    fn test_empty_marker_disables_body_check() {
        let s = settings(json!({"gone_body_marker": ""})).unwrap();
        assert!(s.verifier_config().unwrap().gone_body_marker.is_none());
    }

    #[test]
    fn test_credentials() {
        let s = settings(json!({"auth": {"bearer_token": "t0k"}})).unwrap();
        assert_eq!(s.credentials().unwrap(), Some(Credentials::Bearer("t0k".into())));

        let s = settings(json!({"auth": {"username": "u", "password": "p"}})).unwrap();
        assert!(matches!(s.credentials().unwrap(), Some(Credentials::Basic { .. })));

        let s = settings(json!({"auth": {"username": "u"}})).unwrap();
        assert!(s.credentials().is_err());

        let s = settings(json!({"auth": {"bearer_token": "t", "username": "u", "password": "p"}})).unwrap();
        assert!(s.credentials().is_err());
    }

    #[test]
    fn test_request_timeout_bounds() {
        let s = settings(json!({"request_timeout_seconds": 0})).unwrap();
        assert!(s
            .http_probe_config()
            .unwrap_err()
            .to_string()
            .contains("request_timeout_seconds"));
    }

    #[test]
    fn test_base_url() {
        let s = settings(json!({"base_url": "https://www.example.org/"})).unwrap();
        assert_eq!(
            s.base_locator().unwrap().unwrap().as_str(),
            "https://www.example.org/"
        );

        let s = settings(json!({"base_url": "ftp://x"})).unwrap();
        assert!(s.base_locator().is_err());
    }
}
