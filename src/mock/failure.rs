//! Failure injection for the mock surface
//!
//! Supports configurable transport failures and delays per locator.

use std::collections::HashMap;
use std::time::Duration;

use crate::probe::TransportError;

/// Failure configuration for a locator
#[derive(Debug, Clone)]
pub struct FailureConfig {
    /// Transport error to return (if any)
    pub error: Option<TransportError>,
    /// Delay to add before responding
    pub delay: Option<Duration>,
    /// Number of times to fail before succeeding (None = always fail)
    pub fail_count: Option<u32>,
}

impl FailureConfig {
    /// Create a config that returns an error
    pub fn error(error: TransportError) -> Self {
        Self {
            error: Some(error),
            delay: None,
            fail_count: None,
        }
    }

    /// Create a config that just adds delay
    pub fn delay(duration: Duration) -> Self {
        Self {
            error: None,
            delay: Some(duration),
            fail_count: None,
        }
    }

    /// Set the number of times to fail before succeeding
    pub fn with_fail_count(mut self, count: u32) -> Self {
        self.fail_count = Some(count);
        self
    }
}

/// Failure injector keyed by locator
#[derive(Debug, Default)]
pub struct FailureInjector {
    configs: HashMap<String, FailureConfig>,
    call_counts: HashMap<String, u32>,
}

impl FailureInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a failure for a locator
    pub fn inject(&mut self, locator: &str, config: FailureConfig) {
        self.configs.insert(locator.to_string(), config);
        self.call_counts.insert(locator.to_string(), 0);
    }

    /// Clear all failure injections
    pub fn clear(&mut self) {
        self.configs.clear();
        self.call_counts.clear();
    }

    /// Check if a failure applies to this call.
    ///
    /// Returns the config while it is still active, None once `fail_count`
    /// calls have failed.
    pub fn check(&mut self, locator: &str) -> Option<&FailureConfig> {
        let config = self.configs.get(locator)?;
        let count = self.call_counts.entry(locator.to_string()).or_insert(0);
        *count += 1;

        if let Some(fail_limit) = config.fail_count {
            if *count > fail_limit {
                return None;
            }
        }

        Some(config)
    }
}
