//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

use crate::verifier::DEFAULT_GONE_BODY_MARKER;

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Probe budget: attempts (0 disables the bound)
    pub max_attempts: u32,

    /// Probe budget: seconds (0 disables the bound)
    pub max_duration_seconds: u64,

    /// Wait between probes, or the first wait under exponential backoff
    pub interval_ms: u64,

    /// "fixed" or "exponential"
    pub backoff: String,

    /// Cap on exponential backoff
    pub max_interval_ms: u64,

    pub jitter: bool,

    /// "transient" or "fail_fast"
    pub transport_policy: String,

    pub request_timeout_seconds: u64,

    pub connect_timeout_seconds: u64,

    pub user_agent: String,

    pub max_body_bytes: u64,

    /// Marker the 410 page must mention ("" disables)
    pub gone_body_marker: String,

    pub transient_live: Vec<u16>,
    pub transient_gone: Vec<u16>,
    pub transient_not_found: Vec<u16>,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            max_duration_seconds: 300,
            interval_ms: 2000,
            backoff: "fixed".to_string(),
            max_interval_ms: 30_000,
            jitter: false,
            transport_policy: "transient".to_string(),
            request_timeout_seconds: 30,
            connect_timeout_seconds: 10,
            user_agent: concat!("propagation-verifier/", env!("CARGO_PKG_VERSION")).to_string(),
            max_body_bytes: 64 * 1024,
            gone_body_marker: DEFAULT_GONE_BODY_MARKER.to_string(),
            transient_live: vec![404, 502, 503, 504],
            transient_gone: vec![200],
            transient_not_found: vec![200],
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "max_attempts": self.max_attempts,
            "max_duration_seconds": self.max_duration_seconds,
            "interval_ms": self.interval_ms,
            "backoff": self.backoff,
            "max_interval_ms": self.max_interval_ms,
            "jitter": self.jitter,
            "transport_policy": self.transport_policy,
            "request_timeout_seconds": self.request_timeout_seconds,
            "connect_timeout_seconds": self.connect_timeout_seconds,
            "user_agent": self.user_agent,
            "max_body_bytes": self.max_body_bytes,
            "gone_body_marker": self.gone_body_marker,
            "transient": {
                "live": self.transient_live,
                "gone": self.transient_gone,
                "not_found": self.transient_not_found
            },
            "auth": {}
        })
    }
}
