//! Probe layer
//!
//! Abstracts the delivery surface for testability. Provides:
//! - Probe trait: a read-only fetch returning a status and body
//! - HttpProbe: blocking HTTP GET for real delivery surfaces
//! - MockSurface (in `crate::mock`): scripted in-process surface for tests

mod http;

pub use http::{Credentials, HttpProbe, HttpProbeConfig};

use std::sync::Arc;
use std::time::Duration;

use pv_content::ResourceLocator;

/// Result of a single probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    /// HTTP-like status code
    pub status: u16,
    /// Response body (possibly truncated by the probe)
    pub body: String,
}

impl ProbeResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A response with an empty body
    pub fn status(status: u16) -> Self {
        Self::new(status, String::new())
    }
}

/// A read-only fetch against the delivery surface.
///
/// Implementations must not mutate the target.
pub trait Probe: Send + Sync {
    fn probe(&self, locator: &ResourceLocator) -> Result<ProbeResponse, TransportError>;

    /// Probe, giving up with [`TransportError::Timeout`] once `limit` has
    /// passed. `None` leaves only the probe's own timeouts in force.
    ///
    /// The default ignores `limit`; probes that can block should override it.
    fn probe_within(
        &self,
        locator: &ResourceLocator,
        limit: Option<Duration>,
    ) -> Result<ProbeResponse, TransportError> {
        let _ = limit;
        self.probe(locator)
    }
}

impl<P: Probe + ?Sized> Probe for &P {
    fn probe(&self, locator: &ResourceLocator) -> Result<ProbeResponse, TransportError> {
        (**self).probe(locator)
    }

    fn probe_within(
        &self,
        locator: &ResourceLocator,
        limit: Option<Duration>,
    ) -> Result<ProbeResponse, TransportError> {
        (**self).probe_within(locator, limit)
    }
}

impl<P: Probe + ?Sized> Probe for Arc<P> {
    fn probe(&self, locator: &ResourceLocator) -> Result<ProbeResponse, TransportError> {
        (**self).probe(locator)
    }

    fn probe_within(
        &self,
        locator: &ResourceLocator,
        limit: Option<Duration>,
    ) -> Result<ProbeResponse, TransportError> {
        (**self).probe_within(locator, limit)
    }
}

impl<P: Probe + ?Sized> Probe for Box<P> {
    fn probe(&self, locator: &ResourceLocator) -> Result<ProbeResponse, TransportError> {
        (**self).probe(locator)
    }

    fn probe_within(
        &self,
        locator: &ResourceLocator,
        limit: Option<Duration>,
    ) -> Result<ProbeResponse, TransportError> {
        (**self).probe_within(locator, limit)
    }
}

/// Transport errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("DNS resolution failed for {host}: {message}")]
    Dns { host: String, message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl TransportError {
    /// Errors that retrying cannot fix.
    ///
    /// Only consulted under `TransportPolicy::FailFastUnrecoverable`.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(
            self,
            TransportError::Dns { .. } | TransportError::Tls(_) | TransportError::InvalidRequest(_)
        )
    }
}
