//! HTTP probe against a real delivery surface
//!
//! Issues a blocking `GET` per probe. Redirects are never followed: a
//! removal that leaves a redirect behind must be observable as a 3xx.

use std::error::Error as StdError;
use std::fmt;
use std::io::Read;
use std::time::Duration;

use pv_content::ResourceLocator;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;

use super::{Probe, ProbeResponse, TransportError};

/// Credentials sent with every probe
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Basic { username: String, password: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Bearer(_) => f.write_str("Bearer([REDACTED])"),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}

/// HTTP probe configuration
#[derive(Debug, Clone)]
pub struct HttpProbeConfig {
    /// Whole-request timeout
    pub request_timeout: Duration,
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
    /// User-Agent header
    pub user_agent: String,
    /// Optional credentials
    pub credentials: Option<Credentials>,
    /// Bodies longer than this are truncated
    pub max_body_bytes: usize,
}

impl Default for HttpProbeConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("propagation-verifier/", env!("CARGO_PKG_VERSION")).to_string(),
            credentials: None,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Blocking HTTP probe
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    config: HttpProbeConfig,
}

impl HttpProbe {
    /// Build the underlying client
    pub fn new(config: HttpProbeConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpProbeConfig {
        &self.config
    }
}

impl Probe for HttpProbe {
    fn probe(&self, locator: &ResourceLocator) -> Result<ProbeResponse, TransportError> {
        self.probe_within(locator, None)
    }

    fn probe_within(
        &self,
        locator: &ResourceLocator,
        limit: Option<Duration>,
    ) -> Result<ProbeResponse, TransportError> {
        let mut request = self.client.get(locator.as_url().clone());
        if let Some(limit) = limit {
            request = request.timeout(limit.min(self.config.request_timeout));
        }
        request = match &self.config.credentials {
            Some(Credentials::Bearer(token)) => request.bearer_auth(token),
            Some(Credentials::Basic { username, password }) => request.basic_auth(username, Some(password)),
            None => request,
        };

        let response = request.send().map_err(|e| classify_error(locator, &e))?;
        let status = response.status().as_u16();

        // Never buffer more than the configured body size.
        let mut bytes = Vec::new();
        response
            .take(self.config.max_body_bytes as u64)
            .read_to_end(&mut bytes)
            .map_err(|e| read_error(locator, &e))?;

        Ok(ProbeResponse {
            status,
            body: decode_body(bytes),
        })
    }
}

fn read_error(locator: &ResourceLocator, error: &std::io::Error) -> TransportError {
    let message = format!("Failed to read body from {}: {}", locator, error);
    // reqwest surfaces its body timeout as an io::Error wrapping the timeout
    if error.kind() == std::io::ErrorKind::TimedOut || message.to_lowercase().contains("timed out") {
        TransportError::Timeout(message)
    } else {
        TransportError::Protocol(message)
    }
}

/// Map a reqwest error onto the transport taxonomy
fn classify_error(locator: &ResourceLocator, error: &reqwest::Error) -> TransportError {
    let chain = error_chain(error);
    let lowered = chain.to_lowercase();

    if error.is_builder() {
        return TransportError::InvalidRequest(chain);
    }
    if error.is_timeout() {
        return TransportError::Timeout(chain);
    }
    // hyper reports resolver failures as "dns error" inside a connect error
    if lowered.contains("dns error") || lowered.contains("failed to lookup address") {
        return TransportError::Dns {
            host: locator.as_url().host_str().unwrap_or_default().to_string(),
            message: chain,
        };
    }
    if lowered.contains("certificate") || lowered.contains("tls") {
        return TransportError::Tls(chain);
    }
    if error.is_connect() {
        return TransportError::ConnectionFailed(chain);
    }
    TransportError::Protocol(chain)
}

fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

/// Decode a body read up to the byte limit.
///
/// A cut at the limit can split a multi-byte character; the partial
/// character is dropped rather than replaced.
fn decode_body(mut bytes: Vec<u8>) -> String {
    if let Err(e) = std::str::from_utf8(&bytes) {
        if e.error_len().is_none() {
            bytes.truncate(e.valid_up_to());
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
