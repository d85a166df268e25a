//! Scripted delivery surface

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use pv_content::ResourceLocator;

use super::failure::{FailureConfig, FailureInjector};
use crate::probe::{Probe, ProbeResponse, TransportError};

/// Body served for locators with no route
pub const NOT_FOUND_BODY: &str = "Page not found";

/// Body served by unpublished artefacts
pub const GONE_BODY: &str = "This page has been removed. It is gone.";

#[derive(Debug, Default)]
struct Route {
    /// Responses served before `steady`, one per probe
    script: VecDeque<ProbeResponse>,
    steady: Option<ProbeResponse>,
}

#[derive(Debug, Default)]
struct SurfaceState {
    routes: HashMap<String, Route>,
    failures: FailureInjector,
    probe_log: Vec<String>,
}

/// In-process delivery surface for tests.
///
/// Each locator serves its scripted responses in order, then its steady
/// response forever. Unknown locators serve 404. Injected failures take
/// precedence over routes and do not consume the script.
#[derive(Debug, Default)]
pub struct MockSurface {
    state: Mutex<SurfaceState>,
}

impl MockSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Serve `response` from now on, discarding any pending script
    pub fn set(&self, locator: &ResourceLocator, response: ProbeResponse) {
        let mut state = self.lock();
        let route = state.routes.entry(locator.to_string()).or_default();
        route.script.clear();
        route.steady = Some(response);
    }

    pub fn set_status(&self, locator: &ResourceLocator, status: u16) {
        self.set(locator, ProbeResponse::status(status));
    }

    /// Serve `responses` in order; the last one becomes steady state
    pub fn script(&self, locator: &ResourceLocator, responses: Vec<ProbeResponse>) {
        let mut responses: VecDeque<ProbeResponse> = responses.into();
        let steady = responses.pop_back();

        let mut state = self.lock();
        let route = state.routes.entry(locator.to_string()).or_default();
        route.script = responses;
        if steady.is_some() {
            route.steady = steady;
        }
    }

    pub fn script_statuses(&self, locator: &ResourceLocator, statuses: &[u16]) {
        self.script(
            locator,
            statuses.iter().copied().map(ProbeResponse::status).collect(),
        );
    }

    /// Serve the current steady response `lag` more times, then `next`
    pub fn transition(&self, locator: &ResourceLocator, lag: u32, next: ProbeResponse) {
        let mut state = self.lock();
        let route = state.routes.entry(locator.to_string()).or_default();
        let current = route
            .steady
            .clone()
            .unwrap_or_else(|| ProbeResponse::new(404, NOT_FOUND_BODY));
        route.script.clear();
        route.script.extend((0..lag).map(|_| current.clone()));
        route.steady = Some(next);
    }

    pub fn inject_failure(&self, locator: &ResourceLocator, config: FailureConfig) {
        self.lock().failures.inject(locator.as_str(), config);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Number of probes issued against `locator`
    pub fn probe_count(&self, locator: &ResourceLocator) -> usize {
        let state = self.lock();
        state
            .probe_log
            .iter()
            .filter(|probed| probed.as_str() == locator.as_str())
            .count()
    }

    /// Every probed locator, in order
    pub fn probe_log(&self) -> Vec<String> {
        self.lock().probe_log.clone()
    }
}

impl Probe for MockSurface {
    fn probe(&self, locator: &ResourceLocator) -> Result<ProbeResponse, TransportError> {
        self.probe_within(locator, None)
    }

    /// An injected delay longer than `limit` times out after `limit`.
    fn probe_within(
        &self,
        locator: &ResourceLocator,
        limit: Option<Duration>,
    ) -> Result<ProbeResponse, TransportError> {
        let key = locator.to_string();

        let (delay, error) = {
            let mut state = self.lock();
            state.probe_log.push(key.clone());
            match state.failures.check(&key) {
                Some(config) => (config.delay, config.error.clone()),
                None => (None, None),
            }
        };

        // Sleep outside the lock so concurrent probes are not serialized.
        if let Some(delay) = delay {
            match limit {
                Some(limit) if delay > limit => {
                    thread::sleep(limit);
                    return Err(TransportError::Timeout(format!("no response from {key} within {limit:?}")));
                }
                _ => thread::sleep(delay),
            }
        }
        if let Some(error) = error {
            return Err(error);
        }

        let mut state = self.lock();
        let response = match state.routes.get_mut(&key) {
            Some(route) => match route.script.pop_front() {
                Some(response) => response,
                None => route
                    .steady
                    .clone()
                    .unwrap_or_else(|| ProbeResponse::new(404, NOT_FOUND_BODY)),
            },
            None => ProbeResponse::new(404, NOT_FOUND_BODY),
        };
        Ok(response)
    }
}
