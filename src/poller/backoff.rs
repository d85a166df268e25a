//! Wait intervals between probes

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Interval strategy between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// The same interval after every attempt
    Fixed { interval: Duration },
    /// `initial * 2^(attempt-1)`, capped at `max`
    Exponential { initial: Duration, max: Duration },
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::Fixed {
            interval: Duration::from_secs(2),
        }
    }
}

impl Backoff {
    pub fn fixed(interval: Duration) -> Self {
        Backoff::Fixed { interval }
    }

    pub fn exponential(initial: Duration, max: Duration) -> Self {
        Backoff::Exponential { initial, max }
    }

    /// Delay after the `attempt`-th probe (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed { interval } => interval,
            Backoff::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                initial.saturating_mul(factor).min(max)
            }
        }
    }

    /// Scale `delay` by a random factor in [0.5, 1.0]
    pub fn jittered(delay: Duration) -> Duration {
        if delay.is_zero() {
            return delay;
        }
        delay.mul_f64(rand::thread_rng().gen_range(0.5..=1.0))
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        match *self {
            Backoff::Fixed { .. } => Ok(()),
            Backoff::Exponential { initial, max } if initial > max => Err(format!(
                "exponential backoff initial {:?} exceeds max {:?}",
                initial, max
            )),
            Backoff::Exponential { .. } => Ok(()),
        }
    }
}
