//! Retry delay math for the startup maintenance gate.
//!
//! Instances waiting on a peer's maintenance lock sleep between attempts.
//! The delay doubles per attempt up to a ceiling; with the ceiling equal to
//! the initial delay this degenerates to a fixed interval.

use std::time::Duration;

/// Default wait between maintenance-lock attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Exponent cap so the doubling never overflows.
const MAX_DOUBLINGS: u32 = 16;

/// Capped exponential delay schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Backoff {
    /// Fixed interval: every attempt waits `interval`.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            initial: interval,
            max: interval,
        }
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let ceiling = self.max.max(self.initial);
        let factor = 1u32 << attempt.min(MAX_DOUBLINGS);
        self.initial
            .checked_mul(factor)
            .map_or(ceiling, |d| d.min(ceiling))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::fixed(DEFAULT_RETRY_INTERVAL)
    }
}
