//! Wait policy between actor cycles.
//!
//! A small random jitter keeps actors that started together from hitting
//! the pool in lockstep.

use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub interval: Duration,
    pub jitter: Duration,
}

impl Pacing {
    pub fn new(interval: Duration, jitter: Duration) -> Self {
        Self { interval, jitter }
    }

    pub fn fixed(interval: Duration) -> Self {
        Self::new(interval, Duration::ZERO)
    }

    /// The next wait: `interval` plus up to `jitter`.
    pub fn next_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.interval;
        }
        let max = u64::try_from(self.jitter.as_nanos()).unwrap_or(u64::MAX);
        let extra = rand::rng().random_range(0..=max);
        self.interval.saturating_add(Duration::from_nanos(extra))
    }
}

/// Pacing for both sides of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorPacing {
    /// Wait between vendor release cycles.
    pub release: Pacing,
    /// Wait between customer retrieval cycles.
    pub retrieval: Pacing,
}

impl Default for ActorPacing {
    fn default() -> Self {
        Self {
            release: Pacing::new(Duration::from_millis(1_000), Duration::from_millis(100)),
            retrieval: Pacing::new(Duration::from_millis(1_000), Duration::from_millis(100)),
        }
    }
}
