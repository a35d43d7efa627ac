//! Delay policy: how long a background job waits before touching the store.

use std::time::Duration;

use rand::Rng;

/// Uniform delay between `min` and `max` (inclusive).
///
/// v1: whole-range uniform draw over `Duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// Delay before a completion job marks its task done (5-10 s).
    pub fn completion_default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(10))
    }

    /// Delay before a fetch job reads its task when the caller gives none (1-4 s).
    pub fn fetch_default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(4))
    }

    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }

    /// Draw one delay.
    ///
    /// An inverted range collapses to `min`; `AppBuilder` rejects those up front.
    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}
