//! Politeness delay between consecutive page fetches

use rand::Rng;
use std::time::Duration;

/// Computes the pause taken after each processed page
///
/// The pause is `delay + U[0, jitter)`, so requests never arrive at a fixed
/// cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Politeness {
    delay: Duration,
    jitter: Duration,
}

impl Politeness {
    pub fn new(delay: Duration, jitter: Duration) -> Self {
        Self { delay, jitter }
    }

    /// Draws the next pause from `rng`
    pub fn pause<R: Rng>(&self, rng: &mut R) -> Duration {
        self.delay
            .saturating_add(self.jitter.mul_f64(rng.gen::<f64>()))
    }

    pub fn is_zero(&self) -> bool {
        self.delay.is_zero() && self.jitter.is_zero()
    }
}
