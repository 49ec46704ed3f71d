//! Randomized delays.
//!
//! Every SVS timer (retransmission, ack suppression, dispatch pacing) draws
//! its delay from a uniform distribution around a tunable mean. Randomness
//! desynchronizes peers so one node's broadcast can suppress the others'.

use std::time::Duration;

use rand::Rng;

use crate::core::{
    PACKET_DELAY_MEAN, PACKET_DELAY_SPREAD, RETX_INTERVAL_MEAN, RETX_INTERVAL_SPREAD,
};

/// Uniform delay distribution over `[mean - spread, mean + spread]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    /// Center of the distribution.
    mean: Duration,
    /// Maximum deviation from the mean, in either direction.
    spread: Duration,
}

impl Jitter {
    /// Create a distribution. A spread wider than the mean is clamped at zero
    /// on the low side.
    pub const fn new(mean: Duration, spread: Duration) -> Self {
        Self { mean, spread }
    }

    /// A distribution that always yields `delay`.
    pub const fn fixed(delay: Duration) -> Self {
        Self::new(delay, Duration::ZERO)
    }

    /// Default periodic retransmission interval.
    pub const fn retransmission() -> Self {
        Self::new(RETX_INTERVAL_MEAN, RETX_INTERVAL_SPREAD)
    }

    /// Default dispatch and ack suppression delay.
    pub const fn packet() -> Self {
        Self::new(PACKET_DELAY_MEAN, PACKET_DELAY_SPREAD)
    }

    /// Center of the distribution.
    pub fn mean(&self) -> Duration {
        self.mean
    }

    /// Maximum deviation from the mean.
    pub fn spread(&self) -> Duration {
        self.spread
    }

    /// Smallest delay this distribution can yield.
    pub fn min(&self) -> Duration {
        self.mean.saturating_sub(self.spread)
    }

    /// Largest delay this distribution can yield.
    pub fn max(&self) -> Duration {
        self.mean.saturating_add(self.spread)
    }

    /// Draw one delay, at microsecond resolution.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let low = micros(self.min());
        let high = micros(self.max());
        if low >= high {
            return Duration::from_micros(low);
        }
        Duration::from_micros(rng.gen_range(low..=high))
    }
}

/// Whole microseconds in `delay`, saturating at `u64::MAX`.
fn micros(delay: Duration) -> u64 {
    u64::try_from(delay.as_micros()).unwrap_or(u64::MAX)
}

impl Default for Jitter {
    fn default() -> Self {
        Self::packet()
    }
}
