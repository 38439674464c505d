//! Exponentially distributed sleep between sync cycles; cycle start times
//! form a Poisson process with the configured mean spacing.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of randomized inter-cycle delays with a fixed mean.
#[derive(Debug)]
pub struct Jitter {
    mean_secs: f64,
    rng: StdRng,
}

impl Jitter {
    /// Delays with mean `mean`, seeded from OS entropy.
    pub fn new(mean: Duration) -> Self {
        Self::with_rng(mean, StdRng::from_entropy())
    }

    /// Reproducible delays for tests.
    pub fn seeded(mean: Duration, seed: u64) -> Self {
        Self::with_rng(mean, StdRng::seed_from_u64(seed))
    }

    fn with_rng(mean: Duration, rng: StdRng) -> Self {
        Self {
            mean_secs: mean.as_secs_f64(),
            rng,
        }
    }

    pub fn mean(&self) -> Duration {
        Duration::from_secs_f64(self.mean_secs)
    }

    /// Next delay, by inverse-CDF sampling: `-mean * ln(1 - u)` for `u` in `[0, 1)`.
    pub fn sample(&mut self) -> Duration {
        let u: f64 = self.rng.gen();
        let secs = self.mean_secs * (1.0 - u).ln().abs();
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}
