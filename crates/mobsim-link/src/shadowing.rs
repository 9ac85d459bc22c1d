//! Log-normal shadowing samples.
//!
//! Shadowing is a zero-mean Gaussian term (in dB) added to the path loss.
//! Callers either supply a pre-drawn sample or ask the scenario's
//! [`ShadowingSource`] for a fresh draw. The source is seeded so that a
//! scenario replays identically for the same seed.

use mobsim_common::{Result, SimError};
use mobsim_metrics::{metric_defs, metrics};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing::trace;

/// How the shadowing term of a link computation is obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shadowing {
    /// Draw a fresh `Normal(0, sigma)` sample from the scenario source.
    Draw,
    /// Use this pre-drawn sample (dB).
    Sample(f64),
}

impl Shadowing {
    /// No shadowing at all.
    pub const NONE: Shadowing = Shadowing::Sample(0.0);
}

impl Default for Shadowing {
    fn default() -> Self {
        Shadowing::Draw
    }
}

/// Seeded generator for shadowing samples.
#[derive(Debug, Clone)]
pub struct ShadowingSource {
    seed: u64,
    rng: ChaCha8Rng,
    draws: u64,
}

impl ShadowingSource {
    /// Creates a source seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            draws: 0,
        }
    }

    /// The seed of the current stream.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of samples drawn since the last (re)seed.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Restarts the stream from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// Draws a `Normal(0, sigma_db)` sample.
    ///
    /// A zero sigma returns `0.0` without consuming entropy.
    pub fn sample(&mut self, sigma_db: f64) -> Result<f64> {
        if !sigma_db.is_finite() || sigma_db < 0.0 {
            return Err(SimError::domain(format!(
                "Shadowing sigma must be non-negative, got {}",
                sigma_db
            )));
        }
        if sigma_db == 0.0 {
            return Ok(0.0);
        }
        let normal = Normal::new(0.0, sigma_db).map_err(|e| SimError::domain(e.to_string()))?;
        let value = normal.sample(&mut self.rng);
        self.draws += 1;
        metrics::counter!(metric_defs::SHADOWING_DRAWS.name).increment(1);
        trace!(sigma_db, value, draws = self.draws, "shadowing sample drawn");
        Ok(value)
    }

    /// Resolves a [`Shadowing`] request into a sample in dB.
    pub fn resolve(&mut self, shadowing: Shadowing, sigma_db: f64) -> Result<f64> {
        match shadowing {
            Shadowing::Sample(value) if value.is_finite() => Ok(value),
            Shadowing::Sample(value) => Err(SimError::domain(format!(
                "Shadowing sample must be finite, got {}",
                value
            ))),
            Shadowing::Draw => self.sample(sigma_db),
        }
    }
}

impl Default for ShadowingSource {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = ShadowingSource::new(42);
        let mut b = ShadowingSource::new(42);
        for _ in 0..16 {
            assert_eq!(a.sample(6.0).unwrap(), b.sample(6.0).unwrap());
        }
    }

    #[test]
    fn test_different_seed_different_stream() {
        let mut a = ShadowingSource::new(1);
        let mut b = ShadowingSource::new(2);
        let xs: Vec<f64> = (0..8).map(|_| a.sample(6.0).unwrap()).collect();
        let ys: Vec<f64> = (0..8).map(|_| b.sample(6.0).unwrap()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn test_zero_sigma_consumes_nothing() {
        let mut source = ShadowingSource::new(7);
        assert_eq!(source.sample(0.0).unwrap(), 0.0);
        assert_eq!(source.draws(), 0);

        let mut fresh = ShadowingSource::new(7);
        assert_eq!(source.sample(3.0).unwrap(), fresh.sample(3.0).unwrap());
    }

    #[test]
    fn test_reseed_restarts_stream() {
        let mut source = ShadowingSource::new(9);
        let first = source.sample(4.0).unwrap();
        source.sample(4.0).unwrap();
        source.reseed(9);
        assert_eq!(source.draws(), 0);
        assert_eq!(source.sample(4.0).unwrap(), first);
    }

    #[test]
    fn test_explicit_sample_bypasses_source() {
        let mut source = ShadowingSource::new(3);
        assert_eq!(source.resolve(Shadowing::Sample(-2.5), 8.0).unwrap(), -2.5);
        assert_eq!(source.draws(), 0);
        assert!(source.resolve(Shadowing::Sample(f64::NAN), 8.0).is_err());
    }

    #[test]
    fn test_negative_sigma_is_domain_error() {
        let mut source = ShadowingSource::new(3);
        assert!(source.sample(-1.0).unwrap_err().is_domain());
    }
}
