//! Simulated time.

use crate::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::fmt;

const MICROS_PER_SEC: f64 = 1_000_000.0;

/// A point in simulated time with microsecond resolution.
///
/// [`SimTime::MAX`] stands for "never" / "open-ended" and is what an interval
/// without an explicit end time uses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SimTime(u64);

impl SimTime {
    /// The start of every scenario.
    pub const ZERO: SimTime = SimTime(0);

    /// Open-ended time, later than any finite time.
    pub const MAX: SimTime = SimTime(u64::MAX);

    /// Creates a time from microseconds.
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Creates a time from milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000))
    }

    /// Creates a time from whole seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1_000_000))
    }

    /// Creates a time from fractional seconds.
    ///
    /// Positive infinity maps to [`SimTime::MAX`]. Negative or NaN values are
    /// rejected with [`SimError::Validation`].
    pub fn try_from_secs_f64(secs: f64) -> Result<Self> {
        if secs.is_nan() || secs < 0.0 {
            return Err(SimError::validation(format!(
                "Simulated time must be non-negative, got {}",
                secs
            )));
        }
        let micros = secs * MICROS_PER_SEC;
        if micros >= u64::MAX as f64 {
            Ok(Self::MAX)
        } else {
            Ok(Self(micros.round() as u64))
        }
    }

    /// Creates a time from fractional seconds, clamping invalid input to zero.
    pub fn from_secs_f64(secs: f64) -> Self {
        Self::try_from_secs_f64(secs).unwrap_or(Self::ZERO)
    }

    /// Returns the time in microseconds.
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Returns the time in fractional seconds ([`f64::INFINITY`] for `MAX`).
    pub fn as_secs_f64(&self) -> f64 {
        if self.is_unbounded() {
            f64::INFINITY
        } else {
            self.0 as f64 / MICROS_PER_SEC
        }
    }

    /// Returns true if this is the open-ended time.
    pub const fn is_unbounded(&self) -> bool {
        self.0 == u64::MAX
    }

    /// Adds a number of seconds, saturating at [`SimTime::MAX`].
    pub fn saturating_add_secs(&self, secs: f64) -> Self {
        if self.is_unbounded() {
            return *self;
        }
        let delta = Self::from_secs_f64(secs);
        Self(self.0.saturating_add(delta.0))
    }

    /// Seconds elapsed since `earlier` (zero if `earlier` is later).
    pub fn secs_since(&self, earlier: SimTime) -> f64 {
        self.0.saturating_sub(earlier.0) as f64 / MICROS_PER_SEC
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            write!(f, "t=inf")
        } else {
            write!(f, "t={:.6}s", self.as_secs_f64())
        }
    }
}
