//! # mobsim-common
//!
//! Shared primitives for MobSim scenarios: simulated time, planar geometry,
//! unit identities and the error taxonomy used by every engine crate.

mod error;
mod geometry;
mod time;

pub use error::SimError;
pub use geometry::{distance, Point};
pub use time::SimTime;

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Result type for MobSim operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Unique identity of a mobile unit within a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitKey(String);

impl UnitKey {
    /// Creates a unit key from any string-like value.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UnitKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for UnitKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}
