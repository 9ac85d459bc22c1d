//! Error types shared by the MobSim engines.

use crate::{SimTime, UnitKey};
use thiserror::Error;

/// Errors that can occur while building or evaluating a scenario.
#[derive(Debug, Error)]
pub enum SimError {
    /// Malformed input to a construction call (degenerate polygon,
    /// unknown unit key, empty waypoint list, ...).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Numerically invalid physical parameters (negative distance,
    /// non-positive bandwidth, ...).
    #[error("Domain error: {0}")]
    Domain(String),

    /// The scheduler clock was asked to move backwards.
    #[error("Simulation clock cannot move backwards from {current} to {requested}")]
    Order {
        /// Time of the previous advance.
        current: SimTime,
        /// Time that was requested.
        requested: SimTime,
    },

    /// I/O error reading a scenario input file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A scenario input file could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl SimError {
    /// Creates a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a domain error.
    pub fn domain(msg: impl Into<String>) -> Self {
        Self::Domain(msg.into())
    }

    /// Creates the validation error reported for an unregistered unit.
    pub fn unknown_unit(key: &UnitKey) -> Self {
        Self::Validation(format!("Unknown unit: {}", key))
    }

    /// Creates a parse error from any displayable source error.
    pub fn parse(err: impl std::fmt::Display) -> Self {
        Self::Parse(err.to_string())
    }

    /// Returns true for [`SimError::Validation`].
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true for [`SimError::Domain`].
    pub fn is_domain(&self) -> bool {
        matches!(self, Self::Domain(_))
    }

    /// Returns true for [`SimError::Order`].
    pub fn is_order(&self) -> bool {
        matches!(self, Self::Order { .. })
    }
}
