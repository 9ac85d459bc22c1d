//! Unit type catalog.

use crate::EquipmentSet;
use mobsim_common::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Speed used when a unit type does not declare one.
pub const DEFAULT_SPEED: f64 = 1.0;

fn default_speed() -> f64 {
    DEFAULT_SPEED
}

/// Per-type defaults applied when units are created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitType {
    /// Cruise speed in distance units per second.
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Equipment switched on at creation.
    #[serde(default)]
    pub default_equipment: EquipmentSet,
}

impl Default for UnitType {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            default_equipment: EquipmentSet::EMPTY,
        }
    }
}

impl UnitType {
    fn validate(&self, name: &str) -> Result<()> {
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(SimError::validation(format!(
                "Unit type '{}' has invalid speed {}",
                name, self.speed
            )));
        }
        Ok(())
    }
}

/// Catalog of known unit types, keyed by name.
///
/// An empty catalog accepts any type name with [`UnitType::default`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitTypeCatalog {
    types: BTreeMap<String, UnitType>,
}

impl UnitTypeCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a catalog from a JSON object of `name -> UnitType`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json).map_err(SimError::parse)?;
        for (name, unit_type) in &catalog.types {
            unit_type.validate(name)?;
        }
        Ok(catalog)
    }

    /// Loads a catalog from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading unit types from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Adds or replaces a unit type.
    pub fn insert(&mut self, name: impl Into<String>, unit_type: UnitType) -> Result<()> {
        let name = name.into();
        unit_type.validate(&name)?;
        self.types.insert(name, unit_type);
        Ok(())
    }

    /// Looks up a unit type by name.
    pub fn get(&self, name: &str) -> Option<&UnitType> {
        self.types.get(name)
    }

    /// Resolves the defaults for `name`.
    ///
    /// Unknown names are a validation error unless the catalog is empty.
    pub fn resolve(&self, name: &str) -> Result<UnitType> {
        if self.types.is_empty() {
            return Ok(UnitType::default());
        }
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| SimError::validation(format!("Unknown unit type: {}", name)))
    }

    /// Number of declared types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no types are declared.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Declared type names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}
