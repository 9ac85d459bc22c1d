//! Scenario map files.

use mobsim_common::{Point, Result, SimError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of a scenario map file.
///
/// ```json
/// { "cellular_zones": [ [[0, 0], [100, 0], [100, 100], [0, 100]] ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapDefinition {
    /// Coverage polygons, each an ordered vertex ring.
    #[serde(default, alias = "cellular_regions")]
    pub cellular_zones: Vec<Vec<Point>>,
}

impl MapDefinition {
    /// Parses a map from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(SimError::parse)
    }

    /// Reads a map from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }
}
