//! Coverage index over all zones of a scenario map.

use crate::{CoverageZone, MapDefinition, ZoneId};
use mobsim_common::{Point, Result, SimError};
use mobsim_metrics::{metric_defs, metrics};
use std::path::Path;
use tracing::{debug, info};

/// The set of cellular coverage zones of a scenario.
///
/// Zones are appended while the scenario is being built and the index is
/// frozen afterwards. Queries scan every zone (with a bounding-box reject
/// first); scenario maps hold a handful of zones, so no spatial tree is kept.
#[derive(Debug, Clone, Default)]
pub struct CoverageIndex {
    zones: Vec<CoverageZone>,
    frozen: bool,
}

impl CoverageIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a coverage polygon.
    ///
    /// Fails with [`SimError::Validation`] if the polygon has fewer than
    /// three vertices, contains non-finite coordinates, or the index has
    /// been frozen.
    pub fn add_zone(&mut self, vertices: impl IntoIterator<Item = Point>) -> Result<ZoneId> {
        if self.frozen {
            return Err(SimError::validation(
                "Coverage zones cannot be added after the scenario is built",
            ));
        }
        let id = ZoneId(self.zones.len());
        let zone = CoverageZone::new(id, vertices.into_iter().collect())?;
        debug!(zone = %id, vertices = zone.vertices().len(), "coverage zone added");
        self.zones.push(zone);
        Ok(id)
    }

    /// Returns true if `point` is inside (or on the boundary of) any zone.
    pub fn contains(&self, point: Point) -> bool {
        metrics::counter!(metric_defs::COVERAGE_QUERIES.name).increment(1);
        let hit = self.zones.iter().any(|zone| zone.contains(point));
        if hit {
            metrics::counter!(metric_defs::COVERAGE_HITS.name).increment(1);
        }
        hit
    }

    /// All zones containing `point`, in registration order.
    pub fn zones_containing(&self, point: Point) -> Vec<ZoneId> {
        self.zones
            .iter()
            .filter(|zone| zone.contains(point))
            .map(CoverageZone::id)
            .collect()
    }

    /// Looks up a zone by id.
    pub fn zone(&self, id: ZoneId) -> Option<&CoverageZone> {
        self.zones.get(id.0)
    }

    /// Iterates over all zones.
    pub fn zones(&self) -> impl Iterator<Item = &CoverageZone> {
        self.zones.iter()
    }

    /// Number of zones.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Returns true if no zone has been added.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Stops accepting new zones.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Returns true once [`freeze`](Self::freeze) has been called.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Adds every zone of a map definition, returning how many were added.
    ///
    /// Either all zones are added or none.
    pub fn add_map(&mut self, map: &MapDefinition) -> Result<usize> {
        let mut staged = self.clone();
        for zone in &map.cellular_zones {
            staged.add_zone(zone.iter().copied())?;
        }
        let added = staged.len() - self.len();
        *self = staged;
        Ok(added)
    }

    /// Loads a JSON map file and adds its zones.
    pub fn load_map(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let map = MapDefinition::from_json_file(path)?;
        let added = self.add_map(&map)?;
        info!(path = %path.display(), zones = added, "map loaded");
        Ok(added)
    }
}
