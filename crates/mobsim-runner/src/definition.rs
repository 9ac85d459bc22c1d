//! Declarative scenario files.
//!
//! A scenario file (YAML or JSON) is the declarative form of the
//! [`ScenarioBuilder`] calls:
//!
//! ```yaml
//! name: convoy
//! attributes:
//!   noise_floor_dbm: -95
//!   shadowing_seed: 7
//! map_file: map.json
//! cellular_regions:
//!   - [[0, 0], [100, 0], [100, 100], [0, 100]]
//! units:
//!   - name: truck
//!     type: truck
//!     count: 2
//!     starting_position: [0, 0]
//!     equipment: standard_radio
//!     waypoints:
//!       - points: [[0, 0], [50, 0]]
//!         start: 0
//!         end: 50
//! groups:
//!   convoy: [truck]
//! events:
//!   - action: change_equipment
//!     at: 10
//!     targets: [convoy]
//!     turn_on: true
//!     equipment: cellular_radio
//!   - action: stop_movement
//!     at: 30
//!     targets: [truck_1]
//! links:
//!   - from: truck_0
//!     to: truck_1
//!   - from: truck_0
//!     to_point: [100, 100]
//! ```
//!
//! Targets name a group, a unit batch (all units created by one entry of
//! `units`), or a single unit key, checked in that order. Relative file
//! paths are resolved against the directory of the scenario file.

use crate::error::{Result, RunnerError};
use crate::scenario::{LinkEndpoint, Scenario};
use crate::ScenarioBuilder;
use mobsim_common::{Point, SimTime, UnitKey};
use mobsim_model::{AttributeValue, Equipment, Group, UnitTypeCatalog};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

fn one() -> usize {
    1
}

/// One entry of `units`: a batch of identically configured units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitBatch {
    /// Batch name; units are keyed `"{name}_{i}"`.
    pub name: String,
    /// Unit type name.
    #[serde(rename = "type")]
    pub unit_type: String,
    /// Number of units.
    #[serde(default = "one")]
    pub count: usize,
    /// Position before the first waypoint interval.
    #[serde(default)]
    pub starting_position: Option<Point>,
    /// Equipment switched on at start (one-hot).
    #[serde(default)]
    pub equipment: Option<Equipment>,
    /// Waypoint intervals, in order.
    #[serde(default)]
    pub waypoints: Vec<WaypointDefinition>,
}

/// A waypoint interval with times in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaypointDefinition {
    /// Waypoints to visit.
    pub points: Vec<Point>,
    /// Start time in seconds.
    #[serde(default)]
    pub start: f64,
    /// End time in seconds; omitted for an open end.
    #[serde(default)]
    pub end: Option<f64>,
}

/// A delayed instruction with its time in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub enum EventDefinition {
    /// Stop the targets at `at`.
    StopMovement {
        /// Fire time in seconds.
        at: f64,
        /// Target names.
        targets: Vec<String>,
    },
    /// Switch `equipment` on or off at `at`.
    ChangeEquipment {
        /// Fire time in seconds.
        at: f64,
        /// Target names.
        targets: Vec<String>,
        /// Target state.
        turn_on: bool,
        /// Equipment to switch.
        equipment: Equipment,
    },
}

/// A link to report on while running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkDefinition {
    /// Near-end unit key.
    pub from: String,
    /// Far-end unit key.
    #[serde(default)]
    pub to: Option<String>,
    /// Far-end infrastructure point.
    #[serde(default)]
    pub to_point: Option<Point>,
}

/// A resolved link to report on.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkTarget {
    /// Near-end unit.
    pub from: UnitKey,
    /// Far end.
    pub to: LinkEndpoint,
}

/// A parsed scenario file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioDefinition {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Inline unit type catalog.
    #[serde(default)]
    pub unit_types: Option<UnitTypeCatalog>,
    /// Unit type catalog file, merged over `unit_types`.
    #[serde(default)]
    pub unit_types_file: Option<PathBuf>,
    /// Inline global attributes, applied after `attributes_file`.
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
    /// Global attributes file.
    #[serde(default)]
    pub attributes_file: Option<PathBuf>,
    /// Coverage map file.
    #[serde(default)]
    pub map_file: Option<PathBuf>,
    /// Inline coverage polygons.
    #[serde(default)]
    pub cellular_regions: Vec<Vec<Point>>,
    /// Unit batches.
    #[serde(default)]
    pub units: Vec<UnitBatch>,
    /// Named groups of batch names or unit keys.
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
    /// Delayed instructions.
    #[serde(default)]
    pub events: Vec<EventDefinition>,
    /// Links to report on.
    #[serde(default)]
    pub links: Vec<LinkDefinition>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

fn seconds(secs: f64, what: &str) -> Result<SimTime> {
    SimTime::try_from_secs_f64(secs)
        .map_err(|e| RunnerError::Config(format!("Invalid {} time {}: {}", what, secs, e)))
}

/// Targets resolved while building.
struct Names {
    batches: BTreeMap<String, Vec<UnitKey>>,
    groups: BTreeMap<String, Group>,
}

impl Names {
    fn lookup(&self, builder: &ScenarioBuilder, name: &str) -> Result<Vec<UnitKey>> {
        if let Some(group) = self.groups.get(name) {
            return Ok(group.keys().to_vec());
        }
        if let Some(keys) = self.batches.get(name) {
            return Ok(keys.clone());
        }
        if builder.mobility().contains(name) {
            return Ok(vec![UnitKey::from(name)]);
        }
        Err(RunnerError::Config(format!("Unknown target: {}", name)))
    }

    fn resolve(&self, builder: &ScenarioBuilder, names: &[String]) -> Result<Group> {
        let lists = names
            .iter()
            .map(|name| self.lookup(builder, name))
            .collect::<Result<Vec<_>>>()?;
        let slices: Vec<&[UnitKey]> = lists.iter().map(Vec::as_slice).collect();
        Ok(builder.create_group(&slices)?)
    }

    /// Resolves group `name` after every group it names.
    fn define_group(
        &mut self,
        builder: &ScenarioBuilder,
        definitions: &BTreeMap<String, Vec<String>>,
        name: &str,
        visiting: &mut Vec<String>,
    ) -> Result<()> {
        if self.groups.contains_key(name) {
            return Ok(());
        }
        if visiting.iter().any(|v| v == name) {
            return Err(RunnerError::Config(format!(
                "Group cycle: {} -> {}",
                visiting.join(" -> "),
                name
            )));
        }
        let Some(members) = definitions.get(name) else {
            return Ok(());
        };
        visiting.push(name.to_string());
        for member in members {
            if definitions.contains_key(member) {
                self.define_group(builder, definitions, member, visiting)?;
            }
        }
        visiting.pop();
        let group = self.resolve(builder, members)?;
        self.groups.insert(name.to_string(), group);
        Ok(())
    }
}

impl ScenarioDefinition {
    /// Parses a YAML definition.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parses a JSON definition.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a definition; `.json` files are parsed as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading scenario definition from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        let mut definition = if is_json {
            Self::from_json_str(&contents)?
        } else {
            Self::from_yaml_str(&contents)?
        };
        definition.base_dir = path.parent().map(Path::to_path_buf);
        Ok(definition)
    }

    /// Directory relative paths are resolved against.
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Overrides the directory relative paths are resolved against.
    pub fn set_base_dir(&mut self, dir: impl Into<PathBuf>) {
        self.base_dir = Some(dir.into());
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Replays the definition into a builder.
    pub fn to_builder(&self) -> Result<ScenarioBuilder> {
        let mut builder = ScenarioBuilder::new();

        let mut catalog = self.unit_types.clone().unwrap_or_default();
        if let Some(file) = &self.unit_types_file {
            let loaded = UnitTypeCatalog::from_json_file(self.resolve_path(file))?;
            for name in loaded.names() {
                if let Some(unit_type) = loaded.get(name) {
                    catalog.insert(name, unit_type.clone())?;
                }
            }
        }
        builder.with_unit_types(catalog)?;

        if let Some(file) = &self.attributes_file {
            builder.load_attributes(self.resolve_path(file))?;
        }
        for (name, value) in &self.attributes {
            builder.set_attribute(name.clone(), value.clone())?;
        }

        if let Some(file) = &self.map_file {
            builder.load_map(self.resolve_path(file))?;
        }
        for region in &self.cellular_regions {
            builder.create_cellular_region(region.iter().copied())?;
        }

        let mut names = Names {
            batches: BTreeMap::new(),
            groups: BTreeMap::new(),
        };
        for batch in &self.units {
            let keys = match batch.equipment {
                Some(equipment) => {
                    builder.create_equipped_units(&batch.name, &batch.unit_type, batch.count, equipment)?
                }
                None => builder.create_units(&batch.name, &batch.unit_type, batch.count)?,
            };
            if let Some(position) = batch.starting_position {
                builder.set_starting_position(&keys, position)?;
            }
            for interval in &batch.waypoints {
                let start = seconds(interval.start, "waypoint start")?;
                let end = match interval.end {
                    Some(end) => seconds(end, "waypoint end")?,
                    None => SimTime::MAX,
                };
                builder.set_waypoints(&keys, interval.points.clone(), start, end)?;
            }
            names.batches.insert(batch.name.clone(), keys);
        }

        let mut visiting = Vec::new();
        for name in self.groups.keys() {
            names.define_group(&builder, &self.groups, name, &mut visiting)?;
        }

        for event in &self.events {
            match event {
                EventDefinition::StopMovement { at, targets } => {
                    let group = names.resolve(&builder, targets)?;
                    builder.stop_movement(group.keys(), seconds(*at, "event")?)?;
                }
                EventDefinition::ChangeEquipment {
                    at,
                    targets,
                    turn_on,
                    equipment,
                } => {
                    let group = names.resolve(&builder, targets)?;
                    builder.change_equipment_at_time(group.keys(), seconds(*at, "event")?, *turn_on, *equipment)?;
                }
            }
        }

        info!(
            name = self.name.as_deref().unwrap_or("<unnamed>"),
            batches = self.units.len(),
            groups = self.groups.len(),
            events = self.events.len(),
            "Scenario definition loaded"
        );
        Ok(builder)
    }

    /// Builds the scenario.
    pub fn build(&self) -> Result<Scenario> {
        Ok(self.to_builder()?.build())
    }

    /// Resolves `links` against a built scenario.
    pub fn link_targets(&self, scenario: &Scenario) -> Result<Vec<LinkTarget>> {
        self.links
            .iter()
            .map(|link| {
                let known = |key: &str| {
                    if scenario.mobility().contains(key) {
                        Ok(UnitKey::from(key))
                    } else {
                        Err(RunnerError::Config(format!("Unknown link unit: {}", key)))
                    }
                };
                let from = known(&link.from)?;
                let to = match (&link.to, link.to_point) {
                    (Some(to), None) => LinkEndpoint::Unit(known(to)?),
                    (None, Some(point)) => LinkEndpoint::Point(point),
                    _ => {
                        return Err(RunnerError::Config(format!(
                            "Link from {} needs exactly one of 'to' or 'to_point'",
                            link.from
                        )))
                    }
                };
                Ok(LinkTarget { from, to })
            })
            .collect()
    }
}
