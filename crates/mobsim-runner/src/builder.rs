//! Programmatic scenario authoring.

use crate::scenario::Scenario;
use crate::scheduler::{EventScheduler, InstructionId};
use mobsim_common::{Point, Result, SimError, SimTime, UnitKey};
use mobsim_link::ShadowingSource;
use mobsim_map::{CoverageIndex, ZoneId};
use mobsim_model::{AttributeValue, Equipment, GlobalAttributes, Group, MobilityState, UnitTypeCatalog};
use std::path::Path;
use tracing::info;

/// Collects scenario authoring calls and produces a [`Scenario`].
///
/// Every call validates its input immediately; a rejected call changes
/// nothing.
///
/// # Example
///
/// ```
/// use mobsim_common::{Point, SimTime};
/// use mobsim_model::Equipment;
/// use mobsim_runner::ScenarioBuilder;
///
/// let mut builder = ScenarioBuilder::new();
/// let scouts = builder.create_units("scout", "infantry", 2).unwrap();
/// builder.equip(&scouts, Equipment::StandardRadio).unwrap();
/// builder
///     .set_waypoints(&scouts, vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
///                    SimTime::ZERO, SimTime::from_secs(10))
///     .unwrap();
/// let scenario = builder.build();
/// assert_eq!(scenario.mobility().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct ScenarioBuilder {
    mobility: MobilityState,
    coverage: CoverageIndex,
    attributes: GlobalAttributes,
    scheduler: EventScheduler,
}

impl ScenarioBuilder {
    /// Creates a builder that accepts any unit type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts unit creation to the types in `catalog`.
    ///
    /// Must be called before any unit is created.
    pub fn with_unit_types(&mut self, catalog: UnitTypeCatalog) -> Result<()> {
        if !self.mobility.is_empty() {
            return Err(SimError::validation(
                "Unit types must be set before units are created",
            ));
        }
        self.mobility = MobilityState::with_unit_types(catalog);
        Ok(())
    }

    /// Creates `count` units named `"{name}_{i}"`.
    ///
    /// Units start with their type's `default_equipment`; use
    /// [`create_equipped_units`](Self::create_equipped_units) to switch one
    /// piece of equipment on at creation instead.
    pub fn create_units(&mut self, name: &str, unit_type: &str, count: usize) -> Result<Vec<UnitKey>> {
        self.mobility.create_units(name, unit_type, count)
    }

    /// Creates `count` units with exactly `equipment` switched on.
    pub fn create_equipped_units(
        &mut self,
        name: &str,
        unit_type: &str,
        count: usize,
        equipment: Equipment,
    ) -> Result<Vec<UnitKey>> {
        let keys = self.mobility.create_units(name, unit_type, count)?;
        self.mobility.equip(&keys, equipment)?;
        Ok(keys)
    }

    /// Groups units from several lists.
    pub fn create_group(&self, unit_lists: &[&[UnitKey]]) -> Result<Group> {
        self.mobility.create_group(unit_lists)
    }

    /// Switches on exactly `equipment` for each unit.
    pub fn equip(&mut self, unit_keys: &[UnitKey], equipment: Equipment) -> Result<()> {
        self.mobility.equip(unit_keys, equipment)
    }

    /// Sets the position units hold before their first waypoint interval.
    pub fn set_starting_position(&mut self, unit_keys: &[UnitKey], position: Point) -> Result<()> {
        self.mobility.set_starting_position(unit_keys, position)
    }

    /// Appends a waypoint interval; use [`SimTime::MAX`] for an open end.
    pub fn set_waypoints(
        &mut self,
        unit_keys: &[UnitKey],
        waypoints: Vec<Point>,
        start_time: SimTime,
        end_time: SimTime,
    ) -> Result<()> {
        self.mobility.set_waypoints(unit_keys, waypoints, start_time, end_time)
    }

    /// Adds a cellular coverage polygon.
    pub fn create_cellular_region(&mut self, vertices: impl IntoIterator<Item = Point>) -> Result<ZoneId> {
        self.coverage.add_zone(vertices)
    }

    /// Adds every coverage zone in a JSON map file.
    pub fn load_map(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        self.coverage.load_map(path)
    }

    /// Schedules the units to stop at `at`.
    pub fn stop_movement(&mut self, unit_keys: &[UnitKey], at: SimTime) -> Result<InstructionId> {
        self.scheduler.add_stop_movement(&self.mobility, unit_keys, at)
    }

    /// Schedules `equipment` to be switched on or off at `at`.
    pub fn change_equipment_at_time(
        &mut self,
        unit_keys: &[UnitKey],
        at: SimTime,
        turn_on: bool,
        equipment: Equipment,
    ) -> Result<InstructionId> {
        self.scheduler
            .add_change_equipment(&self.mobility, unit_keys, at, turn_on, equipment)
    }


    /// Sets a global attribute.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Result<()> {
        self.attributes.set(name, value)
    }

    /// Merges attributes from a JSON file over the current ones.
    pub fn load_attributes(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let loaded = GlobalAttributes::from_json_file(path)?;
        self.attributes
            .extend(loaded.iter().map(|(name, value)| (name.to_string(), value.clone())))
    }

    /// Read access to the units registered so far.
    pub fn mobility(&self) -> &MobilityState {
        &self.mobility
    }

    /// Read access to the attributes set so far.
    pub fn attributes(&self) -> &GlobalAttributes {
        &self.attributes
    }

    /// Freezes the coverage map and seeds shadowing from `shadowing_seed`.
    pub fn build(self) -> Scenario {
        let mut coverage = self.coverage;
        coverage.freeze();
        let seed = self.attributes.shadowing_seed();
        info!(
            units = self.mobility.len(),
            zones = coverage.len(),
            instructions = self.scheduler.pending_count(),
            seed,
            "Scenario built"
        );
        Scenario {
            mobility: self.mobility,
            coverage,
            attributes: self.attributes,
            scheduler: self.scheduler,
            shadowing: ShadowingSource::new(seed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mobsim_model::UnitType;

    #[test]
    fn test_unit_types_must_come_first() {
        let mut builder = ScenarioBuilder::new();
        builder.create_units("a", "x", 1).unwrap();
        assert!(builder.with_unit_types(UnitTypeCatalog::new()).is_err());
    }

    #[test]
    fn test_unknown_unit_in_instruction() {
        let mut builder = ScenarioBuilder::new();
        let mut keys = builder.create_units("a", "x", 1).unwrap();
        keys.push(UnitKey::from("nobody"));
        assert!(builder.stop_movement(&keys, SimTime::from_secs(1)).is_err());
        assert!(builder
            .change_equipment_at_time(&keys, SimTime::from_secs(1), true, Equipment::CellularRadio)
            .is_err());
        assert_eq!(builder.build().scheduler().pending_count(), 0);
    }

    #[test]
    fn test_create_equipped_units() {
        let mut builder = ScenarioBuilder::new();
        let keys = builder
            .create_equipped_units("radio", "scout", 2, Equipment::StandardRadio)
            .unwrap();
        for key in &keys {
            let equipment = builder.mobility().equipment_at(key.as_str()).unwrap();
            assert!(equipment.standard_radio());
            assert_eq!(equipment.len(), 1);
        }
        assert!(builder
            .create_equipped_units("radio", "scout", 1, Equipment::CellularRadio)
            .is_err());
    }

    #[test]
    fn test_build_freezes_and_seeds() {
        let mut builder = ScenarioBuilder::new();
        let mut catalog = UnitTypeCatalog::new();
        catalog.insert("truck", UnitType::default()).unwrap();
        builder.with_unit_types(catalog).unwrap();
        builder.create_units("t", "truck", 1).unwrap();
        builder
            .create_cellular_region(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)])
            .unwrap();
        builder.set_attribute("shadowing_seed", 42i64).unwrap();

        let scenario = builder.build();
        assert!(scenario.coverage().is_frozen());
        assert_eq!(scenario.shadowing().seed(), 42);
        assert_eq!(scenario.coverage().len(), 1);
    }
}
