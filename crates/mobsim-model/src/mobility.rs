//! The unit registry and its time-varying state.

use crate::{Equipment, EquipmentSet, Group, Unit, UnitTypeCatalog, WaypointInterval};
use mobsim_common::{Point, Result, SimError, SimTime, UnitKey};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Authoritative registry of units.
///
/// Answers where a unit is and what it has switched on at a simulated time.
/// Bulk operations validate every key before mutating anything, so a call
/// with one unknown key leaves the state untouched.
#[derive(Debug, Clone, Default)]
pub struct MobilityState {
    units: Vec<Unit>,
    index: HashMap<UnitKey, usize>,
    unit_types: UnitTypeCatalog,
}

impl MobilityState {
    /// Creates an empty registry that accepts any unit type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry restricted to the given unit types.
    pub fn with_unit_types(unit_types: UnitTypeCatalog) -> Self {
        Self {
            unit_types,
            ..Self::default()
        }
    }

    /// The unit type catalog.
    pub fn unit_types(&self) -> &UnitTypeCatalog {
        &self.unit_types
    }

    /// Creates `count` units keyed `"{name}_{i}"` for `i` in `0..count`.
    pub fn create_units(&mut self, name: &str, unit_type: &str, count: usize) -> Result<Vec<UnitKey>> {
        if count == 0 {
            return Err(SimError::validation(format!(
                "Cannot create zero units named '{}'",
                name
            )));
        }
        let defaults = self.unit_types.resolve(unit_type)?;
        let keys: Vec<UnitKey> = (0..count).map(|i| UnitKey::new(format!("{}_{}", name, i))).collect();
        if let Some(dup) = keys.iter().find(|k| self.index.contains_key(*k)) {
            return Err(SimError::validation(format!("Duplicate unit key: {}", dup)));
        }

        for key in &keys {
            self.insert(Unit::new(key.clone(), unit_type, defaults.speed, defaults.default_equipment));
        }
        debug!("Created {} units of type '{}' named '{}'", count, unit_type, name);
        Ok(keys)
    }

    /// Registers a single unit under an explicit key.
    pub fn add_unit(&mut self, key: impl Into<UnitKey>, unit_type: &str) -> Result<UnitKey> {
        let key = key.into();
        if self.index.contains_key(&key) {
            return Err(SimError::validation(format!("Duplicate unit key: {}", key)));
        }
        let defaults = self.unit_types.resolve(unit_type)?;
        self.insert(Unit::new(key.clone(), unit_type, defaults.speed, defaults.default_equipment));
        Ok(key)
    }

    fn insert(&mut self, unit: Unit) {
        self.index.insert(unit.key.clone(), self.units.len());
        self.units.push(unit);
    }

    fn resolve(&self, keys: &[UnitKey]) -> Result<Vec<usize>> {
        keys.iter()
            .map(|key| self.index.get(key).copied().ok_or_else(|| SimError::unknown_unit(key)))
            .collect()
    }

    fn resolve_one(&self, key: &str) -> Result<&Unit> {
        self.index
            .get(key)
            .map(|&i| &self.units[i])
            .ok_or_else(|| SimError::unknown_unit(&UnitKey::from(key)))
    }

    /// Creates a group from a list of unit lists.
    pub fn create_group(&self, unit_lists: &[&[UnitKey]]) -> Result<Group> {
        let flat: Vec<&UnitKey> = unit_lists.iter().flat_map(|list| list.iter()).collect();
        if let Some(unknown) = flat.iter().find(|k| !self.index.contains_key(**k)) {
            return Err(SimError::unknown_unit(unknown));
        }
        Ok(Group::from_keys(flat))
    }

    /// Looks up a unit.
    pub fn unit(&self, key: &str) -> Option<&Unit> {
        self.index.get(key).map(|&i| &self.units[i])
    }

    /// All units in creation order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    /// Number of registered units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true if no units are registered.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Returns true if `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Sets the position units hold before their first interval starts.
    pub fn set_starting_position(&mut self, keys: &[UnitKey], position: Point) -> Result<()> {
        if !position.is_finite() {
            return Err(SimError::validation(format!("Starting position {} is not finite", position)));
        }
        for i in self.resolve(keys)? {
            self.units[i].starting_position = position;
        }
        Ok(())
    }

    /// Appends a waypoint interval to each unit's timeline.
    pub fn set_waypoints(
        &mut self,
        keys: &[UnitKey],
        waypoints: Vec<Point>,
        start_time: SimTime,
        end_time: SimTime,
    ) -> Result<()> {
        let interval = WaypointInterval::new(waypoints, start_time, end_time)?;
        for i in self.resolve(keys)? {
            self.units[i].waypoints_timeline.push(interval.clone());
        }
        Ok(())
    }

    /// Switches on exactly `equipment`, switching everything else off.
    pub fn equip(&mut self, keys: &[UnitKey], equipment: Equipment) -> Result<()> {
        for i in self.resolve(keys)? {
            self.units[i].equipment = EquipmentSet::only(equipment);
        }
        Ok(())
    }

    /// Position of a unit at `time`.
    pub fn position_at(&self, key: &str, time: SimTime) -> Result<Point> {
        Ok(self.resolve_one(key)?.position_at(time))
    }

    /// Equipment currently switched on for a unit.
    pub fn equipment_at(&self, key: &str) -> Result<EquipmentSet> {
        Ok(self.resolve_one(key)?.equipment)
    }

    /// Freezes units in place from `at` onwards.
    ///
    /// A unit that is already stopped keeps the earlier stop time.
    pub fn apply_stop_movement(&mut self, keys: &[UnitKey], at: SimTime) -> Result<()> {
        for i in self.resolve(keys)? {
            let unit = &mut self.units[i];
            let stop = unit.stopped_at.map_or(at, |prev| prev.min(at));
            trace!("Unit {} stopped at {}", unit.key, stop);
            unit.stopped_at = Some(stop);
        }
        Ok(())
    }

    /// Sets each equipment in `targets` to `turn_on`; other equipment is untouched.
    pub fn apply_change_equipment(&mut self, keys: &[UnitKey], turn_on: bool, targets: EquipmentSet) -> Result<()> {
        for i in self.resolve(keys)? {
            let unit = &mut self.units[i];
            for equipment in targets.iter() {
                unit.equipment.set(equipment, turn_on);
            }
            trace!("Unit {} equipment now {}", unit.key, unit.equipment);
        }
        Ok(())
    }
}
