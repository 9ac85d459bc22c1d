//! Radio equipment carried by units.

use mobsim_common::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A kind of communication equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    /// Line-of-sight standard radio.
    StandardRadio,
    /// Cellular radio, usable inside coverage zones only.
    CellularRadio,
    /// Satellite link.
    SatelliteLink,
}

impl Equipment {
    /// Every equipment kind, in a fixed order.
    pub const ALL: [Equipment; 3] = [
        Equipment::StandardRadio,
        Equipment::CellularRadio,
        Equipment::SatelliteLink,
    ];

    /// Returns the equipment name used in scenario files.
    pub const fn name(&self) -> &'static str {
        match self {
            Equipment::StandardRadio => "standard_radio",
            Equipment::CellularRadio => "cellular_radio",
            Equipment::SatelliteLink => "satellite_link",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Equipment::StandardRadio => 0b001,
            Equipment::CellularRadio => 0b010,
            Equipment::SatelliteLink => 0b100,
        }
    }

    /// Converts three one-hot flags into a single equipment kind.
    ///
    /// Exactly one flag must be set.
    pub fn from_flags(standard_radio: bool, cellular_radio: bool, satellite_link: bool) -> Result<Self> {
        match (standard_radio, cellular_radio, satellite_link) {
            (true, false, false) => Ok(Equipment::StandardRadio),
            (false, true, false) => Ok(Equipment::CellularRadio),
            (false, false, true) => Ok(Equipment::SatelliteLink),
            _ => Err(SimError::validation(format!(
                "Exactly one equipment flag must be set (standard={}, cellular={}, satellite={})",
                standard_radio, cellular_radio, satellite_link
            ))),
        }
    }
}

impl fmt::Display for Equipment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Equipment {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard_radio" | "standard" | "radio" => Ok(Equipment::StandardRadio),
            "cellular_radio" | "cellular" => Ok(Equipment::CellularRadio),
            "satellite_link" | "satellite" => Ok(Equipment::SatelliteLink),
            other => Err(SimError::validation(format!("Unknown equipment: {}", other))),
        }
    }
}

/// The set of equipment switched on for a unit.
///
/// Serialized as a list of equipment names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Equipment>", into = "Vec<Equipment>")]
pub struct EquipmentSet(u8);

impl EquipmentSet {
    /// Nothing switched on.
    pub const EMPTY: EquipmentSet = EquipmentSet(0);

    /// A set with exactly one equipment kind.
    pub const fn only(equipment: Equipment) -> Self {
        Self(equipment.bit())
    }

    /// Builds a set from independent flags.
    pub fn from_flags(standard_radio: bool, cellular_radio: bool, satellite_link: bool) -> Self {
        let mut set = Self::EMPTY;
        set.set(Equipment::StandardRadio, standard_radio);
        set.set(Equipment::CellularRadio, cellular_radio);
        set.set(Equipment::SatelliteLink, satellite_link);
        set
    }

    /// Switches `equipment` on.
    pub fn insert(&mut self, equipment: Equipment) {
        self.0 |= equipment.bit();
    }

    /// Switches `equipment` off.
    pub fn remove(&mut self, equipment: Equipment) {
        self.0 &= !equipment.bit();
    }

    /// Switches `equipment` on or off.
    pub fn set(&mut self, equipment: Equipment, on: bool) {
        if on {
            self.insert(equipment);
        } else {
            self.remove(equipment);
        }
    }

    /// Returns true if `equipment` is on.
    pub const fn contains(&self, equipment: Equipment) -> bool {
        self.0 & equipment.bit() != 0
    }

    /// Equipment present in both sets.
    pub const fn intersection(&self, other: EquipmentSet) -> EquipmentSet {
        EquipmentSet(self.0 & other.0)
    }

    /// Returns true if nothing is on.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of equipment kinds switched on.
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates over the equipment switched on, in [`Equipment::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = Equipment> + '_ {
        Equipment::ALL.into_iter().filter(move |e| self.contains(*e))
    }

    /// Whether the standard radio is on.
    pub const fn standard_radio(&self) -> bool {
        self.contains(Equipment::StandardRadio)
    }

    /// Whether the cellular radio is on.
    pub const fn cellular_radio(&self) -> bool {
        self.contains(Equipment::CellularRadio)
    }

    /// Whether the satellite link is on.
    pub const fn satellite_link(&self) -> bool {
        self.contains(Equipment::SatelliteLink)
    }
}

impl From<Equipment> for EquipmentSet {
    fn from(e: Equipment) -> Self {
        Self::only(e)
    }
}

impl FromIterator<Equipment> for EquipmentSet {
    fn from_iter<I: IntoIterator<Item = Equipment>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for e in iter {
            set.insert(e);
        }
        set
    }
}

impl From<Vec<Equipment>> for EquipmentSet {
    fn from(v: Vec<Equipment>) -> Self {
        v.into_iter().collect()
    }
}

impl From<EquipmentSet> for Vec<Equipment> {
    fn from(set: EquipmentSet) -> Self {
        set.iter().collect()
    }
}

impl fmt::Display for EquipmentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|e| e.name()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_hot_flags() {
        assert_eq!(Equipment::from_flags(true, false, false).unwrap(), Equipment::StandardRadio);
        assert_eq!(Equipment::from_flags(false, true, false).unwrap(), Equipment::CellularRadio);
        assert_eq!(Equipment::from_flags(false, false, true).unwrap(), Equipment::SatelliteLink);
        assert!(Equipment::from_flags(false, false, false).is_err());
        assert!(Equipment::from_flags(true, true, false).unwrap_err().is_validation());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("standard_radio".parse::<Equipment>().unwrap(), Equipment::StandardRadio);
        assert_eq!("Cellular".parse::<Equipment>().unwrap(), Equipment::CellularRadio);
        assert_eq!("satellite_link".parse::<Equipment>().unwrap(), Equipment::SatelliteLink);
        assert!("laser".parse::<Equipment>().is_err());
    }

    #[test]
    fn test_set_operations() {
        let mut set = EquipmentSet::EMPTY;
        assert!(set.is_empty());
        set.insert(Equipment::CellularRadio);
        set.insert(Equipment::SatelliteLink);
        assert!(set.cellular_radio());
        assert!(set.satellite_link());
        assert!(!set.standard_radio());
        assert_eq!(set.len(), 2);

        set.remove(Equipment::CellularRadio);
        assert_eq!(set, EquipmentSet::only(Equipment::SatelliteLink));

        let both = EquipmentSet::from_flags(true, false, true);
        assert_eq!(both.intersection(set), set);
        assert_eq!(both.iter().collect::<Vec<_>>(), vec![Equipment::StandardRadio, Equipment::SatelliteLink]);
    }

    #[test]
    fn test_set_serializes_as_names() {
        let set = EquipmentSet::from_flags(true, true, false);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["standard_radio","cellular_radio"]"#);
        let back: EquipmentSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
