//! # mobsim-model
//!
//! The mutable data model of a MobSim scenario.
//!
//! This crate provides:
//! - [`MobilityState`] - authoritative registry of units and groups, answering
//!   "where is this unit and what is switched on" at any simulated time
//! - [`Unit`] / [`WaypointInterval`] - per-unit waypoint timelines
//! - [`Equipment`] / [`EquipmentSet`] - the three radio kinds as a small set
//! - [`Group`] - immutable bulk-addressing handle over units
//! - [`UnitTypeCatalog`] - per-type defaults (speed, fitted equipment)
//! - [`GlobalAttributes`] - scenario-wide scalar configuration

mod attributes;
mod equipment;
mod group;
mod mobility;
mod unit;
mod unit_types;

pub use attributes::{
    AttributeDef, AttributeDefault, AttributeKind, AttributeValue, GlobalAttributes,
    ALL_ATTRIBUTES, BANDWIDTH_HZ, ERROR_THRESHOLD, NOISE_FLOOR_DBM, PACKET_SIZE_BITS,
    SHADOWING_SEED, SNR_THRESHOLD_DB,
};
pub use equipment::{Equipment, EquipmentSet};
pub use group::Group;
pub use mobility::MobilityState;
pub use unit::{Unit, WaypointInterval};
pub use unit_types::{UnitType, UnitTypeCatalog, DEFAULT_SPEED};
