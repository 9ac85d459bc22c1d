//! The scenario context.
//!
//! A [`Scenario`] owns every piece of mutable simulation state: the unit
//! registry, the coverage map, the global attributes, the delayed-instruction
//! scheduler and the shadowing generator. It is built once by a
//! [`ScenarioBuilder`](crate::ScenarioBuilder) and then stepped forward.

use crate::scheduler::{DelayedInstruction, EventScheduler, InstructionId};
use mobsim_common::{distance, Point, Result, SimTime, UnitKey};
use mobsim_link::{evaluate_link, LinkEvaluation, LinkParams, Shadowing, ShadowingSource};
use mobsim_map::CoverageIndex;
use mobsim_metrics::{metric_defs, metrics};
use mobsim_model::{Equipment, EquipmentSet, GlobalAttributes, MobilityState};
use serde::Serialize;
use tracing::{debug, trace};

/// Snapshot of one unit at a simulated time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitStatus {
    /// Unit key.
    pub key: UnitKey,
    /// Query time.
    pub time: SimTime,
    /// Position at `time`.
    pub position: Point,
    /// Equipment switched on.
    pub equipment: EquipmentSet,
    /// Whether the position is inside cellular coverage.
    pub in_coverage: bool,
    /// Whether a stop has taken effect by `time`.
    pub stopped: bool,
}

/// The far end of a link.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LinkEndpoint {
    /// Another unit.
    Unit(UnitKey),
    /// A fixed infrastructure point.
    Point(Point),
}

/// Outcome of evaluating a link.
///
/// When the two ends share no usable medium, `medium` is `None`, capacity is
/// zero and the error probability is one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkReport {
    /// Near end.
    pub from: UnitKey,
    /// Far end.
    pub to: LinkEndpoint,
    /// Evaluation time.
    pub time: SimTime,
    /// Medium carrying the link.
    pub medium: Option<Equipment>,
    /// Distance between the ends.
    pub distance: f64,
    /// Shannon capacity (bits/s).
    pub capacity_bps: f64,
    /// Packet error probability.
    pub error_probability: f64,
    /// Full radio evaluation, when a medium was found.
    pub evaluation: Option<LinkEvaluation>,
}

/// What one end of a link can use.
#[derive(Debug, Clone, Copy)]
struct LinkEnd {
    equipment: EquipmentSet,
    in_coverage: bool,
}

/// Picks the medium for a link.
///
/// Standard radio is preferred, then cellular (both ends inside coverage),
/// then satellite.
fn select_medium(a: LinkEnd, b: LinkEnd) -> Option<Equipment> {
    let shared = a.equipment.intersection(b.equipment);
    if shared.standard_radio() {
        Some(Equipment::StandardRadio)
    } else if shared.cellular_radio() && a.in_coverage && b.in_coverage {
        Some(Equipment::CellularRadio)
    } else if shared.satellite_link() {
        Some(Equipment::SatelliteLink)
    } else {
        None
    }
}

/// A built, steppable scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub(crate) mobility: MobilityState,
    pub(crate) coverage: CoverageIndex,
    pub(crate) attributes: GlobalAttributes,
    pub(crate) scheduler: EventScheduler,
    pub(crate) shadowing: ShadowingSource,
}

impl Scenario {
    /// The unit registry.
    pub fn mobility(&self) -> &MobilityState {
        &self.mobility
    }

    /// The coverage map.
    pub fn coverage(&self) -> &CoverageIndex {
        &self.coverage
    }

    /// Global attributes.
    pub fn attributes(&self) -> &GlobalAttributes {
        &self.attributes
    }

    /// The delayed-instruction scheduler.
    pub fn scheduler(&self) -> &EventScheduler {
        &self.scheduler
    }

    /// The shadowing generator.
    pub fn shadowing(&self) -> &ShadowingSource {
        &self.shadowing
    }

    /// Current simulation time.
    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    /// Advances the clock, firing every instruction due by `time`.
    pub fn advance_to(&mut self, time: SimTime) -> Result<Vec<DelayedInstruction>> {
        self.scheduler.advance_to(time, &mut self.mobility)
    }

    /// Schedules a stop after the scenario has been built.
    pub fn stop_movement(&mut self, unit_keys: &[UnitKey], at: SimTime) -> Result<InstructionId> {
        self.scheduler.add_stop_movement(&self.mobility, unit_keys, at)
    }

    /// Schedules an equipment change after the scenario has been built.
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

    /// Cancels a pending instruction.
    pub fn cancel(&mut self, id: InstructionId) -> Result<()> {
        self.scheduler.cancel(id)
    }


    /// Reseeds the shadowing generator.
    pub fn reset_shadowing(&mut self, seed: u64) {
        debug!("Shadowing reseeded with {}", seed);
        self.shadowing.reseed(seed);
    }

    /// Position, equipment and coverage of a unit at `time`.
    ///
    /// Equipment reflects instructions fired so far, not those due by `time`.
    pub fn unit_status(&self, key: &str, time: SimTime) -> Result<UnitStatus> {
        let position = self.mobility.position_at(key, time)?;
        let equipment = self.mobility.equipment_at(key)?;
        let stopped = self
            .mobility
            .unit(key)
            .and_then(|u| u.stopped_at())
            .map_or(false, |stop| stop <= time);
        Ok(UnitStatus {
            key: UnitKey::from(key),
            time,
            position,
            equipment,
            in_coverage: self.coverage.contains(position),
            stopped,
        })
    }

    /// Status of every unit at the current time, in creation order.
    pub fn unit_statuses(&self) -> Result<Vec<UnitStatus>> {
        let now = self.now();
        self.mobility
            .units()
            .map(|unit| self.unit_status(unit.key().as_str(), now))
            .collect()
    }

    /// Link parameters built from the global attributes.
    pub fn default_link_params(&self) -> LinkParams {
        LinkParams {
            snr_threshold_db: self.attributes.snr_threshold_db(),
            bandwidth_hz: self.attributes.bandwidth_hz(),
            packet_size_bits: self.attributes.packet_size_bits(),
            error_threshold: self.attributes.error_threshold(),
            ..LinkParams::default()
        }
    }

    /// Evaluates the link between two units at the current time.
    pub fn link_between(
        &mut self,
        from: &str,
        to: &str,
        params: &LinkParams,
        shadowing: Shadowing,
    ) -> Result<LinkReport> {
        let now = self.now();
        let a = self.unit_status(from, now)?;
        let b = self.unit_status(to, now)?;
        let far = LinkEnd {
            equipment: b.equipment,
            in_coverage: b.in_coverage,
        };
        self.evaluate(a, LinkEndpoint::Unit(b.key), b.position, far, params, shadowing)
    }

    /// Evaluates the link between a unit and a fixed infrastructure point.
    ///
    /// The point carries every kind of equipment; cellular still needs the
    /// point to be inside coverage.
    pub fn link_to_point(
        &mut self,
        from: &str,
        point: Point,
        params: &LinkParams,
        shadowing: Shadowing,
    ) -> Result<LinkReport> {
        let a = self.unit_status(from, self.now())?;
        let far = LinkEnd {
            equipment: Equipment::ALL.into_iter().collect(),
            in_coverage: self.coverage.contains(point),
        };
        self.evaluate(a, LinkEndpoint::Point(point), point, far, params, shadowing)
    }

    fn evaluate(
        &mut self,
        near: UnitStatus,
        to: LinkEndpoint,
        far_position: Point,
        far: LinkEnd,
        params: &LinkParams,
        shadowing: Shadowing,
    ) -> Result<LinkReport> {
        let near_end = LinkEnd {
            equipment: near.equipment,
            in_coverage: near.in_coverage,
        };
        let medium = select_medium(near_end, far);
        let distance = distance(&near.position, &far_position);

        let evaluation = match medium {
            Some(_) => Some(evaluate_link(
                params,
                distance,
                shadowing,
                self.attributes.noise_floor_dbm(),
                &mut self.shadowing,
            )?),
            None => None,
        };
        let (capacity_bps, error_probability) = evaluation
            .as_ref()
            .map_or((0.0, 1.0), |e| (e.capacity_bps, e.error_probability));

        let label = medium.map_or("none", |m| m.name());
        metrics::counter!(metric_defs::LINK_EVALUATIONS.name, "medium" => label).increment(1);
        metrics::histogram!(metric_defs::LINK_CAPACITY.name, "medium" => label).record(capacity_bps);
        metrics::histogram!(metric_defs::LINK_ERROR_PROBABILITY.name, "medium" => label)
            .record(error_probability);
        trace!(
            from = %near.key,
            medium = label,
            distance,
            capacity_bps,
            error_probability,
            "link evaluated"
        );

        Ok(LinkReport {
            from: near.key,
            to,
            time: near.time,
            medium,
            distance,
            capacity_bps,
            error_probability,
            evaluation,
        })
    }
}
