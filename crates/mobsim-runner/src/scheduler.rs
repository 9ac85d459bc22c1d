//! Delayed-instruction scheduler.
//!
//! Instructions are queued by fire time and applied to a [`MobilityState`]
//! when the simulation clock reaches them. Equal fire times fire in insertion
//! order, so a replay of the same calls always produces the same state.

use mobsim_common::{Result, SimError, SimTime, UnitKey};
use mobsim_metrics::{metric_defs, metrics};
use mobsim_model::{Equipment, EquipmentSet, MobilityState};
use serde::Serialize;
use std::collections::BinaryHeap;
use std::fmt;
use tracing::{debug, trace};

// ============================================================================
// Instruction Types
// ============================================================================

/// Identity of a scheduled instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct InstructionId(u64);

impl InstructionId {
    /// Raw id value.
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstructionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What an instruction does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum InstructionKind {
    /// Freeze the target units in place.
    StopMovement,
    /// Switch one piece of equipment on or off.
    ChangeEquipment {
        /// Target state.
        turn_on: bool,
        /// The equipment to switch.
        equipment: Equipment,
    },
}

impl InstructionKind {
    /// Metric label for this kind.
    pub const fn label(&self) -> &'static str {
        match self {
            InstructionKind::StopMovement => "stop_movement",
            InstructionKind::ChangeEquipment { .. } => "change_equipment",
        }
    }
}

/// Lifecycle of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionState {
    /// Waiting for its fire time.
    Pending,
    /// Applied to unit state.
    Fired,
    /// Discarded before firing.
    Cancelled,
}

/// A scheduled mutation of unit state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelayedInstruction {
    /// Instruction identity.
    pub id: InstructionId,
    /// When the instruction fires.
    pub fire_time: SimTime,
    /// Units the instruction applies to.
    pub unit_keys: Vec<UnitKey>,
    /// The mutation.
    #[serde(flatten)]
    pub kind: InstructionKind,
}

impl DelayedInstruction {
    fn apply(&self, mobility: &mut MobilityState) -> Result<()> {
        match self.kind {
            InstructionKind::StopMovement => mobility.apply_stop_movement(&self.unit_keys, self.fire_time),
            InstructionKind::ChangeEquipment { turn_on, equipment } => {
                mobility.apply_change_equipment(&self.unit_keys, turn_on, EquipmentSet::only(equipment))
            }
        }
    }
}

/// Heap entry; ids increase with insertion so they break fire-time ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueueEntry {
    fire_time: SimTime,
    id: InstructionId,
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reverse ordering for min-heap (earliest time first, then lowest id)
        other
            .fire_time
            .cmp(&self.fire_time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

// ============================================================================
// Event Scheduler
// ============================================================================

/// Time-ordered queue of delayed instructions.
#[derive(Debug, Clone, Default)]
pub struct EventScheduler {
    queue: BinaryHeap<QueueEntry>,
    instructions: Vec<DelayedInstruction>,
    states: Vec<InstructionState>,
    pending: usize,
    now: SimTime,
}

impl EventScheduler {
    /// Creates an empty scheduler with its clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Time of the last advance.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Number of instructions still waiting to fire.
    pub fn pending_count(&self) -> usize {
        self.pending
    }

    /// Lifecycle state of an instruction.
    pub fn state(&self, id: InstructionId) -> Option<InstructionState> {
        self.states.get(id.0 as usize).copied()
    }

    /// Looks up an instruction.
    pub fn instruction(&self, id: InstructionId) -> Option<&DelayedInstruction> {
        self.instructions.get(id.0 as usize)
    }

    /// All instructions in insertion order.
    pub fn instructions(&self) -> impl Iterator<Item = (&DelayedInstruction, InstructionState)> {
        self.instructions.iter().zip(self.states.iter().copied())
    }

    /// Fire time of the next pending instruction.
    pub fn next_fire_time(&self) -> Option<SimTime> {
        self.queue
            .iter()
            .filter(|e| self.states[e.id.0 as usize] == InstructionState::Pending)
            .map(|e| e.fire_time)
            .min()
    }

    /// Schedules units to stop moving at `fire_time`.
    ///
    /// Every key must be registered in `mobility`.
    pub fn add_stop_movement(
        &mut self,
        mobility: &MobilityState,
        unit_keys: &[UnitKey],
        fire_time: SimTime,
    ) -> Result<InstructionId> {
        self.push(mobility, unit_keys, fire_time, InstructionKind::StopMovement)
    }

    /// Schedules one piece of equipment to be switched on or off at `fire_time`.
    ///
    /// Every key must be registered in `mobility`.
    pub fn add_change_equipment(
        &mut self,
        mobility: &MobilityState,
        unit_keys: &[UnitKey],
        fire_time: SimTime,
        turn_on: bool,
        equipment: Equipment,
    ) -> Result<InstructionId> {
        self.push(
            mobility,
            unit_keys,
            fire_time,
            InstructionKind::ChangeEquipment { turn_on, equipment },
        )
    }

    fn push(
        &mut self,
        mobility: &MobilityState,
        unit_keys: &[UnitKey],
        fire_time: SimTime,
        kind: InstructionKind,
    ) -> Result<InstructionId> {
        if unit_keys.is_empty() {
            return Err(SimError::validation("Instruction needs at least one target unit"));
        }
        if let Some(unknown) = first_unknown(mobility, unit_keys) {
            return Err(SimError::unknown_unit(unknown));
        }
        if fire_time.is_unbounded() {
            return Err(SimError::validation("Instruction fire time must be finite"));
        }
        if fire_time < self.now {
            return Err(SimError::validation(format!(
                "Instruction fire time {} is before the current time {}",
                fire_time, self.now
            )));
        }

        let id = InstructionId(self.instructions.len() as u64);
        self.instructions.push(DelayedInstruction {
            id,
            fire_time,
            unit_keys: unit_keys.to_vec(),
            kind,
        });
        self.states.push(InstructionState::Pending);
        self.queue.push(QueueEntry { fire_time, id });
        self.pending += 1;

        debug!("Scheduled {} {} at {} for {} units", kind.label(), id, fire_time, unit_keys.len());
        metrics::counter!(metric_defs::SCHEDULER_SCHEDULED.name, "kind" => kind.label()).increment(1);
        metrics::gauge!(metric_defs::SCHEDULER_PENDING.name).set(self.pending as f64);
        Ok(id)
    }

    /// Cancels a pending instruction.
    pub fn cancel(&mut self, id: InstructionId) -> Result<()> {
        match self.states.get_mut(id.0 as usize) {
            Some(state @ InstructionState::Pending) => {
                *state = InstructionState::Cancelled;
                self.pending -= 1;
                debug!("Cancelled instruction {}", id);
                metrics::counter!(metric_defs::SCHEDULER_CANCELLED.name).increment(1);
                metrics::gauge!(metric_defs::SCHEDULER_PENDING.name).set(self.pending as f64);
                Ok(())
            }
            Some(state) => Err(SimError::validation(format!(
                "Instruction {} cannot be cancelled in state {:?}",
                id, state
            ))),
            None => Err(SimError::validation(format!("Unknown instruction {}", id))),
        }
    }

    /// Moves the clock to `time`, applying every pending instruction due at or
    /// before it in (fire time, insertion) order.
    ///
    /// Returns the instructions fired by this call. Advancing to the current
    /// time again is a no-op; moving the clock backwards is an order error.
    /// The targets of every due instruction are checked before any is
    /// applied: on error nothing fires and the clock stays where it was.
    pub fn advance_to(&mut self, time: SimTime, mobility: &mut MobilityState) -> Result<Vec<DelayedInstruction>> {
        if time < self.now {
            return Err(SimError::Order {
                current: self.now,
                requested: time,
            });
        }

        let mut due = Vec::new();
        while let Some(entry) = self.queue.peek().copied() {
            if entry.fire_time > time {
                break;
            }
            self.queue.pop();
            if self.states[entry.id.0 as usize] == InstructionState::Pending {
                due.push(entry);
            }
        }

        let unknown = due
            .iter()
            .find_map(|e| first_unknown(mobility, &self.instructions[e.id.0 as usize].unit_keys))
            .map(SimError::unknown_unit);
        if let Some(err) = unknown {
            self.queue.extend(due);
            return Err(err);
        }

        let mut fired = Vec::with_capacity(due.len());
        for entry in due {
            let index = entry.id.0 as usize;
            let instruction = &self.instructions[index];
            instruction.apply(mobility)?;
            trace!("Fired {} {} at {}", instruction.kind.label(), instruction.id, instruction.fire_time);
            metrics::counter!(metric_defs::SCHEDULER_FIRED.name, "kind" => instruction.kind.label())
                .increment(1);

            self.states[index] = InstructionState::Fired;
            self.pending -= 1;
            fired.push(instruction.clone());
        }

        self.now = time;
        metrics::gauge!(metric_defs::SCHEDULER_PENDING.name).set(self.pending as f64);
        if !fired.is_empty() {
            debug!("Advanced to {}: fired {} instructions, {} pending", time, fired.len(), self.pending);
        }
        Ok(fired)
    }
}

fn first_unknown<'a>(mobility: &MobilityState, unit_keys: &'a [UnitKey]) -> Option<&'a UnitKey> {
    unit_keys.iter().find(|k| !mobility.contains(k.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mobsim_common::Point;

    fn secs(s: u64) -> SimTime {
        SimTime::from_secs(s)
    }

    fn setup() -> (MobilityState, Vec<UnitKey>) {
        let mut state = MobilityState::new();
        let keys = state.create_units("u", "scout", 2).unwrap();
        (state, keys)
    }

    #[test]
    fn test_fires_at_due_time_not_before() {
        let (mut state, keys) = setup();
        let mut sched = EventScheduler::new();
        sched
            .add_change_equipment(&state, &keys[..1], secs(5), true, Equipment::StandardRadio)
            .unwrap();

        assert!(sched.advance_to(secs(4), &mut state).unwrap().is_empty());
        assert!(!state.equipment_at("u_0").unwrap().standard_radio());

        let fired = sched.advance_to(secs(5), &mut state).unwrap();
        assert_eq!(fired.len(), 1);
        assert!(state.equipment_at("u_0").unwrap().standard_radio());
        assert!(!state.equipment_at("u_1").unwrap().standard_radio());
        assert_eq!(sched.pending_count(), 0);
    }

    #[test]
    fn test_equal_times_fire_in_insertion_order() {
        let (mut state, keys) = setup();
        let mut sched = EventScheduler::new();
        let on = sched
            .add_change_equipment(&state, &keys, secs(3), true, Equipment::CellularRadio)
            .unwrap();
        let off = sched
            .add_change_equipment(&state, &keys, secs(3), false, Equipment::CellularRadio)
            .unwrap();
        let early = sched.add_stop_movement(&state, &keys, secs(1)).unwrap();

        let fired = sched.advance_to(secs(10), &mut state).unwrap();
        let ids: Vec<InstructionId> = fired.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![early, on, off]);
        assert!(!state.equipment_at("u_0").unwrap().cellular_radio());
    }

    #[test]
    fn test_backwards_is_order_error() {
        let (mut state, _) = setup();
        let mut sched = EventScheduler::new();
        sched.advance_to(secs(10), &mut state).unwrap();
        let err = sched.advance_to(secs(9), &mut state).unwrap_err();
        assert!(err.is_order());
        assert_eq!(sched.now(), secs(10));
    }

    #[test]
    fn test_same_time_is_idempotent() {
        let (mut state, keys) = setup();
        let mut sched = EventScheduler::new();
        sched
            .add_change_equipment(&state, &keys, secs(2), true, Equipment::SatelliteLink)
            .unwrap();
        assert_eq!(sched.advance_to(secs(2), &mut state).unwrap().len(), 1);
        assert!(sched.advance_to(secs(2), &mut state).unwrap().is_empty());
        assert!(state.equipment_at("u_1").unwrap().satellite_link());
    }

    #[test]
    fn test_cancel() {
        let (mut state, keys) = setup();
        let mut sched = EventScheduler::new();
        let id = sched.add_stop_movement(&state, &keys, secs(5)).unwrap();
        sched.cancel(id).unwrap();
        assert_eq!(sched.state(id), Some(InstructionState::Cancelled));
        assert_eq!(sched.pending_count(), 0);
        assert_eq!(sched.next_fire_time(), None);

        assert!(sched.advance_to(secs(6), &mut state).unwrap().is_empty());
        assert_eq!(state.unit("u_0").unwrap().stopped_at(), None);

        assert!(sched.cancel(id).unwrap_err().is_validation());
        let fired = sched.add_stop_movement(&state, &keys, secs(7)).unwrap();
        sched.advance_to(secs(7), &mut state).unwrap();
        assert!(sched.cancel(fired).is_err());
        assert!(sched.cancel(InstructionId(99)).is_err());
    }

    #[test]
    fn test_stop_movement_freezes_position() {
        let (mut state, keys) = setup();
        state
            .set_waypoints(&keys, vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)], secs(0), secs(10))
            .unwrap();
        let mut sched = EventScheduler::new();
        sched.add_stop_movement(&state, &keys, secs(4)).unwrap();
        sched.advance_to(secs(6), &mut state).unwrap();
        assert_eq!(state.position_at("u_0", secs(6)).unwrap(), Point::new(4.0, 0.0));
        assert_eq!(state.position_at("u_0", secs(2)).unwrap(), Point::new(2.0, 0.0));
    }

    #[test]
    fn test_rejects_bad_instructions() {
        let (mut state, keys) = setup();
        let mut sched = EventScheduler::new();
        assert!(sched.add_stop_movement(&state, &[], secs(1)).is_err());
        assert!(sched.add_stop_movement(&state, &keys, SimTime::MAX).is_err());
        sched.advance_to(secs(5), &mut state).unwrap();
        assert!(sched.add_stop_movement(&state, &keys, secs(4)).is_err());
        assert!(sched.add_stop_movement(&state, &keys, secs(5)).is_ok());
    }

    #[test]
    fn test_unknown_key_rejected_at_schedule_time() {
        let (state, keys) = setup();
        let mut sched = EventScheduler::new();
        let mut targets = keys.clone();
        targets.push(UnitKey::from("ghost"));
        let err = sched.add_stop_movement(&state, &targets, secs(1)).unwrap_err();
        assert!(err.is_validation());
        assert!(sched
            .add_change_equipment(&state, &targets, secs(1), true, Equipment::SatelliteLink)
            .is_err());
        assert_eq!(sched.pending_count(), 0);
    }

    #[test]
    fn test_advance_is_all_or_nothing() {
        let (mut full, keys) = setup();
        let mut partial = full.clone();
        full.add_unit("scout_9", "scout").unwrap();

        let mut sched = EventScheduler::new();
        let on = sched
            .add_change_equipment(&full, &keys[..1], secs(1), true, Equipment::SatelliteLink)
            .unwrap();
        let stop = sched
            .add_stop_movement(&full, &[UnitKey::from("scout_9")], secs(2))
            .unwrap();

        // scout_9 is missing from `partial`: nothing may fire.
        assert!(sched.advance_to(secs(3), &mut partial).unwrap_err().is_validation());
        assert!(!partial.equipment_at("u_0").unwrap().satellite_link());
        assert_eq!(sched.now(), SimTime::ZERO);
        assert_eq!(sched.state(on), Some(InstructionState::Pending));
        assert_eq!(sched.state(stop), Some(InstructionState::Pending));
        assert_eq!(sched.pending_count(), 2);

        let fired = sched.advance_to(secs(3), &mut full).unwrap();
        let ids: Vec<InstructionId> = fired.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![on, stop]);
        assert!(full.equipment_at("u_0").unwrap().satellite_link());
        assert_eq!(full.unit("scout_9").unwrap().stopped_at(), Some(secs(2)));
        assert_eq!(sched.now(), secs(3));
    }
}
