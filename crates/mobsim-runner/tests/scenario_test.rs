//! End-to-end scenario tests.
//!
//! These tests author scenarios through [`ScenarioBuilder`], step them with
//! the scheduler and check unit positions, equipment, coverage and link
//! reports.

use approx::assert_relative_eq;
use mobsim_common::{Point, SimTime, UnitKey};
use mobsim_link::{LinkParams, Shadowing};
use mobsim_model::Equipment;
use mobsim_runner::{InstructionId, InstructionState, Scenario, ScenarioBuilder};
use proptest::prelude::*;

fn secs(s: u64) -> SimTime {
    SimTime::from_secs(s)
}

/// Two standard-radio units 100 m apart, the second parked inside a
/// coverage square.
fn two_units() -> (Scenario, Vec<UnitKey>) {
    let mut builder = ScenarioBuilder::new();
    let a = builder.create_units("alpha", "scout", 1).unwrap();
    let b = builder.create_units("bravo", "scout", 1).unwrap();
    builder.set_starting_position(&a, Point::new(0.0, 0.0)).unwrap();
    builder.set_starting_position(&b, Point::new(100.0, 0.0)).unwrap();
    let both = builder.create_group(&[&a, &b]).unwrap();
    builder.equip(both.keys(), Equipment::StandardRadio).unwrap();
    builder
        .create_cellular_region(vec![
            Point::new(90.0, -10.0),
            Point::new(110.0, -10.0),
            Point::new(110.0, 10.0),
            Point::new(90.0, 10.0),
        ])
        .unwrap();
    (builder.build(), both.keys().to_vec())
}

#[test]
fn test_midpoint_position() {
    let mut builder = ScenarioBuilder::new();
    let keys = builder.create_units("u", "scout", 1).unwrap();
    builder.set_starting_position(&keys, Point::new(0.0, 0.0)).unwrap();
    builder
        .set_waypoints(&keys, vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)], secs(0), secs(10))
        .unwrap();
    let scenario = builder.build();

    let status = scenario.unit_status("u_0", secs(5)).unwrap();
    assert_eq!(status.position, Point::new(5.0, 0.0));
}

#[test]
fn test_equipment_change_fires_on_time() {
    let mut builder = ScenarioBuilder::new();
    let keys = builder.create_units("u", "scout", 1).unwrap();
    builder
        .change_equipment_at_time(&keys, secs(5), true, Equipment::StandardRadio)
        .unwrap();
    let mut scenario = builder.build();

    scenario.advance_to(secs(4)).unwrap();
    assert!(!scenario.mobility().equipment_at("u_0").unwrap().standard_radio());
    scenario.advance_to(secs(5)).unwrap();
    assert!(scenario.mobility().equipment_at("u_0").unwrap().standard_radio());
}

#[test]
fn test_closed_form_capacity_between_units() {
    let (mut scenario, _) = two_units();
    let report = scenario
        .link_between("alpha_0", "bravo_0", &LinkParams::default(), Shadowing::Draw)
        .unwrap();
    assert_eq!(report.medium, Some(Equipment::StandardRadio));
    assert_relative_eq!(report.distance, 100.0);
    assert_relative_eq!(report.capacity_bps, 1e6 * 101f64.log2(), max_relative = 1e-12);
    // sigma 0 never touches the generator
    assert_eq!(scenario.shadowing().draws(), 0);
}

#[test]
fn test_cellular_needs_both_ends_covered() {
    let (mut scenario, keys) = two_units();
    scenario
        .change_equipment_at_time(&keys, secs(1), false, Equipment::StandardRadio)
        .unwrap();
    scenario
        .change_equipment_at_time(&keys, secs(1), true, Equipment::CellularRadio)
        .unwrap();
    scenario.advance_to(secs(1)).unwrap();

    let params = LinkParams::default();
    // alpha_0 at the origin is outside coverage
    let report = scenario
        .link_between("alpha_0", "bravo_0", &params, Shadowing::NONE)
        .unwrap();
    assert_eq!(report.medium, None);
    assert_eq!(report.capacity_bps, 0.0);
    assert_eq!(report.error_probability, 1.0);
    assert!(report.evaluation.is_none());

    // bravo_0 and a covered point both have coverage
    let report = scenario
        .link_to_point("bravo_0", Point::new(95.0, 0.0), &params, Shadowing::NONE)
        .unwrap();
    assert_eq!(report.medium, Some(Equipment::CellularRadio));
    assert!(report.capacity_bps > 0.0);
}

#[test]
fn test_satellite_fallback_to_point() {
    let mut builder = ScenarioBuilder::new();
    let keys = builder.create_units("sat", "relay", 1).unwrap();
    builder.equip(&keys, Equipment::SatelliteLink).unwrap();
    let mut scenario = builder.build();
    let report = scenario
        .link_to_point("sat_0", Point::new(3.0, 4.0), &LinkParams::default(), Shadowing::NONE)
        .unwrap();
    assert_eq!(report.medium, Some(Equipment::SatelliteLink));
    assert_relative_eq!(report.distance, 5.0);
}

#[test]
fn test_stop_movement_holds_position() {
    let mut builder = ScenarioBuilder::new();
    let keys = builder.create_units("u", "scout", 1).unwrap();
    builder
        .set_waypoints(&keys, vec![Point::new(0.0, 0.0), Point::new(0.0, 20.0)], secs(0), secs(20))
        .unwrap();
    builder.stop_movement(&keys, secs(5)).unwrap();
    let mut scenario = builder.build();

    scenario.advance_to(secs(12)).unwrap();
    let status = scenario.unit_status("u_0", secs(12)).unwrap();
    assert_eq!(status.position, Point::new(0.0, 5.0));
    assert!(status.stopped);
}

#[test]
fn test_cancelled_instruction_never_fires() {
    let mut builder = ScenarioBuilder::new();
    let keys = builder.create_units("u", "scout", 1).unwrap();
    let id = builder
        .change_equipment_at_time(&keys, secs(3), true, Equipment::CellularRadio)
        .unwrap();
    let mut scenario = builder.build();
    scenario.cancel(id).unwrap();

    assert!(scenario.advance_to(secs(10)).unwrap().is_empty());
    assert_eq!(scenario.scheduler().state(id), Some(InstructionState::Cancelled));
    assert!(scenario.mobility().equipment_at("u_0").unwrap().is_empty());
}

#[test]
fn test_backwards_advance_is_rejected() {
    let (mut scenario, _) = two_units();
    scenario.advance_to(secs(10)).unwrap();
    assert!(scenario.advance_to(secs(3)).unwrap_err().is_order());
    assert!(scenario.advance_to(secs(10)).unwrap().is_empty());
}

#[test]
fn test_default_link_params_follow_attributes() {
    let mut builder = ScenarioBuilder::new();
    builder.set_attribute("bandwidth_hz", 2e6).unwrap();
    builder.set_attribute("packet_size_bits", 256i64).unwrap();
    let scenario = builder.build();
    let params = scenario.default_link_params();
    assert_eq!(params.bandwidth_hz, 2e6);
    assert_eq!(params.packet_size_bits, 256);
    assert_eq!(params.snr_threshold_db, 10.0);
}

// ============================================================================
// Scheduler properties
// ============================================================================

fn scheduled(plan: &[(u64, u8)]) -> Scenario {
    let mut builder = ScenarioBuilder::new();
    let keys = builder.create_units("u", "scout", 3).unwrap();
    for (i, (at, action)) in plan.iter().enumerate() {
        let target = &keys[i % keys.len()..=i % keys.len()];
        let at = SimTime::from_millis(*at);
        match action % 4 {
            0 => {
                builder.stop_movement(target, at).unwrap();
            }
            n => {
                let equipment = Equipment::ALL[(n - 1) as usize];
                builder
                    .change_equipment_at_time(target, at, i % 2 == 0, equipment)
                    .unwrap();
            }
        }
    }
    builder.build()
}

fn fired_ids(scenario: &mut Scenario, times: &[SimTime]) -> Vec<InstructionId> {
    times
        .iter()
        .flat_map(|t| scenario.advance_to(*t).unwrap())
        .map(|i| i.id)
        .collect()
}

proptest! {
    #[test]
    fn prop_batching_invariance(
        plan in prop::collection::vec((0u64..10_000, any::<u8>()), 0..40),
        split in 0u64..10_000,
        end in 0u64..10_000,
    ) {
        let (t1, t2) = if split <= end { (split, end) } else { (end, split) };
        let t1 = SimTime::from_millis(t1);
        let t2 = SimTime::from_millis(t2);

        let mut stepped = scheduled(&plan);
        let mut direct = stepped.clone();

        let a = fired_ids(&mut stepped, &[t1, t2]);
        let b = fired_ids(&mut direct, &[t2]);
        prop_assert_eq!(a, b);

        for key in ["u_0", "u_1", "u_2"] {
            prop_assert_eq!(
                stepped.mobility().equipment_at(key).unwrap(),
                direct.mobility().equipment_at(key).unwrap()
            );
            prop_assert_eq!(
                stepped.mobility().unit(key).unwrap().stopped_at(),
                direct.mobility().unit(key).unwrap().stopped_at()
            );
        }
    }

    #[test]
    fn prop_advance_is_idempotent(
        plan in prop::collection::vec((0u64..10_000, any::<u8>()), 0..40),
        at in 0u64..10_000,
    ) {
        let mut scenario = scheduled(&plan);
        let at = SimTime::from_millis(at);
        scenario.advance_to(at).unwrap();
        let pending = scenario.scheduler().pending_count();
        prop_assert!(scenario.advance_to(at).unwrap().is_empty());
        prop_assert_eq!(scenario.scheduler().pending_count(), pending);
    }

    #[test]
    fn prop_never_fires_early(
        plan in prop::collection::vec((0u64..10_000, any::<u8>()), 1..40),
        at in 0u64..10_000,
    ) {
        let mut scenario = scheduled(&plan);
        let at = SimTime::from_millis(at);
        for instruction in scenario.advance_to(at).unwrap() {
            prop_assert!(instruction.fire_time <= at);
        }
        let due = plan.iter().filter(|(t, _)| SimTime::from_millis(*t) <= at).count();
        prop_assert_eq!(scenario.scheduler().pending_count(), plan.len() - due);
    }
}
