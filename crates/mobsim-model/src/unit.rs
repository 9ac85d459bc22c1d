//! Units and their waypoint timelines.

use crate::EquipmentSet;
use mobsim_common::{Point, Result, SimError, SimTime, UnitKey};
use serde::{Deserialize, Serialize};

// ============================================================================
// Waypoint Interval
// ============================================================================

/// A time-bounded leg of a unit's movement.
///
/// Within `[start_time, end_time]` the unit moves along `waypoints` in order.
/// A bounded interval spends equal time on every segment. An open-ended
/// interval (`end_time == SimTime::MAX`) is traversed at the unit's speed and
/// the unit then holds at the last waypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointInterval {
    /// Ordered waypoints; never empty.
    pub waypoints: Vec<Point>,
    /// Time the unit leaves the first waypoint.
    pub start_time: SimTime,
    /// Time the unit reaches the last waypoint.
    pub end_time: SimTime,
}

impl WaypointInterval {
    /// Creates a validated interval.
    pub fn new(waypoints: Vec<Point>, start_time: SimTime, end_time: SimTime) -> Result<Self> {
        if waypoints.is_empty() {
            return Err(SimError::validation("Waypoint interval needs at least one waypoint"));
        }
        if let Some(bad) = waypoints.iter().find(|p| !p.is_finite()) {
            return Err(SimError::validation(format!("Waypoint {} is not finite", bad)));
        }
        if end_time < start_time {
            return Err(SimError::validation(format!(
                "Waypoint interval ends ({}) before it starts ({})",
                end_time, start_time
            )));
        }
        Ok(Self {
            waypoints,
            start_time,
            end_time,
        })
    }

    /// Returns true if `time` falls within the interval (both ends inclusive).
    pub fn covers(&self, time: SimTime) -> bool {
        self.start_time <= time && time <= self.end_time
    }

    /// Returns true if the interval has no end time.
    pub fn is_open_ended(&self) -> bool {
        self.end_time.is_unbounded()
    }

    /// The last waypoint of the interval.
    pub fn final_waypoint(&self) -> Point {
        // Constructor guarantees at least one waypoint.
        self.waypoints[self.waypoints.len() - 1]
    }

    /// Position within the interval at `time`.
    ///
    /// `speed` is only used for open-ended intervals.
    pub fn position_at(&self, time: SimTime, speed: f64) -> Point {
        if self.waypoints.len() == 1 || time >= self.end_time {
            return if time <= self.start_time {
                self.waypoints[0]
            } else {
                self.final_waypoint()
            };
        }
        if time <= self.start_time {
            return self.waypoints[0];
        }

        let elapsed = time.secs_since(self.start_time);
        if self.is_open_ended() {
            self.position_along_path(elapsed * speed.max(0.0))
        } else {
            let segments = (self.waypoints.len() - 1) as f64;
            let duration = self.end_time.secs_since(self.start_time);
            let progress = (elapsed / duration * segments).clamp(0.0, segments);
            let index = (progress.floor() as usize).min(self.waypoints.len() - 2);
            self.waypoints[index].lerp(&self.waypoints[index + 1], progress - index as f64)
        }
    }

    fn position_along_path(&self, mut travelled: f64) -> Point {
        for pair in self.waypoints.windows(2) {
            let length = pair[0].distance_to(&pair[1]);
            if travelled <= length {
                if length == 0.0 {
                    return pair[1];
                }
                return pair[0].lerp(&pair[1], travelled / length);
            }
            travelled -= length;
        }
        self.final_waypoint()
    }
}

// ============================================================================
// Unit
// ============================================================================

/// A mobile unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unit {
    pub(crate) key: UnitKey,
    pub(crate) unit_type: String,
    pub(crate) starting_position: Point,
    pub(crate) waypoints_timeline: Vec<WaypointInterval>,
    pub(crate) equipment: EquipmentSet,
    pub(crate) speed: f64,
    pub(crate) stopped_at: Option<SimTime>,
}

impl Unit {
    pub(crate) fn new(key: UnitKey, unit_type: impl Into<String>, speed: f64, equipment: EquipmentSet) -> Self {
        Self {
            key,
            unit_type: unit_type.into(),
            starting_position: Point::default(),
            waypoints_timeline: Vec::new(),
            equipment,
            speed,
            stopped_at: None,
        }
    }

    /// The unit's key.
    pub fn key(&self) -> &UnitKey {
        &self.key
    }

    /// The unit's type name.
    pub fn unit_type(&self) -> &str {
        &self.unit_type
    }

    /// Position before any waypoint interval starts.
    pub fn starting_position(&self) -> Point {
        self.starting_position
    }

    /// Waypoint intervals in registration order.
    pub fn waypoints_timeline(&self) -> &[WaypointInterval] {
        &self.waypoints_timeline
    }

    /// Equipment currently switched on.
    pub fn equipment(&self) -> EquipmentSet {
        self.equipment
    }

    /// Cruise speed used for open-ended intervals.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Time from which the unit holds its position, if stopped.
    pub fn stopped_at(&self) -> Option<SimTime> {
        self.stopped_at
    }

    /// Position of the unit at `time`.
    ///
    /// The first registered interval covering `time` wins. Outside every
    /// interval the unit holds the final waypoint of the most recently ended
    /// interval, or its starting position if no interval has ended yet. After
    /// a stop the unit stays where it was at the stop time.
    pub fn position_at(&self, time: SimTime) -> Point {
        let time = match self.stopped_at {
            Some(stop) if time > stop => stop,
            _ => time,
        };

        if let Some(interval) = self.waypoints_timeline.iter().find(|iv| iv.covers(time)) {
            return interval.position_at(time, self.speed);
        }

        let mut last_ended: Option<&WaypointInterval> = None;
        for interval in self.waypoints_timeline.iter().filter(|iv| iv.end_time < time) {
            if last_ended.map_or(true, |prev| interval.end_time > prev.end_time) {
                last_ended = Some(interval);
            }
        }

        last_ended
            .map(WaypointInterval::final_waypoint)
            .unwrap_or(self.starting_position)
    }
}
