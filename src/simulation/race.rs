//! Race progress: finish-line crossings, lap timing, progress and ranking

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use super::types::{Position, VehicleId};

/// Approximate largest gap between two consecutive waypoints, used to
/// turn a distance into a fraction of a waypoint segment
pub const ASSUMED_MAX_WAYPOINT_GAP: f32 = 200.0;

/// A vertical finish line at `x`, spanning `y_min..=y_max`.
/// Only crossings towards decreasing x count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinishLine {
    pub x: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl FinishLine {
    pub fn new(x: f32, y_min: f32, y_max: f32) -> Self {
        Self { x, y_min, y_max }
    }

    /// True when a vehicle moved from `previous_x` to `new_x` at height `y`
    /// across the line in the racing direction
    pub fn crossed(&self, previous_x: f32, new_x: f32, y: f32) -> bool {
        y >= self.y_min && y <= self.y_max && previous_x >= self.x && new_x < self.x
    }

    /// True while `position` has not yet passed the line in the racing
    /// direction
    pub fn is_ahead_of(&self, position: &Position) -> bool {
        position.x >= self.x
    }
}

/// Lap count and timing of a single vehicle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LapTracker {
    pub lap_count: u32,
    /// Seconds since the current lap started
    pub current_lap_time: f32,
    pub last_lap_time: Option<f32>,
    pub best_lap_time: Option<f32>,
    /// Seconds since the race started
    pub total_time: f32,
}

impl LapTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the lap and race clocks
    pub fn advance_clock(&mut self, delta_secs: f32) {
        self.current_lap_time += delta_secs;
        self.total_time += delta_secs;
    }

    /// Record a counted finish-line crossing and return the lap time
    pub fn complete_lap(&mut self) -> f32 {
        let lap_time = self.current_lap_time;
        self.lap_count += 1;
        self.last_lap_time = Some(lap_time);
        self.best_lap_time = Some(match self.best_lap_time {
            Some(best) => best.min(lap_time),
            None => lap_time,
        });
        self.current_lap_time = 0.0;
        lap_time
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Scalar used to order vehicles: laps scaled by the waypoint count, plus
/// the index of the waypoint being chased, plus how close the vehicle is
/// to it. An approximation of distance raced, good enough for ranking.
///
/// The last waypoint sits on the finish line, so a car's waypoint index
/// wraps a few ticks before (or after) its lap counter moves. The index is
/// therefore counted from the line: a wrapped index still short of the
/// line counts as `N`, and the last index already past it counts as `-1`.
/// Progress stays continuous through the crossing.
pub fn progress_metric(
    lap_count: u32,
    waypoint_index: usize,
    position: &Position,
    waypoints: &[Position],
    finish_line: &FinishLine,
) -> f32 {
    let Some(target) = waypoints.get(waypoint_index) else {
        return 0.0;
    };
    let count = waypoints.len();
    let distance = position.distance(target);
    let fraction = 1.0 - (distance / ASSUMED_MAX_WAYPOINT_GAP).min(1.0);

    let index = if count < 2 {
        waypoint_index as f32
    } else if waypoint_index == 0 && finish_line.is_ahead_of(position) {
        count as f32
    } else if waypoint_index == count - 1 && !finish_line.is_ahead_of(position) {
        -1.0
    } else {
        waypoint_index as f32
    };
    (lap_count as usize * count) as f32 + index + fraction
}

/// A vehicle's place in the race
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Standing {
    pub vehicle: VehicleId,
    /// 1 = leading. Tied vehicles share a rank.
    pub rank: usize,
    pub progress: f32,
}

/// Rank every vehicle: one plus the number of vehicles strictly ahead.
///
/// The returned list is ordered leader first; ties keep ascending vehicle
/// id order so the list is reproducible.
pub fn compute_standings(progress: &[(VehicleId, f32)]) -> Vec<Standing> {
    let mut standings: Vec<Standing> = progress
        .iter()
        .map(|&(vehicle, value)| Standing {
            vehicle,
            rank: 1 + progress.iter().filter(|(_, other)| *other > value).count(),
            progress: value,
        })
        .collect();

    standings.sort_by_key(|s| (std::cmp::Reverse(OrderedFloat(s.progress)), s.vehicle));
    standings
}

/// What the external persistence layer stores once a race ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceRecord {
    pub track: String,
    pub laps: u32,
    pub best_lap_time: Option<f32>,
    pub total_time: f32,
}
