//! Waypoint pursuit for AI cars
//!
//! AI cars steer at the waypoint they are chasing, slow down for sharp
//! turns and move on to the next waypoint once they are close enough.
//! The loop is circular and never ends.

use super::car::{CarBody, WALL_SPEED_FACTOR};
use super::stats::Difficulty;
use super::types::{angle_delta, ControlIntents, Position, Steer, Surface};

/// A waypoint counts as reached inside this distance
pub const WAYPOINT_THRESHOLD: f32 = 60.0;
/// No steering correction below this heading error, in degrees
pub const STEERING_DEADBAND: f32 = 2.0;
/// AI friction multiplier when off the road
pub const AI_OFF_ROAD_FRICTION_MULTIPLIER: f32 = 3.0;
/// Heading error at which the turn factor bottoms out at one half
const FULL_TURN_ANGLE: f32 = 90.0;
const MIN_TURN_FACTOR: f32 = 0.5;

/// Speed multiplier for a heading error: 1 when aligned, never below 0.5
pub fn turn_factor(angle_diff: f32) -> f32 {
    1.0 - (angle_diff.abs() / FULL_TURN_ANGLE).min(1.0 - MIN_TURN_FACTOR)
}

/// Steering/throttle policy of an AI car
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PursuitController {
    /// Multiplies the car's top speed
    pub difficulty_scale: f32,
    pub waypoint_threshold: f32,
}

impl Default for PursuitController {
    fn default() -> Self {
        Self::from_difficulty(Difficulty::default())
    }
}

impl PursuitController {
    pub fn new(difficulty_scale: f32) -> Self {
        Self {
            difficulty_scale,
            waypoint_threshold: WAYPOINT_THRESHOLD,
        }
    }

    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        Self::new(difficulty.scale())
    }

    /// One AI tick: steer, throttle, friction, move, then advance the
    /// waypoint index if the target was within reach at the start of the
    /// tick. `bounds` optionally keeps the car inside the world.
    ///
    /// An empty waypoint list leaves the car untouched.
    pub fn step(
        &self,
        body: &mut CarBody,
        waypoint_index: &mut usize,
        waypoints: &[Position],
        surface: Surface,
        bounds: Option<(f32, f32)>,
    ) {
        body.previous_x = body.position.x;
        if waypoints.is_empty() {
            return;
        }
        *waypoint_index %= waypoints.len();

        let target = waypoints[*waypoint_index];
        let distance = body.position.distance(&target);
        let angle_diff = angle_delta(body.heading, body.position.heading_to(&target));

        if angle_diff.abs() > STEERING_DEADBAND {
            body.heading += angle_diff.signum() * body.stats.steering_rate.min(angle_diff.abs());
        }

        let factor = turn_factor(angle_diff);
        body.speed += body.stats.acceleration_rate * factor;
        let cap = body.stats.max_speed * self.difficulty_scale * factor;
        if body.speed > cap {
            body.speed = cap;
        }

        let friction = match surface {
            Surface::Road => body.stats.base_friction,
            Surface::OffRoad => body.stats.base_friction * AI_OFF_ROAD_FRICTION_MULTIPLIER,
        };
        body.apply_friction(friction);

        body.advance();
        if let Some((width, height)) = bounds {
            if body.clamp_to_world(width, height) {
                body.speed *= WALL_SPEED_FACTOR;
            }
        }

        if distance < self.waypoint_threshold {
            *waypoint_index = (*waypoint_index + 1) % waypoints.len();
        }
    }
}

/// Control intents that drive a manual car towards `target` the way the
/// pursuit controller would: steer outside the deadband, hold the speed
/// near what the turn allows.
pub fn autopilot_intents(body: &CarBody, target: &Position) -> ControlIntents {
    let angle_diff = angle_delta(body.heading, body.position.heading_to(target));
    let mut intents = ControlIntents::none();

    if angle_diff.abs() > STEERING_DEADBAND {
        let steer = if angle_diff > 0.0 { Steer::Left } else { Steer::Right };
        intents = intents.with_steer(steer);
    }

    let cap = body.stats.max_speed * turn_factor(angle_diff);
    if body.speed < cap {
        intents.accelerate = true;
    } else if body.speed > cap + body.stats.brake_rate {
        intents.brake = true;
    }
    intents
}
