//! Vehicle movement for the race simulation
//!
//! Arcade-style kinematics shared by the player and AI cars. Speeds are in
//! pixels per tick and headings in degrees; integration is per tick, not
//! per elapsed second.

use super::pursuit::PursuitController;
use super::race::LapTracker;
use super::stats::{CarClass, CarStats};
use super::track::Track;
use super::types::{
    project, ControlIntents, Position, Steer, Surface, VehicleId, VehicleKind, COLLISION_RADIUS,
};

/// Friction applied to the player's car when it is off the road
pub const OFF_ROAD_FRICTION: f32 = 0.05;
/// Off-road top speed as a fraction of `max_speed`
pub const OFF_ROAD_SPEED_FACTOR: f32 = 0.5;
/// Speed multiplier applied when the car is pushed back inside the world
pub const WALL_SPEED_FACTOR: f32 = 0.5;
/// Speed at which steering reaches full authority
const FULL_STEERING_SPEED: f32 = 4.0;
/// The player advances its progress checkpoint inside this radius
pub const PLAYER_CHECKPOINT_RADIUS: f32 = 96.0;

/// Position, heading and speed of one vehicle plus its handling profile
#[derive(Debug, Clone, PartialEq)]
pub struct CarBody {
    pub position: Position,
    /// `position.x` before the last integration step
    pub previous_x: f32,
    /// Degrees, 0 = facing up, positive turns left
    pub heading: f32,
    /// Positive forward, negative in reverse
    pub speed: f32,
    pub stats: CarStats,
    pub collision_radius: f32,
}

impl CarBody {
    pub fn new(position: Position, heading: f32, stats: CarStats) -> Self {
        Self {
            position,
            previous_x: position.x,
            heading,
            speed: 0.0,
            stats,
            collision_radius: COLLISION_RADIUS,
        }
    }

    /// Put the car back on a start pose, at rest
    pub fn place(&mut self, position: Position, heading: f32) {
        self.position = position;
        self.previous_x = position.x;
        self.heading = heading;
        self.speed = 0.0;
    }

    pub fn apply_throttle(&mut self) {
        self.speed = (self.speed + self.stats.acceleration_rate).min(self.stats.max_speed);
    }

    /// Brake, then reverse once stopped. Reverse is capped at half the top speed.
    pub fn apply_brake(&mut self) {
        self.speed = (self.speed - self.stats.brake_rate).max(-self.stats.max_speed / 2.0);
    }

    /// Turn the car. Steering authority grows with speed and a stationary
    /// car cannot turn. In reverse the turn is counter-rotated by twice its
    /// amount, so the car swings the other way like a real car backing up.
    pub fn apply_steer(&mut self, direction: Steer) {
        if self.speed.abs() <= self.stats.min_speed_for_steering {
            return;
        }
        let factor = (self.speed.abs() / FULL_STEERING_SPEED).min(1.0);
        let amount = self.stats.steering_rate * factor * direction.sign();
        self.heading += amount;
        if self.speed < 0.0 {
            self.heading -= amount * 2.0;
        }
    }

    /// Apply every requested intent in a fixed order
    pub fn apply_intents(&mut self, intents: &ControlIntents) {
        if intents.accelerate {
            self.apply_throttle();
        }
        if intents.brake {
            self.apply_brake();
        }
        if intents.steer_left {
            self.apply_steer(Steer::Left);
        }
        if intents.steer_right {
            self.apply_steer(Steer::Right);
        }
    }

    /// Decay |speed| towards zero without ever crossing it
    pub fn apply_friction(&mut self, friction: f32) {
        if self.speed > 0.0 {
            self.speed = (self.speed - friction).max(0.0);
        } else if self.speed < 0.0 {
            self.speed = (self.speed + friction).min(0.0);
        }
    }

    /// Move along the heading by the current speed
    pub fn advance(&mut self) {
        let (dx, dy) = project(self.heading, self.speed);
        self.position.x += dx;
        self.position.y += dy;
    }

    /// Keep the car inside `[radius, size - radius]` on each axis. A zero
    /// size disables that axis. Returns true when anything was clamped.
    pub fn clamp_to_world(&mut self, world_width: f32, world_height: f32) -> bool {
        let radius = self.collision_radius;
        let (x, clamped_x) = clamp_axis(self.position.x, radius, world_width);
        let (y, clamped_y) = clamp_axis(self.position.y, radius, world_height);
        self.position = Position::new(x, y);
        clamped_x || clamped_y
    }

    /// One player physics step on the given surface
    pub fn integrate(&mut self, surface: Surface, world_width: f32, world_height: f32) {
        self.previous_x = self.position.x;

        match surface {
            Surface::Road => self.apply_friction(self.stats.base_friction),
            Surface::OffRoad => {
                self.apply_friction(OFF_ROAD_FRICTION);
                let cap = self.stats.max_speed * OFF_ROAD_SPEED_FACTOR;
                if self.speed.abs() > cap {
                    self.speed = cap.copysign(self.speed);
                }
            }
        }

        self.advance();
        if self.clamp_to_world(world_width, world_height) {
            self.speed *= WALL_SPEED_FACTOR;
        }
    }
}

fn clamp_axis(value: f32, radius: f32, size: f32) -> (f32, bool) {
    if size <= 0.0 {
        return (value, false);
    }
    if value < radius {
        (radius, true)
    } else if value > size - radius {
        (size - radius, true)
    } else {
        (value, false)
    }
}

/// Where a car's control intents come from
#[derive(Debug, Clone)]
pub enum Pilot {
    /// Intents handed to the world each tick
    Manual,
    /// Self-generated by waypoint pursuit
    Pursuit(PursuitController),
}

/// A car in the race
#[derive(Debug, Clone)]
pub struct SimCar {
    pub id: VehicleId,
    /// Sets the handling of the player's car; cosmetic for AI cars
    pub class: Option<CarClass>,
    pub body: CarBody,
    pub pilot: Pilot,
    /// Index of the waypoint this car is heading for
    pub waypoint_index: usize,
    pub laps: LapTracker,
}

impl SimCar {
    pub fn new_player(id: VehicleId, class: Option<CarClass>, position: Position, heading: f32) -> Self {
        let stats = class.map(CarClass::stats).unwrap_or_else(CarStats::player_default);
        Self {
            id,
            class,
            body: CarBody::new(position, heading, stats),
            pilot: Pilot::Manual,
            waypoint_index: 0,
            laps: LapTracker::new(),
        }
    }

    pub fn new_ai(
        id: VehicleId,
        class: Option<CarClass>,
        position: Position,
        heading: f32,
        controller: PursuitController,
    ) -> Self {
        Self {
            id,
            class,
            body: CarBody::new(position, heading, CarStats::ai_default()),
            pilot: Pilot::Pursuit(controller),
            waypoint_index: 0,
            laps: LapTracker::new(),
        }
    }

    pub fn kind(&self) -> VehicleKind {
        match self.pilot {
            Pilot::Manual => VehicleKind::Player,
            Pilot::Pursuit(_) => VehicleKind::Ai,
        }
    }

    /// Back to a start pose with no laps, chasing `waypoint_index`
    pub fn reset(&mut self, position: Position, heading: f32, waypoint_index: usize) {
        self.body.place(position, heading);
        self.waypoint_index = waypoint_index;
        self.laps.reset();
    }

    /// Short description for console output. AI handling always comes from
    /// the AI profile, so their class is only a livery.
    pub fn label(&self) -> String {
        match (self.kind(), self.class) {
            (VehicleKind::Player, Some(class)) => class.name().to_string(),
            (VehicleKind::Player, None) => "Default".to_string(),
            (VehicleKind::Ai, Some(class)) => format!("{} livery", class.name()),
            (VehicleKind::Ai, None) => "AI".to_string(),
        }
    }

    /// Run one movement step. Manual cars consume `intents`; AI cars
    /// ignore them and pursue the track's waypoints.
    pub fn update(&mut self, intents: &ControlIntents, track: &Track, clamp_ai_to_world: bool) {
        let surface = track.classify(self.body.position.x, self.body.position.y);
        let (world_width, world_height) = track.world_size();
        let waypoints = track.waypoints();

        match self.pilot {
            Pilot::Manual => {
                self.body.apply_intents(intents);
                self.body.integrate(surface, world_width, world_height);
                self.advance_checkpoint(waypoints);
            }
            Pilot::Pursuit(controller) => {
                let bounds = clamp_ai_to_world.then_some((world_width, world_height));
                controller.step(&mut self.body, &mut self.waypoint_index, waypoints, surface, bounds);
            }
        }
    }

    /// Progress tracking for cars that do not pursue waypoints themselves
    fn advance_checkpoint(&mut self, waypoints: &[Position]) {
        if waypoints.is_empty() {
            return;
        }
        self.waypoint_index %= waypoints.len();
        if self.body.position.distance(&waypoints[self.waypoint_index]) < PLAYER_CHECKPOINT_RADIUS {
            self.waypoint_index = (self.waypoint_index + 1) % waypoints.len();
        }
    }
}
