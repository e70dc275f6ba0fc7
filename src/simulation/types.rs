//! Core types for the race simulation
//!
//! These are standalone types that don't depend on any renderer.

use serde::{Deserialize, Serialize};

/// A unique identifier for a vehicle in the race
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleId(pub usize);

/// Who produces a vehicle's control intents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleKind {
    /// Driven by the per-tick control intents passed into the world
    Player,
    /// Driven by the waypoint pursuit controller
    Ai,
}

/// Surface classification of a world point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Road,
    OffRoad,
}

/// Steering direction. Left increases the heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steer {
    Left,
    Right,
}

impl Steer {
    /// Sign applied to the heading when steering in this direction
    pub fn sign(self) -> f32 {
        match self {
            Steer::Left => 1.0,
            Steer::Right => -1.0,
        }
    }
}

/// The control intents for one tick. Every flag is applied independently,
/// so simultaneous intents compose (throttle + steer left both apply).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlIntents {
    pub accelerate: bool,
    pub brake: bool,
    pub steer_left: bool,
    pub steer_right: bool,
}

impl ControlIntents {
    /// No input at all (coasting)
    pub fn none() -> Self {
        Self::default()
    }

    pub fn throttle() -> Self {
        Self {
            accelerate: true,
            ..Self::default()
        }
    }

    pub fn brake() -> Self {
        Self {
            brake: true,
            ..Self::default()
        }
    }

    pub fn with_steer(mut self, steer: Steer) -> Self {
        match steer {
            Steer::Left => self.steer_left = true,
            Steer::Right => self.steer_right = true,
        }
        self
    }
}

/// A 2D position in world pixels (y grows downwards)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Heading in degrees that points from this position to another,
    /// using the vehicle convention (0 = up, positive turns left).
    pub fn heading_to(&self, other: &Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (-dx).atan2(-dy).to_degrees()
    }
}

/// Displacement for moving `speed` units along `heading_deg`.
/// Heading 0 faces up (negative y), 90 faces left.
pub fn project(heading_deg: f32, speed: f32) -> (f32, f32) {
    let rad = heading_deg.to_radians();
    (-speed * rad.sin(), -speed * rad.cos())
}

/// Signed shortest angle from `from` to `to`, in (-180, 180]
pub fn angle_delta(from: f32, to: f32) -> f32 {
    let diff = (to - from + 180.0).rem_euclid(360.0) - 180.0;
    if diff <= -180.0 {
        diff + 360.0
    } else {
        diff
    }
}

/// Collision radius shared by every vehicle class
pub const COLLISION_RADIUS: f32 = 20.0;

/// Default simulation rate; one physics step per tick
pub const TICKS_PER_SECOND: u32 = 60;
