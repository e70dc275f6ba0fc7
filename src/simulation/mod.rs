//! Standalone race simulation module
//!
//! This module contains all the core racing logic: car physics, AI
//! waypoint pursuit, collisions, lap timing and ranking. It runs without
//! any renderer and can be driven from a console or a test.

mod car;
mod collision;
mod pursuit;
mod race;
mod stats;
mod track;
mod types;
mod world;

pub use car::{
    CarBody, Pilot, SimCar, OFF_ROAD_FRICTION, OFF_ROAD_SPEED_FACTOR, PLAYER_CHECKPOINT_RADIUS,
    WALL_SPEED_FACTOR,
};
pub use collision::{resolve_collisions, Contact, COLLISION_SPEED_FACTOR};
pub use pursuit::{
    autopilot_intents, turn_factor, PursuitController, AI_OFF_ROAD_FRICTION_MULTIPLIER,
    STEERING_DEADBAND, WAYPOINT_THRESHOLD,
};
pub use race::{
    compute_standings, progress_metric, FinishLine, LapTracker, RaceRecord, Standing,
    ASSUMED_MAX_WAYPOINT_GAP,
};
pub use stats::{
    CarClass, CarStats, Difficulty, AI_ACCELERATION, AI_BASE_MAX_SPEED, AI_STEERING_RATE,
    BASE_FRICTION, BRAKE_RATE, MIN_SPEED_FOR_STEERING,
};
pub use track::{Direction, TileKind, Track, TrackId, GRID_SLOTS, TILE_SIZE};
pub use types::{
    angle_delta, project, ControlIntents, Position, Steer, Surface, VehicleId, VehicleKind,
    COLLISION_RADIUS, TICKS_PER_SECOND,
};
pub use world::{RaceConfig, RaceEvent, SimWorld, TickReport, VehicleSnapshot};
