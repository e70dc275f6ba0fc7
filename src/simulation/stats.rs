//! Vehicle stat profiles, car classes and AI difficulty presets

use anyhow::{bail, Result};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Brake/reverse rate shared by every car class
pub const BRAKE_RATE: f32 = 0.3;
/// On-road friction applied each tick
pub const BASE_FRICTION: f32 = 0.02;
/// Below this speed the car cannot steer
pub const MIN_SPEED_FOR_STEERING: f32 = 0.5;

/// AI base top speed before the difficulty scale is applied
pub const AI_BASE_MAX_SPEED: f32 = 6.0;
pub const AI_ACCELERATION: f32 = 0.12;
pub const AI_STEERING_RATE: f32 = 2.5;

/// Immutable handling profile of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarStats {
    pub max_speed: f32,
    pub acceleration_rate: f32,
    pub brake_rate: f32,
    pub base_friction: f32,
    /// Degrees per tick at full steering authority
    pub steering_rate: f32,
    pub min_speed_for_steering: f32,
}

impl Default for CarStats {
    fn default() -> Self {
        Self::player_default()
    }
}

impl CarStats {
    /// Profile of the player's car when no class was chosen
    pub fn player_default() -> Self {
        Self {
            max_speed: 8.0,
            acceleration_rate: 0.15,
            brake_rate: BRAKE_RATE,
            base_friction: BASE_FRICTION,
            steering_rate: 3.0,
            min_speed_for_steering: MIN_SPEED_FOR_STEERING,
        }
    }

    /// Profile of an AI opponent. `max_speed` is the unscaled base; the
    /// pursuit controller multiplies it by the difficulty scale.
    pub fn ai_default() -> Self {
        Self {
            max_speed: AI_BASE_MAX_SPEED,
            acceleration_rate: AI_ACCELERATION,
            brake_rate: BRAKE_RATE,
            base_friction: BASE_FRICTION,
            steering_rate: AI_STEERING_RATE,
            min_speed_for_steering: MIN_SPEED_FOR_STEERING,
        }
    }
}

/// Selectable vehicle classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CarClass {
    Sports,
    Muscle,
    Sedan,
    Truck,
    Racer,
    Motorcycle,
}

impl CarClass {
    pub const ALL: [CarClass; 6] = [
        CarClass::Sports,
        CarClass::Muscle,
        CarClass::Sedan,
        CarClass::Truck,
        CarClass::Racer,
        CarClass::Motorcycle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CarClass::Sports => "Sports",
            CarClass::Muscle => "Muscle",
            CarClass::Sedan => "Sedan",
            CarClass::Truck => "Truck",
            CarClass::Racer => "Racer",
            CarClass::Motorcycle => "Motorcycle",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CarClass::Sports => "Fast but fragile",
            CarClass::Muscle => "Great acceleration, poor handling",
            CarClass::Sedan => "Balanced all-rounder",
            CarClass::Truck => "Slow but very tough",
            CarClass::Racer => "Ultimate speed, very fragile",
            CarClass::Motorcycle => "Fastest, extreme handling, no protection",
        }
    }

    /// Parse a class name, falling back to Sedan for anything unknown
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|class| class.name().eq_ignore_ascii_case(name.trim()))
            .unwrap_or(CarClass::Sedan)
    }

    pub fn stats(self) -> CarStats {
        let (max_speed, acceleration_rate, steering_rate) = match self {
            CarClass::Sports => (9.0, 0.16, 3.5),
            CarClass::Muscle => (8.0, 0.20, 2.2),
            CarClass::Sedan => (7.0, 0.12, 3.0),
            CarClass::Truck => (5.5, 0.06, 1.8),
            CarClass::Racer => (10.0, 0.22, 4.0),
            CarClass::Motorcycle => (11.0, 0.25, 4.5),
        };
        CarStats {
            max_speed,
            acceleration_rate,
            brake_rate: BRAKE_RATE,
            base_friction: BASE_FRICTION,
            steering_rate,
            min_speed_for_steering: MIN_SPEED_FOR_STEERING,
        }
    }

    /// Pick a class uniformly at random
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        *Self::ALL[..].choose(rng).unwrap_or(&CarClass::Sedan)
    }
}

/// AI opponent difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => bail!("Unknown difficulty '{}' (expected easy, medium or hard)", other),
        }
    }

    /// Multiplier applied to the AI top speed
    pub fn scale(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.5,
            Difficulty::Medium => 0.7,
            Difficulty::Hard => 1.0,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Hard,
            Difficulty::Medium => Difficulty::Easy,
            Difficulty::Hard => Difficulty::Medium,
        }
    }
}
