//! Tile Racer Library
//!
//! A top-down arcade racing simulation that runs headless; rendering and
//! input devices stay outside and talk to it through plain data.

pub mod simulation;
