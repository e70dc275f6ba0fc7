//! Main simulation world that ties everything together
//!
//! This is the entry point for running a race without any renderer. The
//! caller owns the clock and the input devices: each `tick` consumes the
//! player's control intents and advances every car by one physics step.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::car::SimCar;
use super::collision::{resolve_collisions, Contact};
use super::pursuit::{autopilot_intents, PursuitController};
use super::race::{compute_standings, progress_metric, LapTracker, RaceRecord, Standing};
use super::stats::{CarClass, Difficulty};
use super::track::{Track, TrackId, GRID_SLOTS};
use super::types::{ControlIntents, Position, VehicleId, VehicleKind};

/// Race setup chosen before the race starts
#[derive(Debug, Clone)]
pub struct RaceConfig {
    pub track: TrackId,
    /// The race ends when the player completes this many laps
    pub target_laps: Option<u32>,
    pub opponents: usize,
    pub difficulty: Difficulty,
    /// `None` uses the default player profile
    pub player_class: Option<CarClass>,
    /// Keep AI cars inside the world like the player. Off by default.
    pub clamp_ai_to_world: bool,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            track: TrackId::Oval,
            target_laps: Some(3),
            opponents: 3,
            difficulty: Difficulty::Medium,
            player_class: None,
            clamp_ai_to_world: false,
        }
    }
}

/// Something that happened during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum RaceEvent {
    LapCompleted {
        vehicle: VehicleId,
        lap: u32,
        lap_time: f32,
    },
    /// The player reached the target lap count
    RaceFinished(RaceRecord),
}

/// Everything a tick produced besides the new car states
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub events: Vec<RaceEvent>,
    pub contacts: Vec<Contact>,
}

/// What a renderer or HUD needs to know about one car
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleSnapshot {
    pub id: VehicleId,
    pub kind: VehicleKind,
    pub position: Position,
    pub heading: f32,
    pub speed: f32,
    pub lap_count: u32,
    pub rank: usize,
}

/// The main simulation world
pub struct SimWorld {
    pub config: RaceConfig,

    /// The active track, rebuilt on track change
    pub track: Track,

    /// All cars, in grid order
    pub cars: Vec<SimCar>,

    /// The human-driven car
    player: Option<VehicleId>,

    /// Next ID to assign
    next_id: usize,

    /// Simulation time in seconds
    pub time: f32,

    /// Number of ticks since the race started
    pub ticks: u64,

    /// Ranking after the last tick
    standings: Vec<Standing>,

    finished: bool,

    /// Optional seeded RNG for reproducible opponent classes
    rng: Option<StdRng>,
}

impl SimWorld {
    fn new_internal(config: RaceConfig, rng: Option<StdRng>, populate: bool) -> Result<Self> {
        let track = Track::preset(config.track)?;
        let mut world = Self {
            config,
            track,
            cars: Vec::new(),
            player: None,
            next_id: 0,
            time: 0.0,
            ticks: 0,
            standings: Vec::new(),
            finished: false,
            rng,
        };
        if populate {
            world.populate_grid();
        }
        info!(
            "Race ready on {} with {} car(s)",
            world.track.name,
            world.cars.len()
        );
        Ok(world)
    }

    /// Create a race with the player and the configured opponents on the grid
    pub fn new(config: RaceConfig) -> Result<Self> {
        Self::new_internal(config, None, true)
    }

    /// Create a race with a seeded RNG for reproducible simulations
    pub fn new_with_seed(config: RaceConfig, seed: u64) -> Result<Self> {
        Self::new_internal(config, Some(StdRng::seed_from_u64(seed)), true)
    }

    /// Create a world on the configured track with no cars at all
    pub fn empty(config: RaceConfig) -> Result<Self> {
        Self::new_internal(config, None, false)
    }

    fn random_class(&mut self) -> CarClass {
        match &mut self.rng {
            Some(rng) => CarClass::random(rng),
            None => CarClass::random(&mut rand::rng()),
        }
    }

    fn next_vehicle_id(&mut self) -> VehicleId {
        let id = VehicleId(self.next_id);
        self.next_id += 1;
        id
    }

    fn populate_grid(&mut self) {
        let (position, heading) = self.track.start_slot(0);
        self.add_player(position, heading);

        let mut opponents = self.config.opponents;
        if opponents >= GRID_SLOTS {
            warn!(
                "Only {} grid slots available; racing {} opponent(s) instead of {}",
                GRID_SLOTS,
                GRID_SLOTS - 1,
                opponents
            );
            opponents = GRID_SLOTS - 1;
        }

        let controller = PursuitController::from_difficulty(self.config.difficulty);
        for slot in 1..=opponents {
            let (position, heading) = self.track.start_slot(slot);
            let class = self.random_class();
            self.add_ai(position, heading, Some(class), controller);
        }
        self.line_up();
    }

    /// Every car on its grid slot, at rest, with no laps, chasing the first
    /// waypoint ahead of its slot
    fn line_up(&mut self) {
        for (slot, car) in self.cars.iter_mut().enumerate() {
            let (position, heading) = self.track.start_slot(slot);
            car.reset(position, heading, self.track.start_waypoint(&position));
        }
        self.refresh_standings();
    }

    /// Add the player's car. A world has at most one; adding another
    /// replaces which car counts as the player.
    pub fn add_player(&mut self, position: Position, heading: f32) -> VehicleId {
        let id = self.next_vehicle_id();
        let car = SimCar::new_player(id, self.config.player_class, position, heading);
        self.cars.push(car);
        self.player = Some(id);
        id
    }

    /// Add an AI car driven by `controller`
    pub fn add_ai(
        &mut self,
        position: Position,
        heading: f32,
        class: Option<CarClass>,
        controller: PursuitController,
    ) -> VehicleId {
        let id = self.next_vehicle_id();
        self.cars.push(SimCar::new_ai(id, class, position, heading, controller));
        id
    }

    pub fn car(&self, id: VehicleId) -> Option<&SimCar> {
        self.cars.iter().find(|car| car.id == id)
    }

    pub fn car_mut(&mut self, id: VehicleId) -> Option<&mut SimCar> {
        self.cars.iter_mut().find(|car| car.id == id)
    }

    pub fn player_id(&self) -> Option<VehicleId> {
        self.player
    }

    pub fn player(&self) -> Option<&SimCar> {
        self.player.and_then(|id| self.car(id))
    }

    /// The player's lap count and lap times
    pub fn race_state(&self) -> Option<&LapTracker> {
        self.player().map(|car| &car.laps)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Switch to another track: rebuild it and put every car back on the grid
    pub fn select_track(&mut self, id: TrackId) -> Result<()> {
        let track =
            Track::preset(id).with_context(|| format!("Failed to load track {}", id.name()))?;
        self.track = track;
        self.config.track = id;
        info!("Track changed to {}", self.track.name);
        self.reset_race();
        Ok(())
    }

    /// Put every car back on its grid slot with no laps and no time
    pub fn reset_race(&mut self) {
        self.line_up();
        self.time = 0.0;
        self.ticks = 0;
        self.finished = false;
        info!("Race reset on {}", self.track.name);
    }

    /// Progress metric of a car, used for ranking
    pub fn progress_of(&self, car: &SimCar) -> f32 {
        progress_metric(
            car.laps.lap_count,
            car.waypoint_index,
            &car.body.position,
            self.track.waypoints(),
            self.track.finish_line(),
        )
    }

    fn refresh_standings(&mut self) {
        let progress: Vec<(VehicleId, f32)> = self
            .cars
            .iter()
            .map(|car| (car.id, self.progress_of(car)))
            .collect();
        self.standings = compute_standings(&progress);
    }

    /// Cars ordered leader first
    pub fn standings(&self) -> &[Standing] {
        &self.standings
    }

    pub fn rank_of(&self, id: VehicleId) -> Option<usize> {
        self.standings
            .iter()
            .find(|standing| standing.vehicle == id)
            .map(|standing| standing.rank)
    }

    /// Control intents that drive the player's car around the track
    pub fn autopilot_input(&self) -> ControlIntents {
        let waypoints = self.track.waypoints();
        match self.player() {
            Some(car) if !waypoints.is_empty() => {
                let target = waypoints[car.waypoint_index % waypoints.len()];
                autopilot_intents(&car.body, &target)
            }
            _ => ControlIntents::none(),
        }
    }

    /// Main simulation tick
    ///
    /// Moves every car, resolves collisions against the post-movement
    /// positions, then counts finish-line crossings and re-ranks. Once the
    /// race is finished further ticks do nothing.
    pub fn tick(&mut self, input: ControlIntents, delta_secs: f32) -> TickReport {
        let mut report = TickReport::default();
        if self.finished {
            return report;
        }

        self.time += delta_secs;
        self.ticks += 1;

        let clamp_ai = self.config.clamp_ai_to_world;
        for car in &mut self.cars {
            car.laps.advance_clock(delta_secs);
            car.update(&input, &self.track, clamp_ai);
        }

        let mut bodies: Vec<_> = self
            .cars
            .iter_mut()
            .map(|car| (car.id, &mut car.body))
            .collect();
        report.contacts = resolve_collisions(&mut bodies);

        let finish_line = *self.track.finish_line();
        for car in &mut self.cars {
            let body = &car.body;
            if !finish_line.crossed(body.previous_x, body.position.x, body.position.y) {
                continue;
            }
            let lap_time = car.laps.complete_lap();
            let lap = car.laps.lap_count;
            if Some(car.id) == self.player {
                info!(
                    "Lap {} completed in {:.2}s (best {:.2}s)",
                    lap,
                    lap_time,
                    car.laps.best_lap_time.unwrap_or(lap_time)
                );
            } else {
                debug!("Car {} completed lap {} in {:.2}s", car.id.0, lap, lap_time);
            }
            report.events.push(RaceEvent::LapCompleted {
                vehicle: car.id,
                lap,
                lap_time,
            });
        }

        self.refresh_standings();

        let player_laps = self.race_state().map(|state| state.lap_count);
        if let (Some(target), Some(laps)) = (self.config.target_laps, player_laps) {
            if laps >= target {
                self.finished = true;
                let record = self.race_record();
                info!(
                    "Race finished after {} laps in {:.2}s",
                    record.laps, record.total_time
                );
                report.events.push(RaceEvent::RaceFinished(record));
            }
        }

        report
    }

    /// Values to hand to the persistence layer for the player's race
    pub fn race_record(&self) -> RaceRecord {
        let laps = self.race_state().cloned().unwrap_or_default();
        RaceRecord {
            track: self.track.name.clone(),
            laps: laps.lap_count,
            best_lap_time: laps.best_lap_time,
            total_time: laps.total_time,
        }
    }

    /// Per-car state for rendering
    pub fn snapshots(&self) -> Vec<VehicleSnapshot> {
        self.cars
            .iter()
            .map(|car| VehicleSnapshot {
                id: car.id,
                kind: car.kind(),
                position: car.body.position,
                heading: car.body.heading,
                speed: car.body.speed,
                lap_count: car.laps.lap_count,
                rank: self.rank_of(car.id).unwrap_or(self.cars.len()),
            })
            .collect()
    }

    /// Print a summary of the race state
    pub fn print_summary(&self) {
        println!("=== Race Summary ===");
        println!("Track: {}", self.track.name);
        println!("Time: {:.2}s ({} ticks)", self.time, self.ticks);
        if let Some(state) = self.race_state() {
            let format_time =
                |t: Option<f32>| t.map(|t| format!("{:.2}s", t)).unwrap_or_else(|| "--".to_string());
            match self.config.target_laps {
                Some(target) => println!("Lap: {}/{}", state.lap_count, target),
                None => println!("Lap: {}", state.lap_count),
            }
            println!(
                "Lap time: {:.2}s, Last: {}, Best: {}",
                state.current_lap_time,
                format_time(state.last_lap_time),
                format_time(state.best_lap_time)
            );
        }
        println!();

        println!("--- Standings ---");
        for standing in &self.standings {
            if let Some(car) = self.car(standing.vehicle) {
                let label = match car.kind() {
                    VehicleKind::Player => "Player".to_string(),
                    VehicleKind::Ai => format!("AI {}", car.id.0),
                };
                println!(
                    "  P{} {:<8} car={:<16} laps={} speed={:.1} position=({:.0}, {:.0})",
                    standing.rank,
                    label,
                    car.label(),
                    car.laps.lap_count,
                    car.body.speed,
                    car.body.position.x,
                    car.body.position.y
                );
            }
        }
    }

    /// Draw a visual map of the track and cars in the terminal
    pub fn draw_map(&self) {
        // Characters per tile horizontally and vertically
        const SCALE_X: usize = 4;
        const SCALE_Y: usize = 2;

        let width = self.track.cols() * SCALE_X;
        let height = self.track.rows() * SCALE_Y;
        let tile_size = self.track.tile_size();
        let mut grid = vec![vec![' '; width]; height];

        for (row, line) in grid.iter_mut().enumerate() {
            for (col, cell) in line.iter_mut().enumerate() {
                let tile = self.track.tile(col / SCALE_X, row / SCALE_Y);
                *cell = match tile {
                    Some(tile) if tile.is_road() => '#',
                    _ => '.',
                };
            }
        }

        let to_grid = |position: &Position| -> Option<(usize, usize)> {
            if position.x < 0.0 || position.y < 0.0 {
                return None;
            }
            let col = (position.x / tile_size * SCALE_X as f32) as usize;
            let row = (position.y / tile_size * SCALE_Y as f32) as usize;
            (row < height && col < width).then_some((row, col))
        };

        // Finish line
        let finish = self.track.finish_line();
        for y in [finish.y_min + 1.0, finish.y_max - 1.0] {
            if let Some((row, col)) = to_grid(&Position::new(finish.x, y)) {
                grid[row][col] = '|';
            }
        }

        for car in &self.cars {
            if let Some((row, col)) = to_grid(&car.body.position) {
                grid[row][col] = match car.kind() {
                    VehicleKind::Player => 'P',
                    VehicleKind::Ai => char::from_digit((car.id.0 % 10) as u32, 10).unwrap_or('A'),
                };
            }
        }

        println!("\n=== Track Map ===");
        println!("Legend: #=Road, .=Grass, |=Finish line, P=Player, digits=AI cars");
        println!();
        for row in &grid {
            let line: String = row.iter().collect();
            println!("{}", line);
        }
        println!();
    }
}
