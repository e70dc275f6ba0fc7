use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use tile_racer::simulation::{
    CarClass, Difficulty, RaceConfig, RaceEvent, SimWorld, TrackId, TICKS_PER_SECOND,
};

#[derive(Parser)]
#[command(name = "tile_racer")]
#[command(about = "Top-down arcade race simulation, run headless with an autopilot player")]
struct Cli {
    /// Track to race on (oval, figure8)
    #[arg(long, default_value = "oval")]
    track: String,

    /// Laps the player has to complete
    #[arg(long, default_value = "3")]
    laps: u32,

    /// Number of AI opponents
    #[arg(long, default_value = "3")]
    opponents: usize,

    /// AI difficulty (easy, medium, hard)
    #[arg(long, default_value = "medium")]
    difficulty: String,

    /// Player car class (sports, muscle, sedan, truck, racer, motorcycle)
    #[arg(long)]
    car: Option<String>,

    /// Stop after this many ticks even if the race is not over
    #[arg(long, default_value = "36000")]
    ticks: u64,

    /// Time delta per tick in seconds
    #[arg(long, default_value_t = 1.0 / TICKS_PER_SECOND as f32)]
    delta: f32,

    /// Seed for reproducible opponent car classes
    #[arg(long)]
    seed: Option<u64>,

    /// Keep AI cars inside the world boundary like the player
    #[arg(long)]
    clamp_ai: bool,

    /// Print the race record as JSON when done
    #[arg(long)]
    json: bool,

    /// Draw the track map every ten simulated seconds
    #[arg(long)]
    map: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = RaceConfig {
        track: TrackId::from_name(&cli.track)?,
        target_laps: Some(cli.laps),
        opponents: cli.opponents,
        difficulty: Difficulty::from_name(&cli.difficulty)?,
        player_class: cli.car.as_deref().map(CarClass::from_name),
        clamp_ai_to_world: cli.clamp_ai,
    };

    let mut world = match cli.seed {
        Some(seed) => SimWorld::new_with_seed(config, seed)?,
        None => SimWorld::new(config)?,
    };

    run_headless(&mut world, cli.ticks, cli.delta, cli.map);

    if cli.json {
        let record = serde_json::to_string_pretty(&world.race_record())
            .context("Failed to serialize race record")?;
        println!("{}", record);
    }
    Ok(())
}

/// Run the race with the autopilot at the wheel until it ends or the tick
/// cap is hit
fn run_headless(world: &mut SimWorld, max_ticks: u64, delta: f32, draw_map: bool) {
    info!("Running race simulation in headless mode...");
    info!("Tick cap: {}, Delta: {:.4}s", max_ticks, delta);

    let report_every = (10.0 / delta).ceil().max(1.0) as u64;

    println!("Initial state:");
    world.print_summary();
    if draw_map {
        world.draw_map();
    }

    let mut tick = 0;
    while tick < max_ticks && !world.is_finished() {
        tick += 1;
        let input = world.autopilot_input();
        let report = world.tick(input, delta);

        for event in &report.events {
            if let RaceEvent::RaceFinished(record) = event {
                info!("Chequered flag on {} at tick {}", record.track, tick);
            }
        }

        if draw_map && tick % report_every == 0 {
            println!("--- After tick {} ({:.1}s simulated time) ---", tick, world.time);
            world.print_summary();
            world.draw_map();
        }
    }

    if !world.is_finished() {
        warn!("Tick cap reached before the race was finished");
    }

    println!("=== Final State ===");
    world.print_summary();
    if draw_map {
        world.draw_map();
    }

    let record = world.race_record();
    info!("RACE COMPLETE");
    info!("Track: {}", record.track);
    info!("Laps completed: {}", record.laps);
    match record.best_lap_time {
        Some(best) => info!("Best lap: {:.2}s", best),
        None => info!("Best lap: none"),
    }
    info!("Total time: {:.2}s", record.total_time);
    if let Some(rank) = world.player_id().and_then(|id| world.rank_of(id)) {
        info!("Final position: {}", rank);
    }
}
