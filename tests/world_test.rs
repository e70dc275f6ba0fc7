//! Whole-race behaviour of the simulation world

use tile_racer::simulation::{
    CarClass, CarStats, ControlIntents, Difficulty, Position, PursuitController, RaceConfig, RaceEvent,
    SimWorld, Surface, Track, TrackId, VehicleId, VehicleKind, TICKS_PER_SECOND,
};

const DELTA: f32 = 1.0 / TICKS_PER_SECOND as f32;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

fn solo_config(track: TrackId, target_laps: Option<u32>) -> RaceConfig {
    RaceConfig {
        track,
        target_laps,
        opponents: 0,
        ..RaceConfig::default()
    }
}

/// An empty oval world with just the player, about to cross the line
fn player_at_line(target_laps: Option<u32>) -> (SimWorld, VehicleId) {
    let mut world = SimWorld::empty(solo_config(TrackId::Oval, target_laps)).unwrap();
    let id = world.add_player(Position::new(710.0, 1088.0), 90.0);
    world.car_mut(id).unwrap().body.speed = 8.0;
    (world, id)
}

#[test]
fn test_default_grid() {
    let world = SimWorld::new(RaceConfig::default()).unwrap();

    assert_eq!(world.cars.len(), 4);
    assert_eq!(world.player_id(), Some(VehicleId(0)));
    assert_eq!(world.cars[0].kind(), VehicleKind::Player);
    assert!(world.cars[1..].iter().all(|car| car.kind() == VehicleKind::Ai));
    assert!(world.cars[1..].iter().all(|car| car.class.is_some()));
    assert_eq!(world.standings().len(), 4);
    assert!(!world.is_finished());
    assert_eq!(world.race_state().unwrap().lap_count, 0);
}

#[test]
fn test_opponents_are_capped_by_grid_slots() {
    let config = RaceConfig {
        opponents: 10,
        ..RaceConfig::default()
    };
    let world = SimWorld::new(config).unwrap();
    assert_eq!(world.cars.len(), 6);
}

#[test]
fn test_same_seed_same_opponents() {
    let classes = |seed| {
        let world = SimWorld::new_with_seed(RaceConfig::default(), seed).unwrap();
        world.cars.iter().map(|car| car.class).collect::<Vec<_>>()
    };
    assert_eq!(classes(42), classes(42));
}

#[test]
fn test_player_class_sets_handling() {
    let config = RaceConfig {
        player_class: Some(CarClass::Motorcycle),
        ..solo_config(TrackId::Oval, None)
    };
    let world = SimWorld::new(config).unwrap();
    let player = world.player().unwrap();
    assert_eq!(player.class, Some(CarClass::Motorcycle));
    assert_eq!(player.body.stats, CarClass::Motorcycle.stats());
}

#[test]
fn test_coasting_tick_keeps_car_at_rest() {
    let mut world = SimWorld::new(solo_config(TrackId::Oval, Some(3))).unwrap();
    let start = world.player().unwrap().body.position;

    world.tick(ControlIntents::none(), DELTA);

    let player = world.player().unwrap();
    assert_eq!(player.body.speed, 0.0);
    assert_eq!(player.body.position, start);
    assert!(approx(world.time, DELTA));
    assert_eq!(world.ticks, 1);
    assert!(approx(world.race_state().unwrap().current_lap_time, DELTA));
}

#[test]
fn test_throttle_tick_moves_player() {
    let mut world = SimWorld::new(solo_config(TrackId::Oval, Some(3))).unwrap();
    let start = world.player().unwrap().body.position;

    world.tick(ControlIntents::throttle(), DELTA);

    let player = world.player().unwrap();
    assert!(approx(player.body.speed, 0.13));
    // The grid faces west
    assert!(approx(player.body.position.x, start.x - 0.13));
    assert!(approx(player.body.position.y, start.y));
}

#[test]
fn test_crossing_the_line_completes_a_lap() {
    let (mut world, id) = player_at_line(None);

    let report = world.tick(ControlIntents::none(), DELTA);

    assert_eq!(report.events.len(), 1);
    match &report.events[0] {
        RaceEvent::LapCompleted {
            vehicle,
            lap,
            lap_time,
        } => {
            assert_eq!(*vehicle, id);
            assert_eq!(*lap, 1);
            assert!(approx(*lap_time, DELTA));
        }
        other => panic!("unexpected event {:?}", other),
    }

    let state = world.race_state().unwrap();
    assert_eq!(state.lap_count, 1);
    assert_eq!(state.current_lap_time, 0.0);
    assert!(!world.is_finished());

    // Already past the line: no second lap
    let report = world.tick(ControlIntents::none(), DELTA);
    assert!(report.events.is_empty());
    assert_eq!(world.race_state().unwrap().lap_count, 1);
}

#[test]
fn test_wrong_way_crossing_does_not_count() {
    let mut world = SimWorld::empty(solo_config(TrackId::Oval, Some(1))).unwrap();
    let id = world.add_player(Position::new(700.0, 1088.0), 270.0);
    world.car_mut(id).unwrap().body.speed = 8.0;

    let report = world.tick(ControlIntents::none(), DELTA);

    assert!(world.car(id).unwrap().body.position.x > 704.0);
    assert!(report.events.is_empty());
    assert_eq!(world.race_state().unwrap().lap_count, 0);
}

#[test]
fn test_reaching_target_laps_finishes_the_race() {
    let (mut world, _) = player_at_line(Some(1));

    let report = world.tick(ControlIntents::none(), DELTA);

    assert!(world.is_finished());
    let record = report
        .events
        .iter()
        .find_map(|event| match event {
            RaceEvent::RaceFinished(record) => Some(record.clone()),
            _ => None,
        })
        .expect("race should finish");
    assert_eq!(record.track, "Oval");
    assert_eq!(record.laps, 1);
    assert!(approx(record.best_lap_time.unwrap(), DELTA));
    assert!(approx(record.total_time, DELTA));
    assert_eq!(record, world.race_record());

    // Nothing moves once the race is over
    let position = world.player().unwrap().body.position;
    let report = world.tick(ControlIntents::throttle(), DELTA);
    assert!(report.events.is_empty());
    assert_eq!(world.ticks, 1);
    assert_eq!(world.player().unwrap().body.position, position);
}

#[test]
fn test_race_record_before_any_lap() {
    let world = SimWorld::new(RaceConfig::default()).unwrap();
    let record = world.race_record();
    assert_eq!(record.track, "Oval");
    assert_eq!(record.laps, 0);
    assert_eq!(record.best_lap_time, None);
    assert_eq!(record.total_time, 0.0);
}

#[test]
fn test_select_track_resets_the_race() {
    let mut world = SimWorld::new(RaceConfig::default()).unwrap();
    for _ in 0..120 {
        world.tick(ControlIntents::throttle(), DELTA);
    }
    assert!(world.time > 0.0);

    world.select_track(TrackId::Figure8).unwrap();

    assert_eq!(world.track.name, "Figure-8");
    assert_eq!(world.config.track, TrackId::Figure8);
    assert_eq!(world.time, 0.0);
    assert_eq!(world.ticks, 0);
    assert_eq!(world.cars.len(), 4);

    let figure8 = Track::preset(TrackId::Figure8).unwrap();
    for (slot, car) in world.cars.iter().enumerate() {
        let (position, heading) = figure8.start_slot(slot);
        assert_eq!(car.body.position, position);
        assert_eq!(car.body.heading, heading);
        assert_eq!(car.body.speed, 0.0);
        assert_eq!(car.waypoint_index, figure8.start_waypoint(&position));
        assert_eq!(car.laps.lap_count, 0);
    }
}

#[test]
fn test_reset_race_clears_finish() {
    let (mut world, id) = player_at_line(Some(1));
    world.tick(ControlIntents::none(), DELTA);
    assert!(world.is_finished());

    world.reset_race();

    assert!(!world.is_finished());
    assert_eq!(world.race_state().unwrap().lap_count, 0);
    let (position, _) = world.track.start_slot(0);
    assert_eq!(world.car(id).unwrap().body.position, position);
}

#[test]
fn test_autopilot_finishes_a_solo_race() {
    for track in TrackId::ALL {
        let mut world = SimWorld::new(solo_config(track, Some(2))).unwrap();
        let mut off_road_ticks = 0;

        for _ in 0..3000 {
            if world.is_finished() {
                break;
            }
            let input = world.autopilot_input();
            world.tick(input, DELTA);

            let position = world.player().unwrap().body.position;
            if world.track.classify(position.x, position.y) != Surface::Road {
                off_road_ticks += 1;
            }
        }

        assert!(world.is_finished(), "{} was not finished", track.name());
        assert_eq!(world.race_record().laps, 2);
        assert_eq!(off_road_ticks, 0, "autopilot left the road on {}", track.name());
    }
}

#[test]
fn test_lone_ai_laps_the_track() {
    for track in TrackId::ALL {
        let mut world = SimWorld::empty(solo_config(track, None)).unwrap();
        let (position, heading) = world.track.start_slot(0);
        let id = world.add_ai(
            position,
            heading,
            None,
            PursuitController::from_difficulty(Difficulty::Medium),
        );

        let mut laps_seen = 0;
        for _ in 0..1500 {
            let report = world.tick(ControlIntents::none(), DELTA);
            laps_seen += report
                .events
                .iter()
                .filter(|event| matches!(event, RaceEvent::LapCompleted { vehicle, .. } if *vehicle == id))
                .count();
        }

        let car = world.car(id).unwrap();
        assert!(car.laps.lap_count >= 1, "AI did not lap {}", track.name());
        assert_eq!(laps_seen as u32, car.laps.lap_count);
        assert!(car.laps.best_lap_time.is_some());
        // No player, so the race never ends on its own
        assert!(!world.is_finished());
    }
}

#[test]
fn test_more_laps_rank_first() {
    let config = RaceConfig {
        opponents: 1,
        ..RaceConfig::default()
    };
    let mut world = SimWorld::new(config).unwrap();
    let player = world.player_id().unwrap();
    let ai = VehicleId(1);
    world.car_mut(ai).unwrap().laps.lap_count = 2;

    world.tick(ControlIntents::none(), DELTA);

    assert_eq!(world.rank_of(ai), Some(1));
    assert_eq!(world.rank_of(player), Some(2));
    assert_eq!(world.standings()[0].vehicle, ai);
}

/// Largest tick-to-tick fall in progress allowed: the fraction term alone
const MAX_PROGRESS_DROP: f32 = 1.0;

#[test]
fn test_ai_progress_never_falls_back_a_lap() {
    for track in TrackId::ALL {
        let mut world = SimWorld::empty(solo_config(track, None)).unwrap();
        let (position, heading) = world.track.start_slot(0);
        let id = world.add_ai(
            position,
            heading,
            None,
            PursuitController::from_difficulty(Difficulty::Hard),
        );

        let mut last = world.progress_of(world.car(id).unwrap());
        for tick in 0..1800 {
            world.tick(ControlIntents::none(), DELTA);
            let car = world.car(id).unwrap();
            let progress = world.progress_of(car);
            assert!(
                last - progress < MAX_PROGRESS_DROP,
                "{}: tick {} progress {:.2} -> {:.2} at x={:.1} laps={} index={}",
                track.name(),
                tick,
                last,
                progress,
                car.body.position.x,
                car.laps.lap_count,
                car.waypoint_index
            );
            last = progress;
        }
        assert!(world.car(id).unwrap().laps.lap_count >= 2, "AI did not lap {} twice", track.name());
    }
}

#[test]
fn test_player_progress_never_falls_back_a_lap() {
    for track in TrackId::ALL {
        let mut world = SimWorld::new(solo_config(track, Some(2))).unwrap();
        let mut last = world.progress_of(world.player().unwrap());

        while !world.is_finished() && world.ticks < 3000 {
            let input = world.autopilot_input();
            world.tick(input, DELTA);
            let progress = world.progress_of(world.player().unwrap());
            assert!(
                last - progress < MAX_PROGRESS_DROP,
                "{}: tick {} progress {:.2} -> {:.2}",
                track.name(),
                world.ticks,
                last,
                progress
            );
            last = progress;
        }
        assert!(world.is_finished());
    }
}

#[test]
fn test_leader_keeps_first_place_through_the_line() {
    let mut world = SimWorld::empty(solo_config(TrackId::Oval, None)).unwrap();
    let controller = PursuitController::from_difficulty(Difficulty::Hard);
    let west = 90.0;

    // Leader one tile short of the line, chaser one tile further back
    let leader = world.add_ai(Position::new(832.0, 1088.0), west, None, controller);
    let chaser = world.add_ai(Position::new(1000.0, 1088.0), west, None, controller);
    let last = world.track.waypoints().len() - 1;
    for (id, index) in [(leader, last), (chaser, last - 1)] {
        let car = world.car_mut(id).unwrap();
        car.waypoint_index = index;
        car.body.speed = 4.0;
    }

    let mut ticks_after_lap = 0;
    while ticks_after_lap < 30 {
        world.tick(ControlIntents::none(), DELTA);
        assert_eq!(
            world.rank_of(leader),
            Some(1),
            "leader lost first place at tick {} (x={:.1}, index={})",
            world.ticks,
            world.car(leader).unwrap().body.position.x,
            world.car(leader).unwrap().waypoint_index
        );
        assert_eq!(world.rank_of(chaser), Some(2));
        if world.car(leader).unwrap().laps.lap_count > 0 {
            ticks_after_lap += 1;
        }
        assert!(world.ticks < 300, "leader never crossed the line");
    }
}

#[test]
fn test_front_row_starts_level() {
    let config = RaceConfig {
        opponents: 1,
        ..RaceConfig::default()
    };
    let mut world = SimWorld::new(config).unwrap();
    let player = world.player_id().unwrap();
    let ai = VehicleId(1);

    // Mirror-image slots either side of the centre line
    assert_eq!(world.rank_of(player), Some(1));
    assert_eq!(world.rank_of(ai), Some(1));

    let input = world.autopilot_input();
    world.tick(input, DELTA);
    assert_eq!(world.car(player).unwrap().waypoint_index, 0);
    assert_eq!(world.car(ai).unwrap().waypoint_index, 0);
}

#[test]
fn test_ai_class_is_only_a_livery() {
    let world = SimWorld::new_with_seed(RaceConfig::default(), 5).unwrap();
    let player = world.player().unwrap();
    assert_eq!(player.label(), "Default");

    for car in world.cars.iter().filter(|car| car.kind() == VehicleKind::Ai) {
        let class = car.class.unwrap();
        assert_eq!(car.label(), format!("{} livery", class.name()));
        assert_eq!(car.body.stats, CarStats::ai_default());
    }
}

#[test]
fn test_snapshots_describe_every_car() {
    let mut world = SimWorld::new(RaceConfig::default()).unwrap();
    world.tick(ControlIntents::throttle(), DELTA);

    let snapshots = world.snapshots();
    assert_eq!(snapshots.len(), world.cars.len());
    assert_eq!(snapshots[0].kind, VehicleKind::Player);
    assert_eq!(snapshots[0].id, VehicleId(0));

    for (snapshot, car) in snapshots.iter().zip(&world.cars) {
        assert_eq!(snapshot.position, car.body.position);
        assert_eq!(snapshot.speed, car.body.speed);
        assert_eq!(snapshot.lap_count, car.laps.lap_count);
        assert!(snapshot.rank >= 1 && snapshot.rank <= world.cars.len());
    }
}
