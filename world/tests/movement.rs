use std::time::Duration;

use proptest::prelude::*;
use silverton_core::{Command, Direction, Event, Occupant, SceneLayout, TileCoord, TileGrid};
use silverton_world::{self as world, query, World, DEFAULT_GLIDE_DURATION};

const COLUMNS: u32 = 8;
const ROWS: u32 = 6;

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::Up),
        Just(Direction::Down),
        Just(Direction::Left),
        Just(Direction::Right),
    ]
}

fn open_layout(spawn: TileCoord, occupants: Vec<Occupant>) -> SceneLayout {
    SceneLayout {
        grid: TileGrid::open(COLUMNS, ROWS, 16.0),
        spawn,
        facing: Direction::Down,
        occupants,
        glide_duration: DEFAULT_GLIDE_DURATION,
    }
}

fn step(world: &mut World, direction: Direction) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::StepPlayer { direction }, &mut events);
    events
}

fn tick(world: &mut World, dt: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::Tick { dt }, &mut events);
    events
}

proptest! {
    #[test]
    fn free_targets_accept_the_step_and_release_after_glide(
        column in 0..COLUMNS as i32,
        row in 0..ROWS as i32,
        direction in direction_strategy(),
    ) {
        let spawn = TileCoord::new(column, row);
        let target = spawn.step(direction);
        let mut world = World::with_layout(open_layout(spawn, Vec::new()));
        let in_bounds = query::tile_grid(&world).contains(target);

        let events = step(&mut world, direction);
        let player = query::player(&world);

        if in_bounds {
            prop_assert_eq!(player.tile, target);
            prop_assert_eq!(player.facing, direction);
            prop_assert!(player.is_moving);
            prop_assert_eq!(events.len(), 1);

            let _ = tick(&mut world, DEFAULT_GLIDE_DURATION);
            prop_assert!(!query::player(&world).is_moving);
        } else {
            prop_assert_eq!(player.tile, spawn);
            prop_assert_eq!(player.facing, Direction::Down);
            prop_assert!(!player.is_moving);
            prop_assert!(events.is_empty());
        }
    }

    #[test]
    fn occupied_targets_leave_player_untouched(
        column in 1..(COLUMNS as i32 - 1),
        row in 1..(ROWS as i32 - 1),
        direction in direction_strategy(),
    ) {
        let spawn = TileCoord::new(column, row);
        let blocker = Occupant::npc(
            spawn.step(direction),
            "NPC_BLOCKER".into(),
            None,
            Direction::Down,
        );
        let mut world = World::with_layout(open_layout(spawn, vec![blocker]));

        let events = step(&mut world, direction);
        let player = query::player(&world);

        prop_assert!(events.is_empty());
        prop_assert_eq!(player.tile, spawn);
        prop_assert_eq!(player.facing, Direction::Down);
        prop_assert!(!player.is_moving);
    }

    #[test]
    fn steps_during_glide_are_strict_no_ops(
        first in direction_strategy(),
        second in direction_strategy(),
        elapsed_ms in 0u64..159,
    ) {
        let spawn = TileCoord::new(3, 3);
        let mut world = World::with_layout(open_layout(spawn, Vec::new()));
        let _ = step(&mut world, first);
        let _ = tick(&mut world, Duration::from_millis(elapsed_ms));
        let before = query::player(&world);

        let events = step(&mut world, second);

        prop_assert!(events.is_empty());
        let after = query::player(&world);
        prop_assert_eq!(after.tile, before.tile);
        prop_assert_eq!(after.facing, before.facing);
        prop_assert!(after.is_moving);
    }

    #[test]
    fn facing_tile_matches_direction_offsets(
        column in 0..COLUMNS as i32,
        row in 0..ROWS as i32,
        direction in direction_strategy(),
    ) {
        let spawn = TileCoord::new(column, row);
        let layout = SceneLayout {
            facing: direction,
            ..open_layout(spawn, Vec::new())
        };
        let world = World::with_layout(layout);

        let expected = match direction {
            Direction::Up => TileCoord::new(column, row - 1),
            Direction::Down => TileCoord::new(column, row + 1),
            Direction::Left => TileCoord::new(column - 1, row),
            Direction::Right => TileCoord::new(column + 1, row),
        };
        prop_assert_eq!(query::facing_tile(&world), expected);
        prop_assert_eq!(query::facing_tile(&world), expected);
        prop_assert_eq!(query::player(&world).tile, spawn);
    }
}

#[test]
fn second_step_is_refused_until_glide_completes() {
    let mut world = World::with_layout(open_layout(TileCoord::new(0, 0), Vec::new()));

    let first = step(&mut world, Direction::Right);
    assert_eq!(first.len(), 1);
    assert!(step(&mut world, Direction::Right).is_empty());
    assert_eq!(query::player(&world).tile, TileCoord::new(1, 0));

    let arrival = tick(&mut world, Duration::from_millis(160));
    assert!(arrival.contains(&Event::PlayerArrived {
        tile: TileCoord::new(1, 0)
    }));

    let second = step(&mut world, Direction::Right);
    assert_eq!(
        second,
        vec![Event::PlayerMoved {
            from: TileCoord::new(1, 0),
            to: TileCoord::new(2, 0),
            facing: Direction::Right,
        }]
    );
}

#[test]
fn glide_is_frame_rate_independent() {
    let mut coarse = World::with_layout(open_layout(TileCoord::new(0, 0), Vec::new()));
    let mut fine = World::with_layout(open_layout(TileCoord::new(0, 0), Vec::new()));
    let _ = step(&mut coarse, Direction::Down);
    let _ = step(&mut fine, Direction::Down);

    let _ = tick(&mut coarse, Duration::from_millis(160));
    for _ in 0..10 {
        let _ = tick(&mut fine, Duration::from_millis(16));
    }

    assert!(!query::player(&coarse).is_moving);
    assert!(!query::player(&fine).is_moving);
    assert_eq!(query::player(&coarse), query::player(&fine));
}

#[test]
fn blocked_tiles_reject_steps() {
    let layout = SceneLayout {
        grid: TileGrid::open(COLUMNS, ROWS, 16.0).with_blocked(TileCoord::new(2, 1)),
        ..open_layout(TileCoord::new(1, 1), Vec::new())
    };
    let mut world = World::with_layout(layout);

    assert!(step(&mut world, Direction::Right).is_empty());
    assert_eq!(query::player(&world).tile, TileCoord::new(1, 1));
    assert_eq!(query::player(&world).facing, Direction::Down);
}
