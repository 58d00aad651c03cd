#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Silverton.
//!
//! The world owns the player's tile position, the static collision grid and
//! the occupant tables. It resolves steps and interactions and reports the
//! outcome as [`Event`] values pushed into the caller's buffer.

use std::time::Duration;

use silverton_core::{
    Command, Direction, Event, Occupant, OccupantId, SceneLayout, TileCoord, TileGrid,
    WELCOME_BANNER,
};
use tracing::debug;

const DEFAULT_TILE_LENGTH: f32 = 32.0;

/// Default duration of the visual glide between two tiles.
pub const DEFAULT_GLIDE_DURATION: Duration = Duration::from_millis(160);

/// Represents the authoritative Silverton world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    tile_grid: TileGrid,
    player: Player,
    occupants: Vec<Occupant>,
    glide_duration: Duration,
}

impl World {
    /// Creates an empty world awaiting a scene layout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            tile_grid: TileGrid::open(0, 0, DEFAULT_TILE_LENGTH),
            player: Player::spawn(TileCoord::default(), Direction::default()),
            occupants: Vec::new(),
            glide_duration: DEFAULT_GLIDE_DURATION,
        }
    }

    /// Creates a world with the provided layout already loaded.
    #[must_use]
    pub fn with_layout(layout: SceneLayout) -> Self {
        let mut world = Self::new();
        world.load(layout);
        world
    }

    fn load(&mut self, layout: SceneLayout) {
        let SceneLayout {
            grid,
            spawn,
            facing,
            occupants,
            glide_duration,
        } = layout;
        self.tile_grid = grid;
        self.player = Player::spawn(spawn, facing);
        self.occupants = occupants;
        self.glide_duration = glide_duration;
    }

    fn is_occupied(&self, tile: TileCoord) -> bool {
        self.occupants.iter().any(|occupant| occupant.tile() == tile)
    }

    fn try_step(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        if self.player.is_moving() {
            return;
        }

        let from = self.player.tile;
        let to = from.step(direction);
        if self.tile_grid.is_blocked(to) || self.is_occupied(to) {
            return;
        }

        self.player.tile = to;
        self.player.facing = direction;
        self.player.glide = Some(Glide::new(from, to));
        out_events.push(Event::PlayerMoved {
            from,
            to,
            facing: direction,
        });
    }

    fn advance_glide(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(glide) = self.player.glide.as_mut() else {
            return;
        };

        glide.elapsed = glide.elapsed.saturating_add(dt);
        if glide.elapsed >= self.glide_duration {
            self.player.glide = None;
            out_events.push(Event::PlayerArrived {
                tile: self.player.tile,
            });
        }
    }

    fn interact(&mut self, out_events: &mut Vec<Event>) {
        let player_tile = self.player.tile;
        let front = self.player.facing_tile();

        let npc = self
            .occupants
            .iter()
            .position(|occupant| occupant.is_npc() && occupant.tile() == front);
        let index = npc.or_else(|| {
            self.occupants
                .iter()
                .position(|occupant| !occupant.is_npc() && occupant.tile() == front)
        });
        let Some(index) = index else {
            return;
        };

        let occupant = &mut self.occupants[index];
        if occupant.is_npc() {
            if let Some(facing) = Direction::toward(occupant.tile(), player_tile) {
                occupant.turn(facing);
                out_events.push(Event::OccupantTurned {
                    occupant: occupant_id(index),
                    facing,
                });
            }
        }

        out_events.push(Event::Interaction {
            dialog_id: occupant.dialog_id().clone(),
            speaker: occupant.speaker().map(str::to_owned),
        });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadScene { layout } => {
            world.load(layout);
            let spawn = world.player.tile;
            debug!(
                columns = world.tile_grid.columns(),
                rows = world.tile_grid.rows(),
                occupants = world.occupants.len(),
                "scene_loaded"
            );
            out_events.push(Event::SceneLoaded {
                columns: world.tile_grid.columns(),
                rows: world.tile_grid.rows(),
                spawn,
            });
        }
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
            world.advance_glide(dt, out_events);
        }
        Command::StepPlayer { direction } => world.try_step(direction, out_events),
        Command::Interact => world.interact(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use silverton_core::{Direction, Occupant, OccupantId, PixelPosition, TileCoord, TileGrid};

    use super::{occupant_id, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the world's collision grid.
    #[must_use]
    pub fn tile_grid(world: &World) -> &TileGrid {
        &world.tile_grid
    }

    /// Captures the player's logical and visual state.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        let player = &world.player;
        let pixel_center = match &player.glide {
            Some(glide) => {
                let progress = if world.glide_duration.is_zero() {
                    1.0
                } else {
                    glide.elapsed.as_secs_f32() / world.glide_duration.as_secs_f32()
                };
                let from = world.tile_grid.pixel_center(glide.from);
                let to = world.tile_grid.pixel_center(glide.to);
                from.lerp(to, progress)
            }
            None => world.tile_grid.pixel_center(player.tile),
        };

        PlayerSnapshot {
            tile: player.tile,
            facing: player.facing,
            is_moving: player.is_moving(),
            pixel_center,
        }
    }

    /// Tile directly in front of the player.
    #[must_use]
    pub fn facing_tile(world: &World) -> TileCoord {
        world.player.facing_tile()
    }

    /// Captures every occupant in load order.
    #[must_use]
    pub fn occupants(world: &World) -> Vec<OccupantSnapshot> {
        world
            .occupants
            .iter()
            .enumerate()
            .map(|(index, occupant)| OccupantSnapshot::capture(index, occupant))
            .collect()
    }

    /// Returns the occupant standing on the provided tile, preferring NPCs.
    #[must_use]
    pub fn occupant_at(world: &World, tile: TileCoord) -> Option<OccupantSnapshot> {
        let mut matches = world
            .occupants
            .iter()
            .enumerate()
            .filter(|(_, occupant)| occupant.tile() == tile);
        let first = matches.next()?;
        let chosen = if first.1.is_npc() {
            first
        } else {
            matches
                .find(|(_, occupant)| occupant.is_npc())
                .unwrap_or(first)
        };
        Some(OccupantSnapshot::capture(chosen.0, chosen.1))
    }

    /// Immutable representation of the player used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct PlayerSnapshot {
        /// Logical tile, authoritative from the moment a step is accepted.
        pub tile: TileCoord,
        /// Direction the player faces.
        pub facing: Direction,
        /// Whether a glide is in flight and further steps are refused.
        pub is_moving: bool,
        /// Interpolated pixel centre used for presentation.
        pub pixel_center: PixelPosition,
    }

    /// Immutable representation of an occupant used for queries.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct OccupantSnapshot {
        /// Identifier assigned by the world.
        pub id: OccupantId,
        /// Occupant data including the current NPC facing.
        pub occupant: Occupant,
    }

    impl OccupantSnapshot {
        fn capture(index: usize, occupant: &Occupant) -> Self {
            Self {
                id: occupant_id(index),
                occupant: occupant.clone(),
            }
        }
    }
}

#[derive(Clone, Debug)]
struct Player {
    tile: TileCoord,
    facing: Direction,
    glide: Option<Glide>,
}

impl Player {
    fn spawn(tile: TileCoord, facing: Direction) -> Self {
        Self {
            tile,
            facing,
            glide: None,
        }
    }

    fn is_moving(&self) -> bool {
        self.glide.is_some()
    }

    fn facing_tile(&self) -> TileCoord {
        self.tile.step(self.facing)
    }
}

#[derive(Clone, Copy, Debug)]
struct Glide {
    from: TileCoord,
    to: TileCoord,
    elapsed: Duration,
}

impl Glide {
    fn new(from: TileCoord, to: TileCoord) -> Self {
        Self {
            from,
            to,
            elapsed: Duration::ZERO,
        }
    }
}

fn occupant_id(index: usize) -> OccupantId {
    OccupantId::new(u32::try_from(index).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use silverton_core::{DialogId, PixelPosition};

    fn layout(occupants: Vec<Occupant>) -> SceneLayout {
        SceneLayout {
            grid: TileGrid::open(5, 5, 32.0).with_blocked(TileCoord::new(3, 2)),
            spawn: TileCoord::new(2, 2),
            facing: Direction::Down,
            occupants,
            glide_duration: DEFAULT_GLIDE_DURATION,
        }
    }

    fn npc(column: i32, row: i32, dialog: &str, name: &str) -> Occupant {
        Occupant::npc(
            TileCoord::new(column, row),
            DialogId::new(dialog),
            Some(name.to_owned()),
            Direction::Down,
        )
    }

    fn object(column: i32, row: i32, dialog: &str) -> Occupant {
        Occupant::object(TileCoord::new(column, row), DialogId::new(dialog))
    }

    #[test]
    fn load_scene_places_player_and_reports_dimensions() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::LoadScene {
                layout: layout(Vec::new()),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::SceneLoaded {
                columns: 5,
                rows: 5,
                spawn: TileCoord::new(2, 2),
            }]
        );
        let player = query::player(&world);
        assert_eq!(player.tile, TileCoord::new(2, 2));
        assert_eq!(player.facing, Direction::Down);
        assert!(!player.is_moving);
        assert_eq!(player.pixel_center, PixelPosition::new(80.0, 80.0));
    }

    #[test]
    fn accepted_step_updates_tile_immediately_and_locks() {
        let mut world = World::with_layout(layout(Vec::new()));
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::StepPlayer {
                direction: Direction::Up,
            },
            &mut events,
        );

        let player = query::player(&world);
        assert_eq!(player.tile, TileCoord::new(2, 1));
        assert_eq!(player.facing, Direction::Up);
        assert!(player.is_moving);
        assert_eq!(player.pixel_center, PixelPosition::new(80.0, 80.0));
        assert_eq!(
            events,
            vec![Event::PlayerMoved {
                from: TileCoord::new(2, 2),
                to: TileCoord::new(2, 1),
                facing: Direction::Up,
            }]
        );
    }

    #[test]
    fn glide_interpolates_and_unlocks_after_duration() {
        let mut world = World::with_layout(layout(Vec::new()));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StepPlayer {
                direction: Direction::Left,
            },
            &mut events,
        );

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(80),
            },
            &mut events,
        );
        let halfway = query::player(&world);
        assert!(halfway.is_moving);
        assert!((halfway.pixel_center.x() - 64.0).abs() < 0.01);
        assert_eq!(
            events,
            vec![Event::TimeAdvanced {
                dt: Duration::from_millis(80)
            }]
        );

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(80),
            },
            &mut events,
        );
        let arrived = query::player(&world);
        assert!(!arrived.is_moving);
        assert_eq!(arrived.pixel_center, PixelPosition::new(48.0, 80.0));
        assert_eq!(
            events,
            vec![
                Event::TimeAdvanced {
                    dt: Duration::from_millis(80)
                },
                Event::PlayerArrived {
                    tile: TileCoord::new(1, 2)
                },
            ]
        );
    }

    #[test]
    fn step_while_moving_is_ignored() {
        let mut world = World::with_layout(layout(Vec::new()));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StepPlayer {
                direction: Direction::Down,
            },
            &mut events,
        );
        events.clear();

        for direction in Direction::ALL {
            apply(&mut world, Command::StepPlayer { direction }, &mut events);
        }

        assert!(events.is_empty());
        let player = query::player(&world);
        assert_eq!(player.tile, TileCoord::new(2, 3));
        assert_eq!(player.facing, Direction::Down);
    }

    #[test]
    fn blocked_tile_rejects_step_without_turning() {
        let mut world = World::with_layout(layout(Vec::new()));
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::StepPlayer {
                direction: Direction::Right,
            },
            &mut events,
        );

        assert!(events.is_empty());
        let player = query::player(&world);
        assert_eq!(player.tile, TileCoord::new(2, 2));
        assert_eq!(player.facing, Direction::Down);
        assert!(!player.is_moving);
    }

    #[test]
    fn occupants_block_steps() {
        let mut world = World::with_layout(layout(vec![
            npc(2, 1, "NPC_GUIDE", "Guide"),
            object(1, 2, "SIGN"),
        ]));
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::StepPlayer {
                direction: Direction::Up,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::StepPlayer {
                direction: Direction::Left,
            },
            &mut events,
        );

        assert!(events.is_empty());
        assert_eq!(query::player(&world).tile, TileCoord::new(2, 2));
    }

    #[test]
    fn interaction_with_npc_turns_it_and_names_speaker() {
        let mut world = World::with_layout(layout(vec![npc(2, 3, "NPC_GUIDE", "Guide")]));
        let mut events = Vec::new();

        apply(&mut world, Command::Interact, &mut events);

        assert_eq!(
            events,
            vec![
                Event::OccupantTurned {
                    occupant: OccupantId::new(0),
                    facing: Direction::Up,
                },
                Event::Interaction {
                    dialog_id: DialogId::new("NPC_GUIDE"),
                    speaker: Some("Guide".to_owned()),
                },
            ]
        );
        let snapshot = query::occupant_at(&world, TileCoord::new(2, 3)).expect("npc present");
        assert_eq!(snapshot.occupant.facing(), Some(Direction::Up));
    }

    #[test]
    fn npc_takes_priority_over_object_on_same_tile() {
        let mut world = World::with_layout(layout(vec![
            object(2, 3, "SIGN"),
            npc(2, 3, "NPC_GUIDE", "Guide"),
        ]));
        let mut events = Vec::new();

        apply(&mut world, Command::Interact, &mut events);

        let interactions: Vec<_> = events
            .iter()
            .filter(|event| matches!(event, Event::Interaction { .. }))
            .collect();
        assert_eq!(
            interactions,
            vec![&Event::Interaction {
                dialog_id: DialogId::new("NPC_GUIDE"),
                speaker: Some("Guide".to_owned()),
            }]
        );
        let front = query::occupant_at(&world, TileCoord::new(2, 3)).expect("occupant");
        assert_eq!(front.id, OccupantId::new(1));
    }

    #[test]
    fn object_interaction_has_no_speaker() {
        let mut world = World::with_layout(layout(vec![object(2, 3, "SIGN")]));
        let mut events = Vec::new();

        apply(&mut world, Command::Interact, &mut events);

        assert_eq!(
            events,
            vec![Event::Interaction {
                dialog_id: DialogId::new("SIGN"),
                speaker: None,
            }]
        );
    }

    #[test]
    fn interaction_with_empty_tile_is_silent() {
        let mut world = World::with_layout(layout(vec![object(0, 0, "SIGN")]));
        let mut events = Vec::new();

        apply(&mut world, Command::Interact, &mut events);

        assert!(events.is_empty());
    }

    #[test]
    fn interaction_is_available_while_gliding() {
        let mut world = World::with_layout(layout(vec![npc(2, 4, "NPC_GUIDE", "Guide")]));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StepPlayer {
                direction: Direction::Down,
            },
            &mut events,
        );
        assert!(query::player(&world).is_moving);
        events.clear();

        apply(&mut world, Command::Interact, &mut events);

        assert!(events
            .iter()
            .any(|event| matches!(event, Event::Interaction { .. })));
    }

    #[test]
    fn facing_tile_is_pure() {
        let world = World::with_layout(layout(Vec::new()));
        let first = query::facing_tile(&world);
        let second = query::facing_tile(&world);
        assert_eq!(first, TileCoord::new(2, 3));
        assert_eq!(first, second);
        assert_eq!(query::player(&world).tile, TileCoord::new(2, 2));
    }

    #[test]
    fn loading_a_scene_cancels_glide() {
        let mut world = World::with_layout(layout(Vec::new()));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StepPlayer {
                direction: Direction::Up,
            },
            &mut events,
        );

        apply(
            &mut world,
            Command::LoadScene {
                layout: layout(Vec::new()),
            },
            &mut events,
        );

        let player = query::player(&world);
        assert!(!player.is_moving);
        assert_eq!(player.tile, TileCoord::new(2, 2));
    }
}
