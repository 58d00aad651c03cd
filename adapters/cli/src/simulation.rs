//! Frame-by-frame composition of the world, the dialog machine and the controls.

use std::time::Duration;

use anyhow::{Context, Result};
use glam::Vec2;
use silverton_core::{Command, DialogTable, Event, OccupantId, PixelPosition};
use silverton_rendering::{
    ActorPresentation, Color, DialogBoxPresentation, FrameDirective, FrameInput,
    LabelPresentation, Scene, TileGridPresentation,
};
use silverton_system_bootstrap::{self as bootstrap, Bootstrap, Terrain};
use silverton_system_controls::{ControlInput, ControlOutput, Controls};
use silverton_system_dialog::Dialog;
use silverton_world::{self as world, query, World};
use tracing::{debug, info};

const PLAYER_TINT: u32 = 0x4fc3f7;

/// Owns every piece of simulation state and advances it once per frame.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    dialog: Dialog,
    controls: Controls,
    dialogs: DialogTable,
    tints: Vec<u32>,
    tile_grid: TileGridPresentation,
    labels: Vec<LabelPresentation>,
    previous_events: Vec<Event>,
    frame_events: Vec<Event>,
    dialog_events: Vec<Event>,
    control_output: ControlOutput,
}

impl Simulation {
    /// Loads the scene into a fresh world and prepares the presentation grid.
    pub(crate) fn new(scene: &bootstrap::Scene) -> Result<Self> {
        let terrain = scene.terrain();
        let fills = terrain
            .iter()
            .map(|(_, kind)| terrain_color(kind))
            .collect();
        let layout = scene.layout();
        let tile_grid = TileGridPresentation::new(
            terrain.columns(),
            terrain.rows(),
            layout.grid.tile_length(),
            fills,
        )
        .context("failed to describe the scene tile grid")?;
        let tile_length = layout.grid.tile_length();
        let labels = scene
            .labels()
            .iter()
            .map(|label| LabelPresentation {
                text: label.text.clone(),
                center: Vec2::new(label.column, label.row) * tile_length,
                prominent: label.prominent,
            })
            .collect();

        let mut world = World::new();
        let mut previous_events = Vec::new();
        world::apply(&mut world, Command::LoadScene { layout }, &mut previous_events);

        Ok(Self {
            world,
            dialog: Dialog::new(scene.dialog_settings()),
            controls: Controls::new(),
            dialogs: scene.dialog_table(),
            tints: scene.occupant_tints().to_vec(),
            tile_grid,
            labels,
            previous_events,
            frame_events: Vec::new(),
            dialog_events: Vec::new(),
            control_output: ControlOutput::default(),
        })
    }

    /// Banner greeting the player when the window opens.
    pub(crate) fn welcome_banner(&self) -> &str {
        Bootstrap.welcome_banner(&self.world)
    }

    /// Advances the simulation by one frame.
    pub(crate) fn advance(&mut self, dt: Duration, input: FrameInput) -> FrameDirective {
        self.control_output.clear();
        self.controls.handle(
            &self.previous_events,
            ControlInput::new(input.direction, input.interact, input.cancel),
            &mut self.control_output,
        );

        if self.control_output.exit_requested {
            info!("exit_requested");
            return FrameDirective::Exit;
        }

        self.frame_events.clear();
        for command in self.control_output.world.drain(..) {
            world::apply(&mut self.world, command, &mut self.frame_events);
        }
        for command in self.control_output.dialog.drain(..) {
            self.dialog.apply(command, &self.dialogs, &mut self.frame_events);
        }
        world::apply(&mut self.world, Command::Tick { dt }, &mut self.frame_events);

        self.dialog_events.clear();
        self.dialog
            .handle(&self.frame_events, &self.dialogs, &mut self.dialog_events);
        self.frame_events.append(&mut self.dialog_events);

        for event in &self.frame_events {
            match event {
                Event::Interaction { dialog_id, speaker } => {
                    info!(dialog = %dialog_id, speaker = ?speaker, "interaction");
                }
                Event::DialogClosed => debug!("dialog_closed"),
                _ => {}
            }
        }

        std::mem::swap(&mut self.previous_events, &mut self.frame_events);
        FrameDirective::Continue
    }

    /// Builds the presentation scene for the current state.
    pub(crate) fn scene(&self) -> Scene {
        let mut scene = Scene::new(self.tile_grid.clone(), self.player_actor());
        scene.labels = self.labels.clone();
        self.populate_scene(&mut scene);
        scene
    }

    /// Refreshes the dynamic parts of `scene` from the current state.
    pub(crate) fn populate_scene(&self, scene: &mut Scene) {
        scene.player = self.player_actor();

        scene.occupants.clear();
        let grid = query::tile_grid(&self.world);
        for snapshot in query::occupants(&self.world) {
            let center = to_vec2(grid.pixel_center(snapshot.occupant.tile()));
            let tint = self.tint(snapshot.id);
            scene.occupants.push(ActorPresentation::new(
                center,
                Color::from_hex(tint),
                snapshot.occupant.facing(),
            ));
        }

        scene.dialog = self.dialog.is_visible().then(|| DialogBoxPresentation {
            speaker: self.dialog.speaker().map(str::to_owned),
            text: self.dialog.revealed_text().to_owned(),
            show_continue: self.dialog.is_current_page_complete(),
        });
    }

    fn player_actor(&self) -> ActorPresentation {
        let player = query::player(&self.world);
        ActorPresentation::new(
            to_vec2(player.pixel_center),
            Color::from_hex(PLAYER_TINT),
            Some(player.facing),
        )
    }

    fn tint(&self, id: OccupantId) -> u32 {
        usize::try_from(id.get())
            .ok()
            .and_then(|index| self.tints.get(index).copied())
            .unwrap_or(0xffffff)
    }
}

fn to_vec2(position: PixelPosition) -> Vec2 {
    Vec2::new(position.x(), position.y())
}

fn terrain_color(terrain: Terrain) -> Color {
    let rgb = match terrain {
        Terrain::Grass => 0x5fa84f,
        Terrain::DarkGrass => 0x4a8f3c,
        Terrain::Path => 0xd8c08a,
        Terrain::Field => 0x7cc25e,
        Terrain::Flowers => 0xe27ab0,
        Terrain::Sand => 0xe8d8a0,
        Terrain::Tree => 0x2f6b2a,
        Terrain::Water => 0x3a7bd5,
        Terrain::Roof => 0xb04a3a,
        Terrain::Wall => 0xd9cbb0,
        Terrain::Window => 0x86c5e8,
        Terrain::Door => 0x7a4a2a,
        Terrain::FenceHorizontal | Terrain::FenceVertical => 0x9c7a4c,
    };
    Color::from_hex(rgb)
}
