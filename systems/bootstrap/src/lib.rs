#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares the Silverton experience.
//!
//! Scenes are authored as TOML documents: a glyph map describing the terrain,
//! the player spawn, NPC and object tables and the dialog text store. Parsing
//! validates the document and produces the [`SceneLayout`], [`DialogTable`]
//! and [`DialogSettings`] consumed by the world and the dialog system.

use std::{collections::BTreeMap, time::Duration};

use serde::Deserialize;
use silverton_core::{
    DialogContent, DialogId, DialogLookup, DialogTable, Direction, Occupant, SceneLayout,
    TileCoord, TileGrid,
};
use silverton_system_dialog::{DialogSettings, Pagination, DEFAULT_LINES_PER_PAGE};
use silverton_world::{query, World};
use thiserror::Error;
use tracing::debug;

/// Built-in Silvertown scene shipped with the engine.
pub const DEFAULT_SCENE: &str = include_str!("../scenes/silvertown.toml");

const DEFAULT_TILE_LENGTH: f32 = 32.0;
const DEFAULT_GLIDE_MS: u64 = 160;
const DEFAULT_CHARACTER_INTERVAL_MS: u64 = 25;
const DEFAULT_NPC_TINT: u32 = 0xf5f5f5;
const DEFAULT_OBJECT_TINT: u32 = 0x8d6e63;

/// Produces data required to greet the player.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Derives the banner that should be shown when the experience starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }
}

/// Terrain painted on a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Terrain {
    /// Plain grass.
    Grass,
    /// Shaded grass.
    DarkGrass,
    /// Dirt path.
    Path,
    /// Tall field grass.
    Field,
    /// Flower patch.
    Flowers,
    /// Sand.
    Sand,
    /// Tree canopy or trunk.
    Tree,
    /// Water.
    Water,
    /// House roof.
    Roof,
    /// House wall.
    Wall,
    /// House window.
    Window,
    /// House door.
    Door,
    /// Horizontal fence segment.
    FenceHorizontal,
    /// Vertical fence segment.
    FenceVertical,
}

impl Terrain {
    /// Every terrain kind in legend order.
    pub const ALL: [Terrain; 14] = [
        Self::Grass,
        Self::DarkGrass,
        Self::Path,
        Self::Field,
        Self::Flowers,
        Self::Sand,
        Self::Tree,
        Self::Water,
        Self::Roof,
        Self::Wall,
        Self::Window,
        Self::Door,
        Self::FenceHorizontal,
        Self::FenceVertical,
    ];

    /// Resolves a map glyph into its terrain.
    #[must_use]
    pub const fn from_glyph(glyph: char) -> Option<Self> {
        let terrain = match glyph {
            '.' => Self::Grass,
            ',' => Self::DarkGrass,
            '=' => Self::Path,
            '"' => Self::Field,
            '*' => Self::Flowers,
            ':' => Self::Sand,
            'T' => Self::Tree,
            '~' => Self::Water,
            '^' => Self::Roof,
            '#' => Self::Wall,
            'o' => Self::Window,
            'D' => Self::Door,
            '-' => Self::FenceHorizontal,
            '|' => Self::FenceVertical,
            _ => return None,
        };
        Some(terrain)
    }

    /// Glyph used for the terrain in scene maps.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Grass => '.',
            Self::DarkGrass => ',',
            Self::Path => '=',
            Self::Field => '"',
            Self::Flowers => '*',
            Self::Sand => ':',
            Self::Tree => 'T',
            Self::Water => '~',
            Self::Roof => '^',
            Self::Wall => '#',
            Self::Window => 'o',
            Self::Door => 'D',
            Self::FenceHorizontal => '-',
            Self::FenceVertical => '|',
        }
    }

    /// Reports whether the terrain prevents the player from entering.
    #[must_use]
    pub const fn is_blocked(self) -> bool {
        matches!(
            self,
            Self::Tree
                | Self::Water
                | Self::Roof
                | Self::Wall
                | Self::Window
                | Self::Door
                | Self::FenceHorizontal
                | Self::FenceVertical
        )
    }
}

/// Row-major terrain matrix of a parsed scene.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainMap {
    columns: u32,
    rows: u32,
    tiles: Vec<Terrain>,
}

impl TerrainMap {
    /// Number of columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Terrain at `tile`, if the tile lies inside the map.
    #[must_use]
    pub fn get(&self, tile: TileCoord) -> Option<Terrain> {
        let column = u32::try_from(tile.column()).ok()?;
        let row = u32::try_from(tile.row()).ok()?;
        if column >= self.columns || row >= self.rows {
            return None;
        }
        let index = usize::try_from(row * self.columns + column).ok()?;
        self.tiles.get(index).copied()
    }

    /// Iterates over every tile in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (TileCoord, Terrain)> + '_ {
        let columns = self.columns.max(1);
        self.tiles.iter().enumerate().map(move |(index, terrain)| {
            let index = u32::try_from(index).unwrap_or(u32::MAX);
            let tile = TileCoord::new((index % columns) as i32, (index / columns) as i32);
            (tile, *terrain)
        })
    }
}

/// Errors raised while parsing or validating a scene document.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The document is not valid TOML or does not match the scene schema.
    #[error("failed to parse scene: {0}")]
    Parse(#[from] toml::de::Error),
    /// The map contains no tiles.
    #[error("scene map is empty")]
    EmptyMap,
    /// A map row differs in length from the first row.
    #[error("map row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// A map glyph is not part of the legend.
    #[error("unknown map glyph {glyph:?} at column {column}, row {row}")]
    UnknownGlyph {
        /// Offending glyph.
        glyph: char,
        /// Column of the glyph.
        column: usize,
        /// Row of the glyph.
        row: usize,
    },
    /// The tile length is not a positive finite number.
    #[error("tile length must be positive, got {0}")]
    InvalidTileLength(f32),
    /// The player spawn lies outside the map.
    #[error("player spawn {tile:?} lies outside the map")]
    SpawnOutOfBounds {
        /// Requested spawn tile.
        tile: TileCoord,
    },
    /// The player spawn lies on blocked terrain or on an occupant.
    #[error("player spawn {tile:?} is blocked")]
    SpawnBlocked {
        /// Requested spawn tile.
        tile: TileCoord,
    },
    /// An NPC or object lies outside the map.
    #[error("occupant `{dialog_id}` at {tile:?} lies outside the map")]
    OccupantOutOfBounds {
        /// Script bound to the occupant.
        dialog_id: DialogId,
        /// Requested occupant tile.
        tile: TileCoord,
    },
    /// A zone label is anchored outside the map.
    #[error("label `{text}` is anchored outside the map")]
    LabelOutOfBounds {
        /// Text of the offending label.
        text: String,
    },
}

/// Raw scene document as authored in TOML.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDefinition {
    /// Human-readable scene title.
    pub title: String,
    /// Side length of a tile in world units.
    #[serde(default = "default_tile_length")]
    pub tile_length: f32,
    /// Forces the outermost ring of tiles to be blocked.
    #[serde(default = "default_seal_border")]
    pub seal_border: bool,
    /// Glyph rows describing the terrain.
    pub map: Vec<String>,
    /// Player spawn.
    pub player: PlayerDefinition,
    /// Movement tunables.
    #[serde(default)]
    pub movement: MovementDefinition,
    /// Dialog playback tunables.
    #[serde(default)]
    pub dialog: DialogDefinition,
    /// NPC table.
    #[serde(default)]
    pub npcs: Vec<NpcDefinition>,
    /// Interactive object table.
    #[serde(default)]
    pub objects: Vec<ObjectDefinition>,
    /// Zone labels painted over the map.
    #[serde(default)]
    pub labels: Vec<ZoneLabel>,
    /// Dialog text store.
    #[serde(default)]
    pub dialogs: BTreeMap<DialogId, DialogContent>,
}

/// Player spawn declaration.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayerDefinition {
    /// Spawn column.
    pub column: i32,
    /// Spawn row.
    pub row: i32,
    /// Initial facing.
    #[serde(default)]
    pub facing: Direction,
}

/// Movement tunables.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MovementDefinition {
    /// Glide duration between tiles in milliseconds.
    #[serde(default = "default_glide_ms")]
    pub glide_ms: u64,
}

impl Default for MovementDefinition {
    fn default() -> Self {
        Self {
            glide_ms: DEFAULT_GLIDE_MS,
        }
    }
}

/// Dialog playback tunables.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DialogDefinition {
    /// Time between revealed characters in milliseconds.
    #[serde(default = "default_character_interval_ms")]
    pub character_interval_ms: u64,
    /// Lines grouped per page, zero for one unit per script entry.
    #[serde(default = "default_lines_per_page")]
    pub lines_per_page: usize,
    /// Starts every unit fully revealed.
    #[serde(default)]
    pub instant_reveal: bool,
}

impl Default for DialogDefinition {
    fn default() -> Self {
        Self {
            character_interval_ms: DEFAULT_CHARACTER_INTERVAL_MS,
            lines_per_page: DEFAULT_LINES_PER_PAGE,
            instant_reveal: false,
        }
    }
}

/// NPC declaration.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NpcDefinition {
    /// Column of the NPC.
    pub column: i32,
    /// Row of the NPC.
    pub row: i32,
    /// Script presented on interaction.
    pub dialog: DialogId,
    /// Speaker name shown in the dialog box.
    #[serde(default)]
    pub name: Option<String>,
    /// Initial facing.
    #[serde(default)]
    pub facing: Direction,
    /// Body colour as `0xRRGGBB`.
    #[serde(default)]
    pub color: Option<u32>,
}

/// Interactive object declaration.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectDefinition {
    /// Column of the object.
    pub column: i32,
    /// Row of the object.
    pub row: i32,
    /// Script presented on interaction.
    pub dialog: DialogId,
    /// Body colour as `0xRRGGBB`.
    #[serde(default)]
    pub color: Option<u32>,
}

/// Text painted over an area of the map.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneLabel {
    /// Text to paint.
    pub text: String,
    /// Horizontal centre of the label in tiles.
    pub column: f32,
    /// Vertical centre of the label in tiles.
    pub row: f32,
    /// Paints the label larger and more opaque.
    #[serde(default)]
    pub prominent: bool,
}

fn default_tile_length() -> f32 {
    DEFAULT_TILE_LENGTH
}

fn default_seal_border() -> bool {
    true
}

fn default_glide_ms() -> u64 {
    DEFAULT_GLIDE_MS
}

fn default_character_interval_ms() -> u64 {
    DEFAULT_CHARACTER_INTERVAL_MS
}

fn default_lines_per_page() -> usize {
    DEFAULT_LINES_PER_PAGE
}

/// Validated scene ready to be loaded into the world.
#[derive(Clone, Debug)]
pub struct Scene {
    title: String,
    terrain: TerrainMap,
    layout: SceneLayout,
    tints: Vec<u32>,
    labels: Vec<ZoneLabel>,
    dialogs: DialogTable,
    dialog_settings: DialogSettings,
}

impl Scene {
    /// Human-readable scene title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Terrain painted on every tile.
    #[must_use]
    pub fn terrain(&self) -> &TerrainMap {
        &self.terrain
    }

    /// Layout to submit to the world through `Command::LoadScene`.
    #[must_use]
    pub fn layout(&self) -> SceneLayout {
        self.layout.clone()
    }

    /// Body colours of the occupants as `0xRRGGBB`, in load order.
    #[must_use]
    pub fn occupant_tints(&self) -> &[u32] {
        &self.tints
    }

    /// Zone labels painted over the map.
    #[must_use]
    pub fn labels(&self) -> &[ZoneLabel] {
        &self.labels
    }

    /// Dialog text store declared by the scene.
    #[must_use]
    pub fn dialog_table(&self) -> DialogTable {
        self.dialogs.clone()
    }

    /// Dialog playback settings declared by the scene.
    #[must_use]
    pub fn dialog_settings(&self) -> DialogSettings {
        self.dialog_settings
    }
}

/// Parses and validates the built-in Silvertown scene.
pub fn default_scene() -> Result<Scene, BootstrapError> {
    parse_scene(DEFAULT_SCENE)
}

/// Parses and validates a TOML scene document.
pub fn parse_scene(source: &str) -> Result<Scene, BootstrapError> {
    let definition: SceneDefinition = toml::from_str(source)?;
    build_scene(definition)
}

/// Validates an already deserialized scene document.
pub fn build_scene(definition: SceneDefinition) -> Result<Scene, BootstrapError> {
    if !definition.tile_length.is_finite() || definition.tile_length <= 0.0 {
        return Err(BootstrapError::InvalidTileLength(definition.tile_length));
    }

    let terrain = parse_terrain(&definition.map)?;
    let grid = collision_grid(&terrain, definition.tile_length, definition.seal_border);

    let capacity = definition.npcs.len() + definition.objects.len();
    let mut occupants = Vec::with_capacity(capacity);
    let mut tints = Vec::with_capacity(capacity);
    for npc in definition.npcs {
        let tile = TileCoord::new(npc.column, npc.row);
        ensure_inside(&grid, tile, &npc.dialog)?;
        tints.push(npc.color.unwrap_or(DEFAULT_NPC_TINT));
        occupants.push(Occupant::npc(tile, npc.dialog, npc.name, npc.facing));
    }
    for object in definition.objects {
        let tile = TileCoord::new(object.column, object.row);
        ensure_inside(&grid, tile, &object.dialog)?;
        tints.push(object.color.unwrap_or(DEFAULT_OBJECT_TINT));
        occupants.push(Occupant::object(tile, object.dialog));
    }

    let spawn = TileCoord::new(definition.player.column, definition.player.row);
    if !grid.contains(spawn) {
        return Err(BootstrapError::SpawnOutOfBounds { tile: spawn });
    }
    if grid.is_blocked(spawn) || occupants.iter().any(|occupant| occupant.tile() == spawn) {
        return Err(BootstrapError::SpawnBlocked { tile: spawn });
    }

    for label in &definition.labels {
        let inside = (0.0..=terrain.columns() as f32).contains(&label.column)
            && (0.0..=terrain.rows() as f32).contains(&label.row);
        if !inside {
            return Err(BootstrapError::LabelOutOfBounds {
                text: label.text.clone(),
            });
        }
    }

    let dialogs: DialogTable = definition.dialogs.into_iter().collect();
    for occupant in &occupants {
        if dialogs.lookup(occupant.dialog_id()).is_none() {
            debug!(dialog = %occupant.dialog_id(), tile = ?occupant.tile(), "occupant_without_script");
        }
    }

    let dialog_settings = DialogSettings {
        character_interval: Duration::from_millis(definition.dialog.character_interval_ms),
        pagination: Pagination::from_lines_per_page(definition.dialog.lines_per_page),
        instant_reveal: definition.dialog.instant_reveal,
    };

    debug!(
        title = %definition.title,
        columns = terrain.columns(),
        rows = terrain.rows(),
        occupants = occupants.len(),
        labels = definition.labels.len(),
        dialogs = dialogs.len(),
        "scene_parsed"
    );

    Ok(Scene {
        title: definition.title,
        terrain,
        layout: SceneLayout {
            grid,
            spawn,
            facing: definition.player.facing,
            occupants,
            glide_duration: Duration::from_millis(definition.movement.glide_ms),
        },
        tints,
        labels: definition.labels,
        dialogs,
        dialog_settings,
    })
}

fn parse_terrain(map: &[String]) -> Result<TerrainMap, BootstrapError> {
    let expected = map.first().map_or(0, |row| row.chars().count());
    if expected == 0 {
        return Err(BootstrapError::EmptyMap);
    }

    let mut tiles = Vec::with_capacity(expected * map.len());
    for (row, line) in map.iter().enumerate() {
        let found = line.chars().count();
        if found != expected {
            return Err(BootstrapError::RaggedRow {
                row,
                expected,
                found,
            });
        }
        for (column, glyph) in line.chars().enumerate() {
            let terrain = Terrain::from_glyph(glyph).ok_or(BootstrapError::UnknownGlyph {
                glyph,
                column,
                row,
            })?;
            tiles.push(terrain);
        }
    }

    Ok(TerrainMap {
        columns: u32::try_from(expected).map_err(|_| BootstrapError::EmptyMap)?,
        rows: u32::try_from(map.len()).map_err(|_| BootstrapError::EmptyMap)?,
        tiles,
    })
}

fn collision_grid(terrain: &TerrainMap, tile_length: f32, seal_border: bool) -> TileGrid {
    let mut grid = TileGrid::open(terrain.columns(), terrain.rows(), tile_length);
    let last_column = terrain.columns() as i32 - 1;
    let last_row = terrain.rows() as i32 - 1;
    for (tile, kind) in terrain.iter() {
        let on_border = tile.column() == 0
            || tile.row() == 0
            || tile.column() == last_column
            || tile.row() == last_row;
        if kind.is_blocked() || (seal_border && on_border) {
            grid = grid.with_blocked(tile);
        }
    }
    grid
}

fn ensure_inside(
    grid: &TileGrid,
    tile: TileCoord,
    dialog_id: &DialogId,
) -> Result<(), BootstrapError> {
    if grid.contains(tile) {
        Ok(())
    } else {
        Err(BootstrapError::OccupantOutOfBounds {
            dialog_id: dialog_id.clone(),
            tile,
        })
    }
}
