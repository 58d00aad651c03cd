#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Silverton engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then reports [`Event`] values into a caller-owned
//! buffer. Systems consume event streams, query immutable snapshots, and
//! respond exclusively with new command batches.

use std::{collections::BTreeMap, fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Silvertown!";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the grid, occupants and player spawn with the provided layout.
    LoadScene {
        /// Layout describing the scene that should become active.
        layout: SceneLayout,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the player step one tile in the specified direction.
    StepPlayer {
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Requests that the player interact with whatever occupies the faced tile.
    Interact,
}

/// Commands that drive the dialog playback machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogCommand {
    /// Opens the script registered under `dialog_id`.
    Show {
        /// Identifier of the script to present.
        dialog_id: DialogId,
        /// Name displayed next to the dialog box, if any.
        speaker: Option<String>,
    },
    /// Skips the typewriter or moves on to the next display unit.
    Advance,
    /// Dismisses the dialog without signalling natural completion.
    Close,
}

/// Events reported by the world and systems after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a new scene layout became active.
    SceneLoaded {
        /// Number of tile columns in the loaded grid.
        columns: u32,
        /// Number of tile rows in the loaded grid.
        rows: u32,
        /// Tile the player occupies after the load.
        spawn: TileCoord,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the player committed to a step and started gliding.
    PlayerMoved {
        /// Tile the player occupied before the step.
        from: TileCoord,
        /// Tile the player occupies after the step.
        to: TileCoord,
        /// Facing adopted for the step.
        facing: Direction,
    },
    /// Reports that the glide finished and the player accepts new steps.
    PlayerArrived {
        /// Tile the player settled on.
        tile: TileCoord,
    },
    /// Reports that an NPC turned to face the player.
    OccupantTurned {
        /// Identifier of the NPC that turned.
        occupant: OccupantId,
        /// Facing adopted by the NPC.
        facing: Direction,
    },
    /// Reports that the player interacted with an occupant.
    Interaction {
        /// Script associated with the occupant.
        dialog_id: DialogId,
        /// Display name of the NPC, absent for objects.
        speaker: Option<String>,
    },
    /// Announces that the dialog box became visible or hidden.
    DialogVisibilityChanged {
        /// Whether the dialog box is visible.
        visible: bool,
    },
    /// Announces the speaker attached to the dialog box.
    DialogSpeakerChanged {
        /// Name to display, if any.
        speaker: Option<String>,
    },
    /// Carries the currently revealed prefix of the active display unit.
    DialogTextRevealed {
        /// Revealed text.
        text: String,
    },
    /// Reports that the final display unit was acknowledged by the player.
    DialogClosed,
}

/// Cardinal directions used for steps and facings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Toward decreasing row indices.
    Up,
    /// Toward increasing row indices.
    #[default]
    Down,
    /// Toward decreasing column indices.
    Left,
    /// Toward increasing column indices.
    Right,
}

impl Direction {
    /// All directions in input priority order.
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Column and row offsets for a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Converts raw step offsets into a direction.
    ///
    /// Only the sign of each offset matters. Horizontal input is honoured when
    /// the vertical offset is zero. Returns `None` for zero or diagonal input.
    #[must_use]
    pub const fn from_delta(dx: i32, dy: i32) -> Option<Self> {
        match (dx.signum(), dy.signum()) {
            (1, 0) => Some(Self::Right),
            (-1, 0) => Some(Self::Left),
            (0, 1) => Some(Self::Down),
            (0, -1) => Some(Self::Up),
            _ => None,
        }
    }

    /// Direction an observer standing on `from` must face to look at `to`.
    ///
    /// Vertical offsets are checked before horizontal ones. Returns `None`
    /// when both tiles coincide.
    #[must_use]
    pub fn toward(from: TileCoord, to: TileCoord) -> Option<Self> {
        if to.row() < from.row() {
            Some(Self::Up)
        } else if to.row() > from.row() {
            Some(Self::Down)
        } else if to.column() < from.column() {
            Some(Self::Left)
        } else if to.column() > from.column() {
            Some(Self::Right)
        } else {
            None
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        };
        f.write_str(label)
    }
}

/// Location of a single tile expressed as column and row coordinates.
///
/// Coordinates are signed so that neighbours of edge tiles remain
/// representable; the grid treats anything outside its bounds as blocked.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TileCoord {
    column: i32,
    row: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Neighbouring tile one step away in the provided direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            column: self.column.saturating_add(dx),
            row: self.row.saturating_add(dy),
        }
    }
}

/// Point expressed in world units (pixels at a scale of one).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PixelPosition {
    x: f32,
    y: f32,
}

impl PixelPosition {
    /// Creates a new pixel position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal component.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical component.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Linearly interpolates toward `target`; `t` is clamped to `0.0..=1.0`.
    #[must_use]
    pub fn lerp(self, target: PixelPosition, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
        }
    }
}

/// Static collision matrix describing which tiles can be entered.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tile_length: f32,
    blocked: Vec<bool>,
}

impl TileGrid {
    /// Creates a grid whose tiles are all walkable.
    #[must_use]
    pub fn open(columns: u32, rows: u32, tile_length: f32) -> Self {
        let capacity = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        Self {
            columns,
            rows,
            tile_length,
            blocked: vec![false; capacity],
        }
    }

    /// Returns a copy of the grid with the provided tile marked as blocked.
    ///
    /// Out-of-range tiles are ignored.
    #[must_use]
    pub fn with_blocked(mut self, tile: TileCoord) -> Self {
        if let Some(index) = self.index(tile) {
            self.blocked[index] = true;
        }
        self
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a single square tile expressed in world units.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// Reports whether the tile lies inside the grid.
    #[must_use]
    pub fn contains(&self, tile: TileCoord) -> bool {
        self.index(tile).is_some()
    }

    /// Reports whether the tile cannot be entered. Out-of-range tiles are blocked.
    #[must_use]
    pub fn is_blocked(&self, tile: TileCoord) -> bool {
        self.index(tile)
            .and_then(|index| self.blocked.get(index).copied())
            .unwrap_or(true)
    }

    /// Pixel centre of the provided tile.
    #[must_use]
    pub fn pixel_center(&self, tile: TileCoord) -> PixelPosition {
        let half = self.tile_length / 2.0;
        PixelPosition::new(
            tile.column() as f32 * self.tile_length + half,
            tile.row() as f32 * self.tile_length + half,
        )
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        let column = u32::try_from(tile.column()).ok()?;
        let row = u32::try_from(tile.row()).ok()?;
        if column < self.columns && row < self.rows {
            let width = usize::try_from(self.columns).ok()?;
            let row = usize::try_from(row).ok()?;
            let column = usize::try_from(column).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Unique identifier assigned to an occupant by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccupantId(u32);

impl OccupantId {
    /// Creates a new occupant identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum OccupantKind {
    /// Character that can be talked to and turns toward the player.
    Npc {
        /// Name shown as the dialog speaker.
        name: Option<String>,
        /// Direction the NPC currently faces.
        facing: Direction,
    },
    /// Static object that can be inspected.
    Object,
}

/// NPC or interactive object bound to a fixed tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Occupant {
    tile: TileCoord,
    dialog_id: DialogId,
    kind: OccupantKind,
}

impl Occupant {
    /// Creates an NPC occupant.
    #[must_use]
    pub fn npc(
        tile: TileCoord,
        dialog_id: DialogId,
        name: Option<String>,
        facing: Direction,
    ) -> Self {
        Self {
            tile,
            dialog_id,
            kind: OccupantKind::Npc { name, facing },
        }
    }

    /// Creates an object occupant.
    #[must_use]
    pub fn object(tile: TileCoord, dialog_id: DialogId) -> Self {
        Self {
            tile,
            dialog_id,
            kind: OccupantKind::Object,
        }
    }

    /// Tile occupied by the occupant.
    #[must_use]
    pub const fn tile(&self) -> TileCoord {
        self.tile
    }

    /// Script presented when the occupant is interacted with.
    #[must_use]
    pub fn dialog_id(&self) -> &DialogId {
        &self.dialog_id
    }

    /// Reports whether the occupant is an NPC.
    #[must_use]
    pub fn is_npc(&self) -> bool {
        matches!(self.kind, OccupantKind::Npc { .. })
    }

    /// Speaker name, present only for named NPCs.
    #[must_use]
    pub fn speaker(&self) -> Option<&str> {
        match &self.kind {
            OccupantKind::Npc { name, .. } => name.as_deref(),
            OccupantKind::Object => None,
        }
    }

    /// Current facing, present only for NPCs.
    #[must_use]
    pub fn facing(&self) -> Option<Direction> {
        match &self.kind {
            OccupantKind::Npc { facing, .. } => Some(*facing),
            OccupantKind::Object => None,
        }
    }

    /// Turns an NPC toward the provided direction. Objects ignore the request.
    pub fn turn(&mut self, direction: Direction) {
        if let OccupantKind::Npc { facing, .. } = &mut self.kind {
            *facing = direction;
        }
    }
}

/// Complete description of a playable scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneLayout {
    /// Collision matrix of the scene.
    pub grid: TileGrid,
    /// Tile the player starts on.
    pub spawn: TileCoord,
    /// Facing the player starts with.
    pub facing: Direction,
    /// NPCs and objects placed in the scene, in load order.
    pub occupants: Vec<Occupant>,
    /// Duration of the visual glide between two tiles.
    pub glide_duration: Duration,
}

/// Identifier of a dialog script.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialogId(String);

impl DialogId {
    /// Creates a new dialog identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DialogId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Text registered for a dialog identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DialogContent {
    /// A single text entry.
    Text(String),
    /// Ordered text entries.
    Entries(Vec<String>),
}

impl DialogContent {
    /// Entries in authored order.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        match self {
            Self::Text(text) => std::slice::from_ref(text),
            Self::Entries(entries) => entries,
        }
    }
}

/// Source of dialog scripts keyed by identifier.
pub trait DialogLookup {
    /// Returns the script registered under `dialog_id`, if any.
    fn lookup(&self, dialog_id: &DialogId) -> Option<&DialogContent>;
}

/// In-memory dialog text store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DialogTable {
    scripts: BTreeMap<DialogId, DialogContent>,
}

impl DialogTable {
    /// Number of registered scripts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    /// Reports whether no script is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

impl DialogLookup for DialogTable {
    fn lookup(&self, dialog_id: &DialogId) -> Option<&DialogContent> {
        self.scripts.get(dialog_id)
    }
}

impl FromIterator<(DialogId, DialogContent)> for DialogTable {
    fn from_iter<I: IntoIterator<Item = (DialogId, DialogContent)>>(iter: I) -> Self {
        Self {
            scripts: iter.into_iter().collect(),
        }
    }
}
