#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Silverton adapters.

use anyhow::Result as AnyResult;
use glam::Vec2;
use silverton_core::Direction;
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Creates an opaque color from a packed `0xRRGGBB` value.
    #[must_use]
    pub const fn from_hex(rgb: u32) -> Self {
        Self::from_rgb_u8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Returns a new color darkened towards black by the provided amount.
    #[must_use]
    pub fn darken(self, amount: f32) -> Self {
        let keep = 1.0 - amount.clamp(0.0, 1.0);

        Self {
            red: self.red * keep,
            green: self.green * keep,
            blue: self.blue * keep,
            alpha: self.alpha,
        }
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Direction held by the player on this frame, already resolved to one axis.
    pub direction: Option<Direction>,
    /// Whether the interact/advance action was pressed on this frame.
    pub interact: bool,
    /// Whether the cancel/back action was pressed on this frame.
    pub cancel: bool,
}

/// Describes the painted tile grid that composes the play area.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGridPresentation {
    /// Number of columns contained in the grid.
    pub columns: u32,
    /// Number of rows contained in the grid.
    pub rows: u32,
    /// Side length of a single tile expressed in world units.
    pub tile_length: f32,
    fills: Vec<Color>,
}

impl TileGridPresentation {
    /// Creates a new tile grid descriptor from row-major fill colours.
    ///
    /// Returns an error when the tile length is not positive or when the
    /// number of fills does not match the grid dimensions.
    pub fn new(
        columns: u32,
        rows: u32,
        tile_length: f32,
        fills: Vec<Color>,
    ) -> std::result::Result<Self, RenderingError> {
        if !(tile_length.is_finite() && tile_length > 0.0) {
            return Err(RenderingError::InvalidTileLength { tile_length });
        }

        let expected = columns as usize * rows as usize;
        if fills.len() != expected {
            return Err(RenderingError::FillCountMismatch {
                expected,
                actual: fills.len(),
            });
        }

        Ok(Self {
            columns,
            rows,
            tile_length,
            fills,
        })
    }

    /// Calculates the total width of the grid.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Calculates the total height of the grid.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }

    /// Iterates over every tile as `(column, row, fill)` in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = (u32, u32, Color)> + '_ {
        let columns = self.columns.max(1) as usize;
        self.fills.iter().enumerate().map(move |(index, fill)| {
            ((index % columns) as u32, (index / columns) as u32, *fill)
        })
    }

    /// World-space position of the top-left corner of a tile.
    #[must_use]
    pub fn tile_origin(&self, column: u32, row: u32) -> Vec2 {
        Vec2::new(column as f32, row as f32) * self.tile_length
    }
}

/// Something standing on the grid: the player, an NPC or an object.
#[derive(Clone, Debug, PartialEq)]
pub struct ActorPresentation {
    /// Centre of the actor in world units.
    pub center: Vec2,
    /// Body colour of the actor.
    pub color: Color,
    /// Facing marker, absent for static objects.
    pub facing: Option<Direction>,
}

impl ActorPresentation {
    /// Creates a new actor descriptor.
    #[must_use]
    pub const fn new(center: Vec2, color: Color, facing: Option<Direction>) -> Self {
        Self {
            center,
            color,
            facing,
        }
    }
}

/// Dialog box overlay drawn over the bottom of the window.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct DialogBoxPresentation {
    /// Name displayed above the text, if any.
    pub speaker: Option<String>,
    /// Text revealed so far.
    pub text: String,
    /// Whether the continue affordance should be drawn.
    pub show_continue: bool,
}

/// Text painted over an area of the map.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelPresentation {
    /// Text to paint.
    pub text: String,
    /// Centre of the text in world units.
    pub center: Vec2,
    /// Whether the label is painted larger and more opaque.
    pub prominent: bool,
}

/// Scene description combining the tile grid, its inhabitants and overlays.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Tile grid that composes the play area.
    pub tile_grid: TileGridPresentation,
    /// NPCs and objects standing on the grid.
    pub occupants: Vec<ActorPresentation>,
    /// The player character.
    pub player: ActorPresentation,
    /// Zone labels painted above the tiles and below the actors.
    pub labels: Vec<LabelPresentation>,
    /// Dialog box, present while a dialog is visible.
    pub dialog: Option<DialogBoxPresentation>,
}

impl Scene {
    /// Creates a scene without occupants, labels or overlays.
    #[must_use]
    pub fn new(tile_grid: TileGridPresentation, player: ActorPresentation) -> Self {
        Self {
            tile_grid,
            occupants: Vec::new(),
            player,
            labels: Vec::new(),
            dialog: None,
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Instruction returned by the scene update closure after every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FrameDirective {
    /// Keep presenting frames.
    #[default]
    Continue,
    /// Close the window and return from [`RenderingBackend::run`].
    Exit,
}

/// Rendering backend capable of presenting Silverton scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the simulated frame delta,
    /// per-frame input captured by the adapter, and may mutate the scene before
    /// it is rendered. Returning [`FrameDirective::Exit`] ends the loop.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameDirective + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Tiles must have a positive, finite side length.
    InvalidTileLength {
        /// Provided length that failed validation.
        tile_length: f32,
    },
    /// One fill colour is required per tile.
    FillCountMismatch {
        /// Number of tiles in the grid.
        expected: usize,
        /// Number of fills provided.
        actual: usize,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTileLength { tile_length } => {
                write!(f, "tile_length must be positive (received {tile_length})")
            }
            Self::FillCountMismatch { expected, actual } => {
                write!(f, "tile fill count mismatch: expected {expected}, got {actual}")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn grass() -> Color {
        Color::from_hex(0x5fa84f)
    }

    #[test]
    fn tile_grid_creation_accepts_matching_fills() {
        let presentation = TileGridPresentation::new(3, 2, 32.0, vec![grass(); 6])
            .expect("matching fill count should succeed");

        assert_eq!(presentation.width(), 96.0);
        assert_eq!(presentation.height(), 64.0);
        assert_eq!(presentation.tiles().count(), 6);
    }

    #[test]
    fn tile_grid_creation_rejects_mismatched_fills_without_panicking() {
        let error = TileGridPresentation::new(3, 2, 32.0, vec![grass(); 5])
            .expect_err("short fill list must be rejected");

        assert_eq!(
            error,
            RenderingError::FillCountMismatch {
                expected: 6,
                actual: 5
            }
        );
        assert_eq!(
            error.to_string(),
            "tile fill count mismatch: expected 6, got 5"
        );
    }

    #[test]
    fn tile_grid_creation_rejects_non_positive_tile_length() {
        let error = TileGridPresentation::new(1, 1, 0.0, vec![grass()])
            .expect_err("zero tile length must be rejected");

        assert!(matches!(error, RenderingError::InvalidTileLength { .. }));
    }

    #[test]
    fn fill_lookup_is_row_major() {
        let water = Color::from_hex(0x3a7bd5);
        let presentation =
            TileGridPresentation::new(2, 2, 16.0, vec![grass(), grass(), water, grass()])
                .expect("valid grid");

        assert_eq!(presentation.tile_origin(1, 1), Vec2::new(16.0, 16.0));
        let water_tiles: Vec<_> = presentation
            .tiles()
            .filter(|(_, _, fill)| *fill == water)
            .map(|(column, row, _)| (column, row))
            .collect();
        assert_eq!(water_tiles, vec![(0, 1)]);
    }

    #[test]
    fn hex_colors_unpack_channels() {
        let color = Color::from_hex(0xff8000);

        assert_eq!(color, Color::from_rgb_u8(255, 128, 0));
        assert_eq!(color.darken(1.0), Color::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(color.darken(0.5), Color::new(0.5, 128.0 / 255.0 * 0.5, 0.0, 1.0));
    }
}
