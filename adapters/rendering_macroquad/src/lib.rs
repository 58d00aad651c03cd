#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Silverton.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.

use anyhow::{ensure, Context, Result};
use glam::Vec2;
use macroquad::{
    input::{is_key_down, is_key_pressed, KeyCode},
    math::Vec2 as MacroquadVec2,
    shapes::{draw_circle, draw_rectangle, draw_rectangle_lines, draw_triangle},
    text::{draw_text, measure_text},
};
use silverton_core::Direction;
use silverton_rendering::{
    ActorPresentation, Color, DialogBoxPresentation, FrameDirective, FrameInput,
    LabelPresentation, Presentation, RenderingBackend, Scene,
};
use std::{sync::mpsc, time::Duration};
use tracing::{debug, info};

const DIALOG_FONT_SIZE: f32 = 24.0;
const SPEAKER_FONT_SIZE: f32 = 22.0;
const DIALOG_MARGIN: f32 = 16.0;
const DIALOG_PADDING: f32 = 18.0;
const DIALOG_HEIGHT_RATIO: f32 = 0.24;
const LINE_SPACING: f32 = 1.3;

const LABEL_TEXT: Color = Color::new(1.0, 1.0, 1.0, 0.6);
const PROMINENT_LABEL_TEXT: Color = Color::new(1.0, 1.0, 1.0, 0.8);

const DIALOG_BACKGROUND: Color = Color::new(0.06, 0.06, 0.12, 0.92);
const DIALOG_BORDER: Color = Color::new(0.95, 0.95, 0.95, 1.0);
const DIALOG_TEXT: Color = Color::new(1.0, 1.0, 1.0, 1.0);
const SPEAKER_TEXT: Color = Color::new(1.0, 0.85, 0.35, 1.0);

/// Resolves held direction keys into a single direction.
///
/// Up wins over down, down over left and left over right so diagonal input
/// never produces a diagonal step.
#[doc(hidden)]
#[must_use]
pub fn resolve_held_direction(
    up: bool,
    down: bool,
    left: bool,
    right: bool,
) -> Option<Direction> {
    if up {
        Some(Direction::Up)
    } else if down {
        Some(Direction::Down)
    } else if left {
        Some(Direction::Left)
    } else if right {
        Some(Direction::Right)
    } else {
        None
    }
}

/// Breaks `text` into lines no wider than `max_width` according to `measure`.
///
/// Explicit line breaks are preserved. Words wider than the limit keep a line
/// of their own.
#[doc(hidden)]
pub fn wrap_text<M>(text: &str, max_width: f32, mut measure: M) -> Vec<String>
where
    M: FnMut(&str) -> f32,
{
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }

            let candidate = format!("{line} {word}");
            if measure(&candidate) <= max_width {
                line = candidate;
            } else {
                lines.push(std::mem::replace(&mut line, word.to_owned()));
            }
        }
        lines.push(line);
    }
    lines
}

fn poll_frame_input() -> FrameInput {
    let direction = resolve_held_direction(
        is_key_down(KeyCode::Up) || is_key_down(KeyCode::W),
        is_key_down(KeyCode::Down) || is_key_down(KeyCode::S),
        is_key_down(KeyCode::Left) || is_key_down(KeyCode::A),
        is_key_down(KeyCode::Right) || is_key_down(KeyCode::D),
    );

    FrameInput {
        direction,
        interact: is_key_pressed(KeyCode::Space) || is_key_pressed(KeyCode::Enter),
        cancel: is_key_pressed(KeyCode::Escape),
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameDirective + 'static,
    {
        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        ensure!(
            scene.tile_grid.columns > 0 && scene.tile_grid.rows > 0,
            "cannot present an empty tile grid"
        );

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 1280,
            window_height: 960,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = self.swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        let (started_sender, started_receiver) = mpsc::channel::<()>();

        info!(
            columns = scene.tile_grid.columns,
            rows = scene.tile_grid.rows,
            "opening_window"
        );

        macroquad::Window::from_config(config, async move {
            let _ = started_sender.send(());
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);

            loop {
                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let frame_input = poll_frame_input();

                if update_scene(frame_dt, frame_input, &mut scene) == FrameDirective::Exit {
                    debug!("exit_requested");
                    break;
                }

                macroquad::window::clear_background(background);
                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();
                let metrics = SceneMetrics::from_scene(&scene, screen_width, screen_height);

                draw_tiles(&scene, &metrics);
                for label in &scene.labels {
                    draw_label(label, &metrics);
                }
                for occupant in &scene.occupants {
                    draw_actor(occupant, &metrics, 0.8);
                }
                draw_actor(&scene.player, &metrics, 0.7);
                if let Some(dialog) = &scene.dialog {
                    draw_dialog_box(dialog, screen_width, screen_height);
                }

                macroquad::window::next_frame().await;
            }
        });

        started_receiver
            .recv()
            .context("window closed before the render loop started")?;

        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct SceneMetrics {
    scale: f32,
    offset_x: f32,
    offset_y: f32,
    tile_step: f32,
}

impl SceneMetrics {
    fn from_scene(scene: &Scene, screen_width: f32, screen_height: f32) -> Self {
        let world_width = scene.tile_grid.width();
        let world_height = scene.tile_grid.height();
        let scale = if world_width <= f32::EPSILON || world_height <= f32::EPSILON {
            1.0
        } else {
            (screen_width / world_width).min(screen_height / world_height)
        };

        Self {
            scale,
            offset_x: ((screen_width - world_width * scale) * 0.5).max(0.0),
            offset_y: ((screen_height - world_height * scale) * 0.5).max(0.0),
            tile_step: scene.tile_grid.tile_length * scale,
        }
    }

    fn to_screen(&self, world: Vec2) -> Vec2 {
        Vec2::new(
            self.offset_x + world.x * self.scale,
            self.offset_y + world.y * self.scale,
        )
    }
}

fn draw_tiles(scene: &Scene, metrics: &SceneMetrics) {
    let grid = &scene.tile_grid;
    for (column, row, fill) in grid.tiles() {
        let origin = metrics.to_screen(grid.tile_origin(column, row));
        draw_rectangle(
            origin.x,
            origin.y,
            metrics.tile_step,
            metrics.tile_step,
            to_macroquad_color(fill),
        );
    }
}

/// Font size of a label relative to the on-screen tile size.
fn label_font_size(label: &LabelPresentation, tile_step: f32) -> f32 {
    let ratio = if label.prominent { 0.75 } else { 0.55 };
    (tile_step * ratio).max(8.0)
}

fn draw_label(label: &LabelPresentation, metrics: &SceneMetrics) {
    let center = metrics.to_screen(label.center);
    let font_size = label_font_size(label, metrics.tile_step);
    let size = measure_text(&label.text, None, font_size as u16, 1.0);
    let color = if label.prominent {
        PROMINENT_LABEL_TEXT
    } else {
        LABEL_TEXT
    };

    let _ = draw_text(
        &label.text,
        center.x - size.width * 0.5,
        center.y + size.offset_y * 0.5,
        font_size,
        to_macroquad_color(color),
    );
}

fn draw_actor(actor: &ActorPresentation, metrics: &SceneMetrics, body_ratio: f32) {
    let center = metrics.to_screen(actor.center);
    let size = metrics.tile_step * body_ratio;
    let body = to_macroquad_color(actor.color);

    match actor.facing {
        Some(facing) => {
            draw_circle(center.x, center.y, size * 0.5, body);
            let (dx, dy) = facing.delta();
            let marker = center + Vec2::new(dx as f32, dy as f32) * size * 0.3;
            draw_circle(
                marker.x,
                marker.y,
                size * 0.14,
                to_macroquad_color(actor.color.darken(0.6)),
            );
        }
        None => {
            draw_rectangle(
                center.x - size * 0.5,
                center.y - size * 0.5,
                size,
                size,
                body,
            );
            draw_rectangle_lines(
                center.x - size * 0.5,
                center.y - size * 0.5,
                size,
                size,
                2.0,
                to_macroquad_color(actor.color.darken(0.5)),
            );
        }
    }
}

fn draw_dialog_box(dialog: &DialogBoxPresentation, screen_width: f32, screen_height: f32) {
    let width = (screen_width - DIALOG_MARGIN * 2.0).max(0.0);
    let height = screen_height * DIALOG_HEIGHT_RATIO;
    let x = DIALOG_MARGIN;
    let y = screen_height - height - DIALOG_MARGIN;

    draw_rectangle(x, y, width, height, to_macroquad_color(DIALOG_BACKGROUND));
    draw_rectangle_lines(x, y, width, height, 3.0, to_macroquad_color(DIALOG_BORDER));

    let mut baseline = y + DIALOG_PADDING + SPEAKER_FONT_SIZE * 0.8;
    if let Some(speaker) = &dialog.speaker {
        let _ = draw_text(
            speaker,
            x + DIALOG_PADDING,
            baseline,
            SPEAKER_FONT_SIZE,
            to_macroquad_color(SPEAKER_TEXT),
        );
        baseline += SPEAKER_FONT_SIZE * LINE_SPACING;
    }

    let text_width = width - DIALOG_PADDING * 2.0;
    let lines = wrap_text(&dialog.text, text_width, |candidate| {
        measure_text(candidate, None, DIALOG_FONT_SIZE as u16, 1.0).width
    });
    for line in lines {
        let _ = draw_text(
            &line,
            x + DIALOG_PADDING,
            baseline,
            DIALOG_FONT_SIZE,
            to_macroquad_color(DIALOG_TEXT),
        );
        baseline += DIALOG_FONT_SIZE * LINE_SPACING;
    }

    if dialog.show_continue {
        let tip_x = x + width - DIALOG_PADDING;
        let tip_y = y + height - DIALOG_PADDING;
        draw_triangle(
            MacroquadVec2::new(tip_x - 14.0, tip_y - 10.0),
            MacroquadVec2::new(tip_x, tip_y - 10.0),
            MacroquadVec2::new(tip_x - 7.0, tip_y),
            to_macroquad_color(DIALOG_BORDER),
        );
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
