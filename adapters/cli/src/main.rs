#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Silverton experience.

mod simulation;

use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use silverton_rendering::{Color, Presentation, RenderingBackend};
use silverton_rendering_macroquad::MacroquadBackend;
use silverton_system_bootstrap::{default_scene, parse_scene, Scene};
use tracing::info;
use tracing_subscriber::EnvFilter;

use self::simulation::Simulation;

/// Command-line arguments accepted by the Silverton binary.
#[derive(Debug, Parser)]
#[command(name = "silverton", about = "Explore Silvertown one tile at a time")]
struct Args {
    /// Scene file to load instead of the built-in Silvertown map.
    #[arg(long, value_name = "PATH")]
    scene: Option<PathBuf>,
    /// Synchronise presentation with the display refresh rate.
    #[arg(long)]
    vsync: bool,
    /// Explicit swap interval requested from the platform; overrides `--vsync`.
    #[arg(long, value_name = "FRAMES", allow_negative_numbers = true)]
    swap_interval: Option<i32>,
}

/// Entry point for the Silverton command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let scene = load_scene(args.scene.as_deref())?;
    let mut simulation = Simulation::new(&scene)?;
    info!(
        title = scene.title(),
        banner = simulation.welcome_banner(),
        "scene_ready"
    );

    let presentation = Presentation::new(
        scene.title(),
        Color::from_rgb_u8(0, 0, 0),
        simulation.scene(),
    );

    let backend = match args.swap_interval {
        Some(interval) => MacroquadBackend::new().with_swap_interval(Some(interval)),
        None if args.vsync => MacroquadBackend::new().with_vsync(true),
        None => MacroquadBackend::new(),
    };

    backend.run(presentation, move |dt, input, scene| {
        let directive = simulation.advance(dt, input);
        simulation.populate_scene(scene);
        directive
    })
}

fn load_scene(path: Option<&Path>) -> Result<Scene> {
    let Some(path) = path else {
        return default_scene().context("built-in scene failed validation");
    };

    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read scene file {}", path.display()))?;
    parse_scene(&source).with_context(|| format!("invalid scene file {}", path.display()))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
