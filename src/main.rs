use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use layergrid::config::Settings;
use layergrid::image_store::{self, SourceFormat};
use layergrid::status::StatusReport;
use layergrid::{color, Display, DisplayBuffer, ErrorKind, LayerSet};

#[derive(Parser)]
#[command(
    name = "layergrid",
    version,
    about = "Layer overlay compositor with gridded display output"
)]
struct Cli {
    /// Path to session file
    #[arg(short, long, default_value = "session.toml", global = true)]
    config: PathBuf,

    /// Edit a session even if some of its layers failed to load; the
    /// missing layers are dropped from the file
    #[arg(long, global = true)]
    force: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Composite the layers and write the requested images
    Render {
        /// Output path for the overlay (format from extension)
        #[arg(long)]
        overlay: Option<PathBuf>,
        /// Output path for the gridded display
        #[arg(long)]
        display: Option<PathBuf>,
        /// Output path for the bare grid pattern
        #[arg(long)]
        reference: Option<PathBuf>,
    },
    /// Print a JSON summary of the session
    Status,
    /// Add a layer image (raw or BMP)
    Add {
        path: PathBuf,
        /// Layer color, e.g. "#ff0000"
        #[arg(long)]
        color: Option<String>,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        x: i32,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        y: i32,
    },
    /// Remove a layer; later layers move down
    Remove { index: usize },
    /// Set a layer's offset from the canvas centre
    Move {
        index: usize,
        #[arg(allow_negative_numbers = true)]
        x: i32,
        #[arg(allow_negative_numbers = true)]
        y: i32,
        /// Move relative to the current offset
        #[arg(long)]
        relative: bool,
    },
    /// Set a layer's color
    Color { index: usize, color: String },
    Enable { index: usize },
    Disable { index: usize },
    /// Print the decoded header of a layer image
    Inspect { path: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(&cli.config)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Render {
            overlay,
            display: display_path,
            reference,
        } => {
            let (mut layers, mut display) = open_session(&cli.config)?;
            if layers.is_empty() {
                tracing::warn!("No layers in {}", cli.config.display());
            }
            layers.update_overlay()?;
            display.update(layers.overlay_image()?)?;

            if let Some(path) = overlay {
                layers.save_overlay(&path)?;
            }
            if let Some(path) = display_path {
                display.save(&path, DisplayBuffer::Composite)?;
            }
            if let Some(path) = reference {
                display.save(&path, DisplayBuffer::Reference)?;
            }
            let (ow, oh) = layers.overlay_image()?.dimensions();
            let (dw, dh) = display.composite_image()?.dimensions();
            println!("overlay {}x{}, display {}x{}", ow, oh, dw, dh);
        }
        Command::Status => {
            let (mut layers, mut display) = open_session(&cli.config)?;
            if !layers.is_empty() {
                let rendered = layers
                    .update_overlay()
                    .and_then(|()| display.update(layers.overlay_image()?));
                if let Err(e) = rendered {
                    tracing::warn!("Cannot render session: {}", e);
                }
            }
            println!("{}", StatusReport::collect(&layers, &display).to_json()?);
        }
        Command::Add { path, color, x, y } => {
            let mut layers = open_for_edit(&cli.config, cli.force)?;
            // Sessions resolve relative layer paths from their own directory.
            let in_session_dir = cli.config.parent().map_or(true, |p| p.as_os_str().is_empty());
            let path = if path.is_relative() && !in_session_dir {
                std::fs::canonicalize(&path)
                    .with_context(|| format!("Cannot open layer {}", path.display()))?
            } else {
                path
            };
            let index = layers.add_layer(&path)?;
            if let Some(text) = color {
                layers.set_layer_color(index, parse_color(&text)?)?;
            }
            layers.set_location(index, x, y)?;
            layers.set_current_layer(index)?;
            save_session(&mut layers, &cli.config)?;
            println!("layer {}: {}", index, path.display());
        }
        Command::Remove { index } => {
            let mut layers = open_for_edit(&cli.config, cli.force)?;
            layers.release_layer(index)?;
            save_session(&mut layers, &cli.config)?;
        }
        Command::Move {
            index,
            x,
            y,
            relative,
        } => {
            let mut layers = open_for_edit(&cli.config, cli.force)?;
            if relative {
                layers.nudge(index, x, y)?;
            } else {
                layers.set_location(index, x, y)?;
            }
            save_session(&mut layers, &cli.config)?;
            let (x, y) = layers.location(index)?;
            println!("layer {} at ({}, {})", index, x, y);
        }
        Command::Color { index, color } => {
            let mut layers = open_for_edit(&cli.config, cli.force)?;
            layers.set_layer_color(index, parse_color(&color)?)?;
            save_session(&mut layers, &cli.config)?;
        }
        Command::Enable { index } => {
            let mut layers = open_for_edit(&cli.config, cli.force)?;
            layers.enable_layer(index)?;
            save_session(&mut layers, &cli.config)?;
        }
        Command::Disable { index } => {
            let mut layers = open_for_edit(&cli.config, cli.force)?;
            layers.disable_layer(index)?;
            save_session(&mut layers, &cli.config)?;
        }
        Command::Inspect { path } => inspect(&path)?,
    }
    Ok(())
}

/// Load the layers and display settings. A session file that does not exist
/// yet, or has no `[layers]` section, starts empty. Layers that failed to
/// load are reported alongside the ones that did.
fn load_session(path: &Path) -> Result<(LayerSet, Display, Option<layergrid::Error>)> {
    let mut layers = LayerSet::new();
    let mut display = Display::new();
    if !path.exists() {
        tracing::info!("Session {} does not exist, starting empty", path.display());
        return Ok((layers, display, None));
    }

    let mut partial = None;
    match layers.load_configuration(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::FileSize => partial = Some(e),
        Err(e) if e.kind() == ErrorKind::FileOpen => {
            tracing::info!("No layers in {}: {}", path.display(), e)
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to load session {}", path.display()))
        }
    }
    display.load_configuration(path)?;
    Ok((layers, display, partial))
}

/// For rendering and reporting: whatever loaded is good enough.
fn open_session(path: &Path) -> Result<(LayerSet, Display)> {
    let (layers, display, partial) = load_session(path)?;
    if let Some(e) = partial {
        tracing::warn!("{}", e);
    }
    Ok((layers, display))
}

/// For commands that rewrite the session. Indices only match the file when
/// every layer loaded, so a partial load is refused unless `force` is set.
fn open_for_edit(path: &Path, force: bool) -> Result<LayerSet> {
    let (layers, _, partial) = load_session(path)?;
    if let Some(e) = partial {
        if !force {
            bail!("{}; not editing the session (use --force to drop the missing layers)", e);
        }
        tracing::warn!("{}, dropping the missing layers", e);
    }
    Ok(layers)
}

fn save_session(layers: &mut LayerSet, path: &Path) -> Result<()> {
    layers
        .save_configuration(path)
        .with_context(|| format!("Failed to save session {}", path.display()))
}

fn parse_color(text: &str) -> Result<image::Rgb<u8>> {
    match color::parse(text) {
        Some(c) => Ok(c),
        None => bail!("Invalid color '{}', expected #RRGGBB", text),
    }
}

fn inspect(path: &Path) -> Result<()> {
    let (raster, format) = image_store::load_layer_image(path)?;
    println!("{}", path.display());
    println!("  size: {}x{}", raster.width(), raster.height());
    match format {
        SourceFormat::Raw {
            frames,
            pixel_size,
            endian,
        } => {
            println!("  format: raw, {:?} endian", endian);
            println!("  frames: {}", frames);
            println!("  pixel size: {} byte(s)", pixel_size.bytes());
        }
        SourceFormat::Bitmap { bits_per_pixel } => {
            println!("  format: bitmap, {} bit(s) per pixel", bits_per_pixel);
        }
    }
    let foreground = raster.pixels().iter().filter(|&&v| v != 0).count();
    println!("  foreground pixels: {}", foreground);
    Ok(())
}
