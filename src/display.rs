//! Gridded display output.
//!
//! The display is built in two steps: a reference canvas laying out the
//! grid pattern over the whole display extent, then the overlay poured into
//! the background-colored positions of that reference.

use image::{Rgb, RgbImage};
use rayon::prelude::*;
use std::path::Path;

use crate::config;
use crate::error::{alloc_filled, Error, Result};
use crate::grid::{palette_index, Cell, GridSettings};
use crate::output;

/// Which display buffer to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayBuffer {
    Composite,
    Reference,
}

#[derive(Default)]
pub struct Display {
    settings: GridSettings,
    reference: Option<RgbImage>,
    composite: Option<RgbImage>,
}

impl Display {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: GridSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    /// Replace the grid settings. Existing buffers are dropped.
    pub fn set_settings(&mut self, settings: GridSettings) {
        self.settings = settings;
        self.reference = None;
        self.composite = None;
    }

    /// Display size needed to show a `content_w` x `content_h` overlay.
    pub fn compute_display_extent(&self, content_w: u32, content_h: u32) -> Result<(u32, u32)> {
        let x = self.settings.x.layout(content_w as i64);
        let y = self.settings.y.layout(content_h as i64);
        tracing::debug!(
            "Display layout x: padded {} major gaps {} minor gaps {}; y: padded {} major gaps {} minor gaps {}",
            x.padded,
            x.major_gaps,
            x.minor_gaps,
            y.padded,
            y.major_gaps,
            y.minor_gaps
        );

        if x.extent <= 0 || y.extent <= 0 {
            return Err(Error::parameter(format!(
                "display extent {}x{} is empty",
                x.extent, y.extent
            )));
        }
        let width = u32::try_from(x.extent)
            .map_err(|_| Error::parameter(format!("display width {} is too large", x.extent)))?;
        let height = u32::try_from(y.extent)
            .map_err(|_| Error::parameter(format!("display height {} is too large", y.extent)))?;
        Ok((width, height))
    }

    /// Grid pattern over a `width` x `height` display.
    pub fn build_reference_canvas(&self, width: u32, height: u32) -> Result<RgbImage> {
        let len = canvas_len(width, height)?;
        let mut buf = alloc_filled(len, 0u8)?;
        let columns = self.settings.x.pattern(width as usize)?;
        let rows = self.settings.y.pattern(height as usize)?;

        // One template per row kind; rows are copies of these.
        let row_len = canvas_len(width, 1)?;
        let mut templates = Vec::with_capacity(3);
        for row in [Cell::Content, Cell::MinorGap, Cell::MajorGap] {
            let palette = self.settings.row_palette(row);
            let mut template = alloc_filled(row_len, 0u8)?;
            for (px, &c) in template.chunks_exact_mut(3).zip(&columns) {
                px.copy_from_slice(&palette[palette_index(c)].0);
            }
            templates.push(template);
        }

        if len > 0 {
            buf.par_chunks_mut(width as usize * 3)
                .zip(rows.par_iter())
                .for_each(|(dst, &row)| dst.copy_from_slice(&templates[palette_index(row)]));
        }

        RgbImage::from_raw(width, height, buf)
            .ok_or_else(|| Error::parameter("reference buffer size mismatch"))
    }

    /// Rebuild both display buffers for a new overlay.
    pub fn update(&mut self, overlay: &RgbImage) -> Result<()> {
        self.settings.clamp();
        self.reference = None;
        self.composite = None;

        let (ow, oh) = overlay.dimensions();
        if !self.settings.grid_enabled {
            let reference = solid_canvas(ow, oh, self.settings.background_color)?;
            let mut buf = alloc_filled(overlay.as_raw().len(), 0u8)?;
            buf.copy_from_slice(overlay.as_raw());
            self.composite = RgbImage::from_raw(ow, oh, buf);
            self.reference = Some(reference);
            tracing::info!("Display updated: {}x{} without grid", ow, oh);
            return Ok(());
        }

        let (width, height) = self.compute_display_extent(ow, oh)?;
        let reference = self.build_reference_canvas(width, height)?;
        let composite = fuse_overlay(&reference, overlay, self.settings.background_color)?;
        self.reference = Some(reference);
        self.composite = Some(composite);
        tracing::info!(
            "Display updated: {}x{} overlay shown at {}x{}",
            ow,
            oh,
            width,
            height
        );
        Ok(())
    }

    pub fn composite_image(&self) -> Result<&RgbImage> {
        self.composite
            .as_ref()
            .ok_or_else(|| Error::parameter("display has not been updated"))
    }

    pub fn reference_image(&self) -> Result<&RgbImage> {
        self.reference
            .as_ref()
            .ok_or_else(|| Error::parameter("display has not been updated"))
    }

    pub fn save(&self, path: &Path, buffer: DisplayBuffer) -> Result<()> {
        let image = match buffer {
            DisplayBuffer::Composite => self.composite_image()?,
            DisplayBuffer::Reference => self.reference_image()?,
        };
        output::save_image(image, path)
    }

    /// Write the `[display]` section of the session file.
    pub fn save_configuration(&self, path: &Path) -> Result<()> {
        config::write_section(path, config::DISPLAY_SECTION, &self.settings)?;
        tracing::info!("Saved display settings to {}", path.display());
        Ok(())
    }

    /// Read the `[display]` section. A session without one gets the defaults.
    pub fn load_configuration(&mut self, path: &Path) -> Result<()> {
        let settings = match config::read_section(path, config::DISPLAY_SECTION)? {
            Some(settings) => settings,
            None => {
                tracing::debug!("No [display] section in {}, using defaults", path.display());
                GridSettings::default()
            }
        };
        self.set_settings(settings);
        self.settings.clamp();
        Ok(())
    }
}

fn canvas_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or(Error::Memory(usize::MAX))
}

fn solid_canvas(width: u32, height: u32, color: Rgb<u8>) -> Result<RgbImage> {
    let mut buf = alloc_filled(canvas_len(width, height)?, 0u8)?;
    for px in buf.chunks_exact_mut(3) {
        px.copy_from_slice(&color.0);
    }
    RgbImage::from_raw(width, height, buf).ok_or_else(|| Error::parameter("canvas size mismatch"))
}

/// Pour `overlay` into the background-colored positions of `reference`.
///
/// Overlay pixels are taken in raster order: each reference row consumes
/// pixels from the current overlay row until it runs out of background
/// positions or the overlay row ends. The overlay row advances only after a
/// reference row took at least one pixel from it. Unfilled background stays
/// background; overlay pixels left over at the end are dropped.
pub fn fuse_overlay(reference: &RgbImage, overlay: &RgbImage, background: Rgb<u8>) -> Result<RgbImage> {
    let (width, height) = reference.dimensions();
    let (ow, oh) = overlay.dimensions();

    let mut buf = alloc_filled(reference.as_raw().len(), 0u8)?;
    buf.copy_from_slice(reference.as_raw());
    let mut fused = RgbImage::from_raw(width, height, buf)
        .ok_or_else(|| Error::parameter("display buffer size mismatch"))?;

    let mut iy = 0;
    for y in 0..height {
        if iy >= oh {
            break;
        }
        let mut ix = 0;
        for x in 0..width {
            if ix >= ow {
                break;
            }
            if *reference.get_pixel(x, y) == background {
                fused.put_pixel(x, y, *overlay.get_pixel(ix, iy));
                ix += 1;
            }
        }
        if ix > 0 {
            iy += 1;
        }
    }
    Ok(fused)
}
