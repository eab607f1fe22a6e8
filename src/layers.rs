//! The layer set: loaded layer images, their placement and color, and the
//! overlay canvas they are composited into.

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::compositor::{self, Sentinels};
use crate::config::{self, LayerEntry, LayerSetConfig};
use crate::error::{alloc_filled, Error, Result};
use crate::image_store::{self, Raster};
use crate::output;

pub const MAX_LAYERS: usize = 8;

/// Which way a positive vertical nudge moves a layer on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YDirection {
    #[default]
    Down,
    Up,
}

/// One loaded layer image.
#[derive(Debug, Clone)]
pub struct Layer {
    raster: Raster,
    x: i32,
    y: i32,
    color: Rgb<u8>,
    enabled: bool,
    path: PathBuf,
}

impl Layer {
    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn size(&self) -> (u32, u32) {
        (self.raster.width(), self.raster.height())
    }

    /// Offset of the layer centre from the canvas centre.
    pub fn location(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn color(&self) -> Rgb<u8> {
        self.color
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Half-open world bounding box `(xmin, ymin, xmax, ymax)`.
    fn bounds(&self) -> (i64, i64, i64, i64) {
        let (w, h) = (self.raster.width() as i64, self.raster.height() as i64);
        let xlow = -w / 2 + self.x as i64;
        let ylow = -h / 2 + self.y as i64;
        (xlow, ylow, xlow + w, ylow + h)
    }
}

#[derive(Debug)]
pub struct LayerSet {
    layers: Vec<Layer>,
    max_layers: usize,
    current: usize,

    background_color: Rgb<u8>,
    overlay_color: Rgb<u8>,
    default_layer_color: Rgb<u8>,
    min_size: (u32, u32),
    y_direction: YDirection,

    /// Canvas position of world (0,0), set by the extent computation.
    origin: Option<(i64, i64)>,
    overlay: Option<RgbImage>,
    overlay_valid: bool,
    config_path: Option<PathBuf>,
}

impl Default for LayerSet {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerSet {
    pub fn new() -> Self {
        Self::with_max_layers(MAX_LAYERS)
    }

    pub fn with_max_layers(max_layers: usize) -> Self {
        Self {
            layers: Vec::with_capacity(max_layers),
            max_layers,
            current: 0,
            background_color: config::default_background(),
            overlay_color: config::default_overlay(),
            default_layer_color: config::default_layer_color(),
            min_size: (config::default_min_size(), config::default_min_size()),
            y_direction: YDirection::Down,
            origin: None,
            overlay: None,
            overlay_valid: false,
            config_path: None,
        }
    }

    fn invalidate(&mut self) {
        self.overlay_valid = false;
    }

    /// Geometry changed: the recorded origin no longer describes the layers.
    fn invalidate_geometry(&mut self) {
        self.overlay_valid = false;
        self.origin = None;
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.layers.len() {
            return Err(Error::parameter(format!(
                "layer {} out of range ({} layers)",
                index,
                self.layers.len()
            )));
        }
        Ok(())
    }

    fn layer_mut(&mut self, index: usize) -> Result<&mut Layer> {
        self.check_index(index)?;
        Ok(&mut self.layers[index])
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn max_layers(&self) -> usize {
        self.max_layers
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Result<&Layer> {
        self.check_index(index)?;
        Ok(&self.layers[index])
    }

    /// Load an image file and append it as a new layer.
    pub fn add_layer(&mut self, path: &Path) -> Result<usize> {
        if self.layers.len() >= self.max_layers {
            return Err(Error::parameter(format!(
                "already at the maximum of {} layers",
                self.max_layers
            )));
        }
        let (raster, _) = image_store::load_layer_image(path)?;
        self.add_raster(path, raster)
    }

    /// Append an already decoded image as a new layer.
    pub fn add_raster(&mut self, path: impl Into<PathBuf>, raster: Raster) -> Result<usize> {
        if self.layers.len() >= self.max_layers {
            return Err(Error::parameter(format!(
                "already at the maximum of {} layers",
                self.max_layers
            )));
        }
        let path = path.into();
        tracing::info!(
            "Layer {} added: {} ({}x{})",
            self.layers.len(),
            path.display(),
            raster.width(),
            raster.height()
        );
        self.layers.push(Layer {
            raster,
            x: 0,
            y: 0,
            color: self.default_layer_color,
            enabled: true,
            path,
        });
        self.invalidate_geometry();
        Ok(self.layers.len() - 1)
    }

    /// Remove a layer; later layers move down one index.
    pub fn release_layer(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        let layer = self.layers.remove(index);
        tracing::info!("Layer {} released: {}", index, layer.path.display());
        if self.current >= self.layers.len() {
            self.current = self.layers.len().saturating_sub(1);
        }
        self.invalidate_geometry();
        Ok(())
    }

    fn release_all(&mut self) {
        self.layers.clear();
        self.current = 0;
        self.overlay = None;
        self.invalidate_geometry();
    }

    pub fn size(&self, index: usize) -> Result<(u32, u32)> {
        Ok(self.layer(index)?.size())
    }

    pub fn location(&self, index: usize) -> Result<(i32, i32)> {
        Ok(self.layer(index)?.location())
    }

    pub fn set_location(&mut self, index: usize, x: i32, y: i32) -> Result<()> {
        let layer = self.layer_mut(index)?;
        layer.x = x;
        layer.y = y;
        self.invalidate_geometry();
        Ok(())
    }

    /// Move a layer relative to its current location. `dy` follows the
    /// configured vertical direction.
    pub fn nudge(&mut self, index: usize, dx: i32, dy: i32) -> Result<()> {
        let dy = match self.y_direction {
            YDirection::Down => dy,
            YDirection::Up => -dy,
        };
        let (x, y) = self.location(index)?;
        self.set_location(index, x.saturating_add(dx), y.saturating_add(dy))
    }

    pub fn layer_color(&self, index: usize) -> Result<Rgb<u8>> {
        Ok(self.layer(index)?.color)
    }

    pub fn set_layer_color(&mut self, index: usize, color: Rgb<u8>) -> Result<()> {
        self.layer_mut(index)?.color = color;
        self.invalidate();
        Ok(())
    }

    pub fn enable_layer(&mut self, index: usize) -> Result<()> {
        self.layer_mut(index)?.enabled = true;
        self.invalidate();
        Ok(())
    }

    pub fn disable_layer(&mut self, index: usize) -> Result<()> {
        self.layer_mut(index)?.enabled = false;
        self.invalidate();
        Ok(())
    }

    pub fn is_layer_enabled(&self, index: usize) -> bool {
        self.layers.get(index).is_some_and(|l| l.enabled)
    }

    /// `None` when there are no layers.
    pub fn current_layer(&self) -> Option<usize> {
        (!self.layers.is_empty()).then_some(self.current)
    }

    pub fn set_current_layer(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        self.current = index;
        Ok(())
    }

    pub fn background_color(&self) -> Rgb<u8> {
        self.background_color
    }

    pub fn set_background_color(&mut self, color: Rgb<u8>) {
        self.background_color = color;
        self.invalidate();
    }

    pub fn overlay_color(&self) -> Rgb<u8> {
        self.overlay_color
    }

    pub fn set_overlay_color(&mut self, color: Rgb<u8>) {
        self.overlay_color = color;
        self.invalidate();
    }

    pub fn default_layer_color(&self) -> Rgb<u8> {
        self.default_layer_color
    }

    pub fn set_default_layer_color(&mut self, color: Rgb<u8>) {
        self.default_layer_color = color;
        self.invalidate();
    }

    pub fn min_canvas_size(&self) -> (u32, u32) {
        self.min_size
    }

    pub fn set_min_canvas_size(&mut self, width: u32, height: u32) {
        self.min_size = (width, height);
        self.invalidate_geometry();
    }

    pub fn y_direction(&self) -> YDirection {
        self.y_direction
    }

    pub fn set_y_direction(&mut self, direction: YDirection) {
        self.y_direction = direction;
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Sentinel collisions that make compositing ambiguous. Advisory only.
    pub fn color_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.background_color == self.overlay_color {
            warnings.push("background and overlay colors are identical".to_string());
        }
        if self.default_layer_color == self.background_color {
            warnings.push("default layer color equals the background color".to_string());
        }
        if self.default_layer_color == self.overlay_color {
            warnings.push("default layer color equals the overlay color".to_string());
        }
        warnings
    }

    /// Smallest canvas holding every layer (enabled or not) and the minimum
    /// size box centred on the origin. Records where world (0,0) lands.
    pub fn compute_required_canvas_extent(&mut self) -> Result<(u32, u32)> {
        let (min_w, min_h) = (self.min_size.0 as i64, self.min_size.1 as i64);
        let (mut xmin, mut ymin, mut xmax, mut ymax) = (-min_w / 2, -min_h / 2, min_w / 2, min_h / 2);

        for layer in &self.layers {
            let (xlow, ylow, xhigh, yhigh) = layer.bounds();
            xmin = xmin.min(xlow);
            ymin = ymin.min(ylow);
            xmax = xmax.max(xhigh);
            ymax = ymax.max(yhigh);
        }

        let (width, height) = (xmax - xmin, ymax - ymin);
        self.origin = Some((-xmin, -ymin));

        if width <= 0 || height <= 0 {
            return Err(Error::parameter(format!(
                "canvas extent {}x{} is empty",
                width, height
            )));
        }
        if width > u32::MAX as i64 || height > u32::MAX as i64 {
            return Err(Error::parameter(format!(
                "canvas extent {}x{} is too large",
                width, height
            )));
        }
        tracing::debug!(
            "Canvas extent {}x{}, origin ({}, {})",
            width,
            height,
            -xmin,
            -ymin
        );
        Ok((width as u32, height as u32))
    }

    pub fn canvas_origin(&self) -> Option<(i64, i64)> {
        self.origin
    }

    /// Replace the overlay with a canvas filled with the overlay color. The
    /// overlay stays invalid until [`LayerSet::composite`] runs.
    pub fn create_overlay_canvas(&mut self, width: u32, height: u32) -> Result<()> {
        self.overlay = None;
        self.overlay_valid = false;
        if width == 0 || height == 0 {
            return Err(Error::parameter(format!("overlay size {}x{}", width, height)));
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(3))
            .ok_or(Error::Memory(usize::MAX))?;
        let mut buf = alloc_filled(len, 0u8)?;
        for px in buf.chunks_exact_mut(3) {
            px.copy_from_slice(&self.overlay_color.0);
        }
        let canvas = RgbImage::from_raw(width, height, buf)
            .ok_or_else(|| Error::parameter("overlay buffer size mismatch"))?;
        self.overlay = Some(canvas);
        Ok(())
    }

    /// Composite every enabled layer into the overlay canvas.
    pub fn composite(&mut self) -> Result<()> {
        let origin = self
            .origin
            .ok_or_else(|| Error::parameter("canvas extent has not been computed"))?;
        let canvas = self
            .overlay
            .as_mut()
            .ok_or_else(|| Error::parameter("no overlay canvas"))?;

        if self.background_color == self.overlay_color {
            tracing::warn!("Background and overlay colors are identical");
        }

        let sentinels = Sentinels {
            background: self.background_color,
            overlay: self.overlay_color,
        };
        compositor::composite(canvas, origin, &self.layers, sentinels);
        self.overlay_valid = true;
        Ok(())
    }

    /// Recompute extent, recreate the canvas and composite.
    pub fn update_overlay(&mut self) -> Result<()> {
        let (width, height) = self.compute_required_canvas_extent()?;
        self.create_overlay_canvas(width, height)?;
        self.composite()?;
        tracing::info!(
            "Overlay updated: {}x{} from {} layer(s)",
            width,
            height,
            self.layers.len()
        );
        Ok(())
    }

    pub fn is_overlay_valid(&self) -> bool {
        self.overlay_valid
    }

    /// The composited overlay; an error unless it is current.
    pub fn overlay_image(&self) -> Result<&RgbImage> {
        match &self.overlay {
            Some(img) if self.overlay_valid && img.width() > 0 && img.height() > 0 => Ok(img),
            Some(_) if !self.overlay_valid => Err(Error::parameter("overlay is out of date")),
            _ => Err(Error::parameter("no overlay image")),
        }
    }

    pub fn save_overlay(&self, path: &Path) -> Result<()> {
        output::save_image(self.overlay_image()?, path)
    }

    pub fn to_config(&self) -> LayerSetConfig {
        LayerSetConfig {
            background_color: self.background_color,
            overlay_color: self.overlay_color,
            default_layer_color: self.default_layer_color,
            min_width: self.min_size.0,
            min_height: self.min_size.1,
            current_layer: self.current,
            y_direction: self.y_direction,
            layer: self
                .layers
                .iter()
                .map(|l| LayerEntry {
                    path: l.path.clone(),
                    color: l.color,
                    x: l.x,
                    y: l.y,
                    enabled: l.enabled,
                })
                .collect(),
        }
    }

    /// Write the `[layers]` section of the session file.
    pub fn save_configuration(&mut self, path: &Path) -> Result<()> {
        config::write_section(path, config::LAYERS_SECTION, &self.to_config())?;
        self.config_path = Some(path.to_path_buf());
        tracing::info!(
            "Saved {} layer(s) to {}",
            self.layers.len(),
            path.display()
        );
        Ok(())
    }

    /// Replace the current layers with those in the `[layers]` section.
    /// Relative layer paths are taken from the session file's directory.
    /// Layers whose image fails to load are skipped; the others stay loaded
    /// and the call reports `FileSize`.
    pub fn load_configuration(&mut self, path: &Path) -> Result<()> {
        self.release_all();

        let cfg: LayerSetConfig = config::read_section(path, config::LAYERS_SECTION)?
            .ok_or_else(|| Error::FileOpen {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no [layers] section",
                ),
            })?;

        self.background_color = cfg.background_color;
        self.overlay_color = cfg.overlay_color;
        self.default_layer_color = cfg.default_layer_color;
        self.min_size = (cfg.min_width, cfg.min_height);
        self.y_direction = cfg.y_direction;

        let base = path.parent().unwrap_or(Path::new(""));
        let expected = cfg.layer.len();
        for entry in &cfg.layer {
            let source = base.join(&entry.path);
            let index = match self.add_layer(&source) {
                Ok(index) => index,
                Err(e) => {
                    tracing::warn!("Skipping layer {}: {}", source.display(), e);
                    continue;
                }
            };
            let layer = &mut self.layers[index];
            layer.path = entry.path.clone();
            layer.color = entry.color;
            layer.x = entry.x;
            layer.y = entry.y;
            layer.enabled = entry.enabled;
        }

        self.current = cfg.current_layer.min(self.layers.len().saturating_sub(1));
        self.config_path = Some(path.to_path_buf());
        self.invalidate_geometry();

        for warning in self.color_warnings() {
            tracing::warn!("{}", warning);
        }

        let loaded = self.layers.len();
        if loaded != expected {
            return Err(Error::FileSize {
                path: path.to_path_buf(),
                loaded,
                expected,
            });
        }
        tracing::info!("Loaded {} layer(s) from {}", loaded, path.display());
        Ok(())
    }
}
