//! Session file handling.
//!
//! A session is one TOML document split into sections, one per component:
//! `[settings]` for the binary, `[layers]` for the layer set and `[display]`
//! for the grid renderer. Each component reads and rewrites only its own
//! section, leaving the others as they were.

use image::Rgb;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::color;
use crate::error::{Error, Result};
use crate::layers::YDirection;

pub const SETTINGS_SECTION: &str = "settings";
pub const LAYERS_SECTION: &str = "layers";
pub const DISPLAY_SECTION: &str = "display";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Missing file or section yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match read_section(path, SETTINGS_SECTION) {
            Ok(settings) => Ok(settings.unwrap_or_default()),
            Err(Error::FileOpen { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }
}

/// Persisted form of a layer set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayerSetConfig {
    #[serde(with = "color::hex", default = "default_background")]
    pub background_color: Rgb<u8>,
    #[serde(with = "color::hex", default = "default_overlay")]
    pub overlay_color: Rgb<u8>,
    #[serde(with = "color::hex", default = "default_layer_color")]
    pub default_layer_color: Rgb<u8>,
    #[serde(default = "default_min_size")]
    pub min_width: u32,
    #[serde(default = "default_min_size")]
    pub min_height: u32,
    #[serde(default)]
    pub current_layer: usize,
    #[serde(default)]
    pub y_direction: YDirection,
    #[serde(default)]
    pub layer: Vec<LayerEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayerEntry {
    pub path: PathBuf,
    #[serde(with = "color::hex", default = "default_layer_color")]
    pub color: Rgb<u8>,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

pub(crate) fn default_background() -> Rgb<u8> {
    color::BLACK
}

pub(crate) fn default_overlay() -> Rgb<u8> {
    Rgb([0x40, 0x40, 0x40])
}

pub(crate) fn default_layer_color() -> Rgb<u8> {
    color::WHITE
}

pub(crate) fn default_min_size() -> u32 {
    512
}

fn default_enabled() -> bool {
    true
}

fn read_table(path: &Path) -> Result<toml::Table> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    content
        .parse::<toml::Table>()
        .map_err(|e| Error::file_type(path, format!("Failed to parse session file: {}", e)))
}

/// Read one section. `Ok(None)` when the file exists but lacks the section.
pub fn read_section<T: DeserializeOwned>(path: &Path, section: &str) -> Result<Option<T>> {
    let mut table = read_table(path)?;
    let Some(value) = table.remove(section) else {
        return Ok(None);
    };
    value
        .try_into::<T>()
        .map(Some)
        .map_err(|e| Error::file_type(path, format!("Invalid [{}] section: {}", section, e)))
}

/// Replace one section, creating the file when needed.
pub fn write_section<T: Serialize>(path: &Path, section: &str, value: &T) -> Result<()> {
    let mut table = if path.exists() {
        read_table(path)?
    } else {
        toml::Table::new()
    };
    let value = toml::Value::try_from(value)
        .map_err(|e| Error::parameter(format!("Cannot serialize [{}]: {}", section, e)))?;
    table.insert(section.to_string(), value);

    let content = toml::to_string_pretty(&table)
        .map_err(|e| Error::parameter(format!("Cannot serialize [{}]: {}", section, e)))?;
    std::fs::write(path, content).map_err(|source| Error::FileOpen {
        path: path.to_path_buf(),
        source,
    })
}
