//! Layer overlay compositing and gridded display generation.
//!
//! A [`LayerSet`] holds up to eight single-channel layer images, each with a
//! color and an offset from the canvas centre, and composites them additively
//! into an overlay. A [`Display`] lays the overlay out on a grid of content
//! cells separated by major and minor gaps.

pub mod color;
pub mod compositor;
pub mod config;
pub mod display;
pub mod error;
pub mod grid;
pub mod image_store;
pub mod layers;
pub mod output;
pub mod status;

pub use display::{Display, DisplayBuffer};
pub use error::{Error, ErrorKind, Result};
pub use layers::LayerSet;
