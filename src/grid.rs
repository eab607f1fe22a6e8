//! Grid and gap layout along one axis.
//!
//! Content is grouped into minor cells, minor cells into major cells. Gaps
//! between groups fall into four regimes per axis depending on which of the
//! major and minor gap widths are non-zero:
//!
//! | major gap | minor gap | layout |
//! |---|---|---|
//! | 0 | 0 | content only |
//! | 0 | >0 | `minor` content, minor gap, repeated |
//! | >0 | 0 | major gap, then `major*minor` content and a major gap, repeated |
//! | >0 | >0 | major gap, then `major` minor cells separated by minor gaps and closed by a major gap, repeated |
//!
//! With a major gap the whole image is framed by major gaps.

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::color;
use crate::error::{Error, Result};

/// Grid parameters for one axis. Values are clamped before use: cell counts
/// to at least 1, gap widths to at least 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisGrid {
    #[serde(default = "one")]
    pub major_cells: i32,
    #[serde(default = "one")]
    pub minor_cells: i32,
    #[serde(default)]
    pub major_gap: i32,
    #[serde(default)]
    pub minor_gap: i32,
}

fn one() -> i32 {
    1
}

impl Default for AxisGrid {
    fn default() -> Self {
        Self {
            major_cells: 1,
            minor_cells: 1,
            major_gap: 0,
            minor_gap: 0,
        }
    }
}

/// Gap counts and resulting extent for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisLayout {
    /// Content extent rounded up to a whole number of major cells.
    pub padded: i64,
    pub major_gaps: i64,
    pub minor_gaps: i64,
    pub extent: i64,
}

/// What occupies one position along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Content,
    MinorGap,
    MajorGap,
}

impl AxisGrid {
    pub fn new(major_cells: i32, minor_cells: i32, major_gap: i32, minor_gap: i32) -> Self {
        Self {
            major_cells,
            minor_cells,
            major_gap,
            minor_gap,
        }
    }

    pub fn clamped(self) -> Self {
        Self {
            major_cells: self.major_cells.max(1),
            minor_cells: self.minor_cells.max(1),
            major_gap: self.major_gap.max(0),
            minor_gap: self.minor_gap.max(0),
        }
    }

    /// Extent needed to show `content` positions with this grid.
    pub fn layout(&self, content: i64) -> AxisLayout {
        let g = self.clamped();
        let (major, minor) = (g.major_cells as i64, g.minor_cells as i64);
        let (major_gap, minor_gap) = (g.major_gap as i64, g.minor_gap as i64);

        let block = major * minor;
        let padded = if content % block != 0 {
            content + (block - content % block)
        } else {
            content
        };

        let (major_gaps, minor_gaps) = match (major_gap != 0, minor_gap != 0) {
            (false, false) => (0, 0),
            (false, true) => (0, padded / minor - 1),
            (true, false) => (padded / block + 1, 0),
            (true, true) => {
                let majors = padded / block + 1;
                (majors, (major - 1) * (majors - 1))
            }
        };

        AxisLayout {
            padded,
            major_gaps,
            minor_gaps,
            extent: padded + major_gaps * major_gap + minor_gaps * minor_gap,
        }
    }

    /// Cell sequence along an axis of length `extent`. The pattern repeats
    /// until the extent is filled and is cut off wherever that happens.
    pub fn pattern(&self, extent: usize) -> Result<Vec<Cell>> {
        let g = self.clamped();
        let (major, minor) = (g.major_cells as usize, g.minor_cells as usize);
        let (major_gap, minor_gap) = (g.major_gap as usize, g.minor_gap as usize);

        let mut cells = Vec::new();
        cells
            .try_reserve_exact(extent)
            .map_err(|_| Error::Memory(extent))?;
        let run = |cells: &mut Vec<Cell>, cell: Cell, n: usize| {
            let n = n.min(extent - cells.len());
            cells.extend(std::iter::repeat(cell).take(n));
        };

        match (major_gap != 0, minor_gap != 0) {
            (false, false) => run(&mut cells, Cell::Content, extent),
            (false, true) => {
                while cells.len() < extent {
                    run(&mut cells, Cell::Content, minor);
                    run(&mut cells, Cell::MinorGap, minor_gap);
                }
            }
            (true, false) => {
                run(&mut cells, Cell::MajorGap, major_gap);
                while cells.len() < extent {
                    run(&mut cells, Cell::Content, major * minor);
                    run(&mut cells, Cell::MajorGap, major_gap);
                }
            }
            (true, true) => {
                run(&mut cells, Cell::MajorGap, major_gap);
                while cells.len() < extent {
                    run(&mut cells, Cell::Content, minor);
                    for _ in 1..major {
                        run(&mut cells, Cell::MinorGap, minor_gap);
                        run(&mut cells, Cell::Content, minor);
                    }
                    run(&mut cells, Cell::MajorGap, major_gap);
                }
            }
        }
        Ok(cells)
    }
}

/// Grid settings for the display: both axes, colors, and the enable flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSettings {
    #[serde(default)]
    pub x: AxisGrid,
    #[serde(default)]
    pub y: AxisGrid,
    #[serde(with = "color::hex", default = "default_background")]
    pub background_color: Rgb<u8>,
    #[serde(with = "color::hex", default = "default_major_gap_color")]
    pub major_gap_color: Rgb<u8>,
    #[serde(with = "color::hex", default = "default_minor_gap_color")]
    pub minor_gap_color: Rgb<u8>,
    #[serde(default = "default_grid_enabled")]
    pub grid_enabled: bool,
}

fn default_background() -> Rgb<u8> {
    color::BLACK
}

fn default_major_gap_color() -> Rgb<u8> {
    Rgb([0x60, 0x60, 0x60])
}

fn default_minor_gap_color() -> Rgb<u8> {
    Rgb([0x30, 0x30, 0x30])
}

fn default_grid_enabled() -> bool {
    true
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            x: AxisGrid::default(),
            y: AxisGrid::default(),
            background_color: default_background(),
            major_gap_color: default_major_gap_color(),
            minor_gap_color: default_minor_gap_color(),
            grid_enabled: default_grid_enabled(),
        }
    }
}

impl GridSettings {
    pub fn clamp(&mut self) {
        self.x = self.x.clamped();
        self.y = self.y.clamped();
    }

    /// Colors of one display row, by column cell, given the row's cell.
    /// Major gap rows are solid; minor gap rows keep the major gap columns.
    pub fn row_palette(&self, row: Cell) -> [Rgb<u8>; 3] {
        let (bg, major, minor) = (
            self.background_color,
            self.major_gap_color,
            self.minor_gap_color,
        );
        match row {
            Cell::Content => [bg, minor, major],
            Cell::MinorGap => [minor, minor, major],
            Cell::MajorGap => [major, major, major],
        }
    }
}

/// Index into a palette from [`GridSettings::row_palette`].
pub fn palette_index(cell: Cell) -> usize {
    match cell {
        Cell::Content => 0,
        Cell::MinorGap => 1,
        Cell::MajorGap => 2,
    }
}
