use serde::Serialize;

use crate::color;
use crate::display::Display;
use crate::grid::AxisGrid;
use crate::layers::LayerSet;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<String>,
    current_layer: Option<usize>,
    layers: Vec<LayerStatus>,
    overlay: Option<Extent>,
    display: Option<Extent>,
    grid: GridStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LayerStatus {
    index: usize,
    path: String,
    size: String,
    x: i32,
    y: i32,
    color: String,
    enabled: bool,
}

#[derive(Debug, Serialize)]
struct Extent {
    width: u32,
    height: u32,
}

#[derive(Debug, Serialize)]
struct GridStatus {
    enabled: bool,
    x: AxisGrid,
    y: AxisGrid,
    background_color: String,
    major_gap_color: String,
    minor_gap_color: String,
}

impl StatusReport {
    /// Snapshot of a layer set and its display. Extents are only reported
    /// for buffers that are current.
    pub fn collect(layers: &LayerSet, display: &Display) -> Self {
        let layer_status = layers
            .layers()
            .iter()
            .enumerate()
            .map(|(index, l)| {
                let (w, h) = l.size();
                let (x, y) = l.location();
                LayerStatus {
                    index,
                    path: l.path().display().to_string(),
                    size: format!("{}x{}", w, h),
                    x,
                    y,
                    color: color::format(l.color()),
                    enabled: l.is_enabled(),
                }
            })
            .collect();

        let extent = |img: &image::RgbImage| Extent {
            width: img.width(),
            height: img.height(),
        };
        let grid = display.settings();

        StatusReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            session: layers.config_path().map(|p| p.display().to_string()),
            current_layer: layers.current_layer(),
            layers: layer_status,
            overlay: layers.overlay_image().ok().map(extent),
            display: display.composite_image().ok().map(extent),
            grid: GridStatus {
                enabled: grid.grid_enabled,
                x: grid.x,
                y: grid.y,
                background_color: color::format(grid.background_color),
                major_gap_color: color::format(grid.major_gap_color),
                minor_gap_color: color::format(grid.minor_gap_color),
            },
            warnings: layers.color_warnings(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_store::Raster;

    #[test]
    fn report_lists_layers_and_extents() {
        let mut layers = LayerSet::new();
        layers.set_min_canvas_size(4, 4);
        layers
            .add_raster("dot.raw", Raster::new(2, 2, vec![1; 4]).unwrap())
            .unwrap();
        layers.set_location(0, 3, -1).unwrap();

        let mut display = Display::new();
        let report: serde_json::Value =
            serde_json::from_str(&StatusReport::collect(&layers, &display).to_json().unwrap()).unwrap();
        assert_eq!(report["layers"][0]["size"], "2x2");
        assert_eq!(report["layers"][0]["color"], "#ffffff");
        assert_eq!(report["current_layer"], 0);
        assert!(report["overlay"].is_null());
        assert!(report.get("warnings").is_none());

        layers.update_overlay().unwrap();
        display.update(layers.overlay_image().unwrap()).unwrap();
        let report: serde_json::Value =
            serde_json::from_str(&StatusReport::collect(&layers, &display).to_json().unwrap()).unwrap();
        assert_eq!(report["overlay"]["width"], 6);
        assert_eq!(report["display"]["height"], 4);
        assert_eq!(report["grid"]["x"]["major_cells"], 1);
    }
}
