use image::{Rgb, RgbImage};
use rayon::prelude::*;

use crate::color;
use crate::layers::Layer;

/// Colors that mark canvas pixels no layer has painted with real content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentinels {
    /// Written where a layer has a zero sample.
    pub background: Rgb<u8>,
    /// Fill of a freshly created canvas.
    pub overlay: Rgb<u8>,
}

impl Sentinels {
    fn contains(&self, c: Rgb<u8>) -> bool {
        c == self.background || c == self.overlay
    }
}

/// Composite layers onto the canvas in index order.
/// `origin` is the canvas position of world coordinate (0,0). Disabled layers
/// and layers colored with the overlay sentinel are skipped.
pub fn composite(canvas: &mut RgbImage, origin: (i64, i64), layers: &[Layer], sentinels: Sentinels) {
    for (index, layer) in layers.iter().enumerate() {
        if !layer.is_enabled() || layer.color() == sentinels.overlay {
            tracing::debug!("Layer {} skipped", index);
            continue;
        }
        blend_layer(canvas, origin, layer, sentinels);
        tracing::debug!("Layer {} composited", index);
    }
}

/// Additive blend of one layer. Rows are independent so they are processed
/// in parallel; layers are never processed concurrently.
fn blend_layer(canvas: &mut RgbImage, origin: (i64, i64), layer: &Layer, sentinels: Sentinels) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    let raster = layer.raster();
    let (lw, lh) = (raster.width() as i64, raster.height() as i64);
    let (x, y) = layer.location();

    let left = origin.0 + x as i64 - lw / 2;
    let top = origin.1 + y as i64 - lh / 2;

    // Visible column range of the layer, in layer coordinates.
    let col_start = (-left).max(0);
    let col_end = (cw - left).min(lw);
    if left < 0 || top < 0 || left + lw > cw || top + lh > ch {
        tracing::warn!(
            "Layer {} extends outside the {}x{} canvas and is clipped",
            layer.path().display(),
            cw,
            ch
        );
    }
    if col_start >= col_end || cw == 0 {
        return;
    }

    let color = layer.color();
    let row_len = cw as usize * 3;
    let buf: &mut [u8] = canvas.as_mut();

    buf.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(canvas_y, row)| {
            let layer_y = canvas_y as i64 - top;
            if layer_y < 0 || layer_y >= lh {
                return;
            }
            let src = raster.row(layer_y as u32);
            for layer_x in col_start..col_end {
                let at = (left + layer_x) as usize * 3;
                let px = &mut row[at..at + 3];
                let current = Rgb([px[0], px[1], px[2]]);
                if let Some(next) = paint(current, src[layer_x as usize], color, sentinels) {
                    px.copy_from_slice(&next.0);
                }
            }
        });
}

/// New value for a canvas pixel under one layer sample, or `None` to leave it.
fn paint(current: Rgb<u8>, sample: i32, color: Rgb<u8>, sentinels: Sentinels) -> Option<Rgb<u8>> {
    let unpainted = sentinels.contains(current);
    if sample == 0 {
        // never erase content an earlier layer put down
        unpainted.then_some(sentinels.background)
    } else if unpainted {
        Some(color)
    } else {
        Some(color::saturating_add(current, color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTINELS: Sentinels = Sentinels {
        background: Rgb([0, 0, 0]),
        overlay: Rgb([1, 1, 1]),
    };

    #[test]
    fn zero_sample_marks_only_unpainted_pixels() {
        assert_eq!(paint(Rgb([1, 1, 1]), 0, Rgb([9, 9, 9]), SENTINELS), Some(Rgb([0, 0, 0])));
        assert_eq!(paint(Rgb([0, 0, 0]), 0, Rgb([9, 9, 9]), SENTINELS), Some(Rgb([0, 0, 0])));
        assert_eq!(paint(Rgb([50, 0, 0]), 0, Rgb([9, 9, 9]), SENTINELS), None);
    }

    #[test]
    fn placement_outside_the_canvas_is_clipped() {
        use crate::image_store::Raster;
        use crate::layers::LayerSet;

        let mut set = LayerSet::new();
        let i = set.add_raster("big.raw", Raster::new(4, 4, vec![1; 16]).unwrap()).unwrap();
        set.set_layer_color(i, Rgb([200, 0, 0])).unwrap();
        set.set_location(i, 1, -1).unwrap();

        // With origin (1,1) the layer covers canvas columns 0..4 and rows -2..2.
        let mut canvas = RgbImage::from_pixel(3, 3, SENTINELS.overlay);
        composite(&mut canvas, (1, 1), set.layers(), SENTINELS);
        for (x, y, px) in canvas.enumerate_pixels() {
            let expected = if y < 2 { Rgb([200, 0, 0]) } else { SENTINELS.overlay };
            assert_eq!(*px, expected, "pixel ({}, {})", x, y);
        }

        // Entirely off the canvas: nothing changes.
        set.set_location(i, 3, -3).unwrap();
        let mut canvas = RgbImage::from_pixel(3, 3, SENTINELS.overlay);
        composite(&mut canvas, (1, 1), set.layers(), SENTINELS);
        assert!(canvas.pixels().all(|p| *p == SENTINELS.overlay));
    }

    #[test]
    fn foreground_sets_then_adds() {
        let red = Rgb([200, 0, 0]);
        assert_eq!(paint(Rgb([1, 1, 1]), 1, red, SENTINELS), Some(red));
        assert_eq!(paint(Rgb([0, 0, 0]), -4, red, SENTINELS), Some(red));
        assert_eq!(
            paint(Rgb([100, 20, 0]), 7, red, SENTINELS),
            Some(Rgb([255, 20, 0]))
        );
    }
}
