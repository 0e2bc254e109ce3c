//! Point grid geometry: one unconnected point per source pixel.

use crate::raster::Dimensions;

/// A `W x H` lattice of points in the `z = 0` plane, centred on the origin.
///
/// The plane spans `(W / max(W, H), H / max(W, H))`, so the longer side is
/// always 1. Points sit at pixel centres; row 0 is the top (+y) row. Topology
/// never changes after construction; displacement happens per vertex on the
/// graphics pipeline.
///
/// Zero-area dimensions give an empty grid with a zero extent.
#[derive(Debug, Clone, PartialEq)]
pub struct PointGrid {
    dims: Dimensions,
    extent: [f32; 2],
    positions: Vec<[f32; 2]>,
}

impl PointGrid {
    pub fn new(dims: Dimensions) -> Self {
        let extent = plane_extent(dims);
        let (w, h) = (dims.width as usize, dims.height as usize);

        let mut positions = Vec::with_capacity(w * h);
        for row in 0..h {
            let y = (0.5 - (row as f32 + 0.5) / h as f32) * extent[1];
            for col in 0..w {
                let x = ((col as f32 + 0.5) / w as f32 - 0.5) * extent[0];
                positions.push([x, y]);
            }
        }

        log::debug!(
            "Point grid {}: {} points, extent {:.3}x{:.3}",
            dims,
            positions.len(),
            extent[0],
            extent[1]
        );

        Self {
            dims,
            extent,
            positions,
        }
    }

    #[inline]
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Plane size `(width, height)` in scene units.
    #[inline]
    pub fn extent(&self) -> [f32; 2] {
        self.extent
    }

    /// `width / height` of the source image; bound as the `ar` shader input.
    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.dims.aspect_ratio()
    }

    #[inline]
    pub fn positions(&self) -> &[[f32; 2]] {
        &self.positions
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Planar position of the point for pixel `(col, row)`.
    #[inline]
    pub fn point(&self, col: u32, row: u32) -> [f32; 2] {
        self.positions[row as usize * self.dims.width as usize + col as usize]
    }

    /// Indices of the top-left, top-right, bottom-left and bottom-right points,
    /// or `None` for an empty grid.
    pub fn corner_indices(&self) -> Option<[usize; 4]> {
        if self.is_empty() {
            return None;
        }
        let w = self.dims.width as usize;
        let h = self.dims.height as usize;
        Some([0, w - 1, (h - 1) * w, h * w - 1])
    }
}

/// `(W / max(W, H), H / max(W, H))`, or zero when either side is zero.
pub fn plane_extent(dims: Dimensions) -> [f32; 2] {
    if dims.pixel_count() == 0 {
        return [0.0, 0.0];
    }
    let max = dims.max_side() as f32;
    [dims.width as f32 / max, dims.height as f32 / max]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_point_per_pixel() {
        let grid = PointGrid::new(Dimensions::new(512, 384));
        assert_eq!(grid.len(), 512 * 384);
        assert_eq!(grid.extent(), [1.0, 0.75]);
        assert_eq!(grid.aspect_ratio(), 512.0 / 384.0);
    }

    #[test]
    fn portrait_extent_keeps_long_side_unit() {
        assert_eq!(plane_extent(Dimensions::new(300, 600)), [0.5, 1.0]);
    }

    #[test]
    fn single_pixel_is_single_point_at_origin() {
        let grid = PointGrid::new(Dimensions::new(1, 1));
        assert_eq!(grid.positions(), &[[0.0, 0.0]]);
        assert_eq!(grid.corner_indices(), Some([0, 0, 0, 0]));
    }

    #[test]
    fn zero_area_grid_is_empty() {
        for dims in [Dimensions::new(0, 3), Dimensions::new(3, 0), Dimensions::new(0, 0)] {
            let grid = PointGrid::new(dims);
            assert!(grid.is_empty());
            assert_eq!(grid.extent(), [0.0, 0.0]);
            assert_eq!(grid.corner_indices(), None);
        }
    }

    #[test]
    fn rows_run_top_to_bottom_and_are_centred() {
        let grid = PointGrid::new(Dimensions::new(4, 2));
        let [tl, tr, bl, br] = grid.corner_indices().unwrap().map(|i| grid.positions()[i]);
        assert!(tl[1] > bl[1]);
        assert!(tr[0] > tl[0]);
        assert_eq!(tl, [-0.375, 0.125]);
        assert_eq!(br, [0.375, -0.125]);
        let sum = grid
            .positions()
            .iter()
            .fold([0.0f32; 2], |acc, p| [acc[0] + p[0], acc[1] + p[1]]);
        assert!(sum[0].abs() < 1e-5 && sum[1].abs() < 1e-5);
    }
}
