//! Host-side mirror of the per-vertex displacement rule.
//!
//! Both render hosts run this on the GPU (`viewer.html` and
//! `parallax_points.wgsl`); this module exists so the rule can be checked and
//! used for CPU-side bounds without a graphics context.
//!
//! For a point at planar position `(x, y)` with image aspect `ar`:
//!
//! ```text
//! uv = vec2(x, y * ar) / min(ar, 1) + 0.5
//! d  = depth(uv)            // normalized to [0, 1]
//! z  = d
//! s  = 2 - d
//! (x, y) *= s
//! ```
//!
//! Lower depth values spread outward, higher ones contract toward the centre.
//! This is a stylistic parallax, not a reprojection.

use crate::geometry::PointGrid;
use crate::raster::DepthMap;
use rayon::prelude::*;

/// Texture coordinate for a planar position. Shared by depth and color
/// sampling so the two stay aligned. `v = 1` is the top row of the image.
#[inline]
pub fn texture_coord(p: [f32; 2], ar: f32) -> [f32; 2] {
    let k = ar.min(1.0);
    [p[0] / k + 0.5, p[1] * ar / k + 0.5]
}

/// Nearest-texel lookup with clamp-to-edge addressing, normalized to `[0, 1]`.
pub fn sample_depth(depth: &DepthMap, uv: [f32; 2]) -> f32 {
    let w = depth.width();
    let h = depth.height();
    let col = texel_index(uv[0], w);
    let row = texel_index(1.0 - uv[1], h);
    depth.normalized(col, row)
}

#[inline]
fn texel_index(t: f32, n: u32) -> u32 {
    let i = (t * n as f32).floor();
    if i.is_nan() || i < 0.0 {
        0
    } else {
        (i as u32).min(n - 1)
    }
}

/// Applies the displacement to one point given its sampled depth `d`.
#[inline]
pub fn displace(p: [f32; 2], d: f32) -> [f32; 3] {
    let s = 2.0 - d;
    [p[0] * s, p[1] * s, d]
}

/// Displaced positions for every grid point.
pub fn displace_grid(grid: &PointGrid, depth: &DepthMap) -> Vec<[f32; 3]> {
    let ar = grid.aspect_ratio();
    grid.positions()
        .par_iter()
        .map(|&p| displace(p, sample_depth(depth, texture_coord(p, ar))))
        .collect()
}

/// Axis-aligned bounds of the displaced grid, `(min, max)`.
pub fn displaced_bounds(points: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    points
        .par_iter()
        .map(|p| (*p, *p))
        .reduce(
            || ([f32::INFINITY; 3], [f32::NEG_INFINITY; 3]),
            |(a_min, a_max), (b_min, b_max)| {
                (
                    [
                        a_min[0].min(b_min[0]),
                        a_min[1].min(b_min[1]),
                        a_min[2].min(b_min[2]),
                    ],
                    [
                        a_max[0].max(b_max[0]),
                        a_max[1].max(b_max[1]),
                        a_max[2].max(b_max[2]),
                    ],
                )
            },
        )
}
