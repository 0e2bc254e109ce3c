//! Buffer layouts shared with `parallax_points.wgsl`.

use depthview::FrameInputs;

/// Per-instance data: one planar grid position per image pixel.
/// Must match `VsIn.plane_pos` in `parallax_points.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct GridInstance {
    pub plane_pos: [f32; 2],
}

/// Per-frame uniform, std140. Must match `FrameUniform` in the shader.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct FrameUniformStd140 {
    pub view_proj: [[f32; 4]; 4],
    /// Viewport size in physical pixels.
    pub viewport_size: [f32; 2],
    /// Point sprite size in pixels.
    pub point_size_px: f32,
    /// Image `width / height`.
    pub ar: f32,
}

impl From<&FrameInputs> for FrameUniformStd140 {
    fn from(f: &FrameInputs) -> Self {
        Self {
            view_proj: f.view_proj.to_cols_array_2d(),
            viewport_size: [
                f.viewport.width.max(1) as f32,
                f.viewport.height.max(1) as f32,
            ],
            point_size_px: f.point_size_px,
            ar: f.ar,
        }
    }
}

/// Instance data for a point grid.
pub fn grid_instances(positions: &[[f32; 2]]) -> Vec<GridInstance> {
    positions
        .iter()
        .map(|&plane_pos| GridInstance { plane_pos })
        .collect()
}
