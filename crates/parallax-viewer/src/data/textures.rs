//! Color and depth texture uploads.

use anyhow::{bail, Result};
use depthview::{ColorImage, DepthMap, Dimensions};

/// Color is stored sRGB so sampling yields linear values for the sRGB surface.
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
/// Depth stays linear: the shader reads raw `value / 255`.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

pub fn check_texture_size(dims: Dimensions, max_side: u32) -> Result<()> {
    if dims.max_side() > max_side {
        bail!("{dims} image exceeds the device texture limit of {max_side} px");
    }
    Ok(())
}

pub fn upload_color(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &ColorImage,
) -> Result<wgpu::Texture> {
    upload(device, queue, "Color Texture", COLOR_FORMAT, image.dimensions(), 4, &image.to_rgba())
}

pub fn upload_depth(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    depth: &DepthMap,
) -> Result<wgpu::Texture> {
    upload(device, queue, "Depth Texture", DEPTH_FORMAT, depth.dimensions(), 1, depth.as_raw())
}

fn upload(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    format: wgpu::TextureFormat,
    dims: Dimensions,
    bytes_per_px: u32,
    texels: &[u8],
) -> Result<wgpu::Texture> {
    check_texture_size(dims, device.limits().max_texture_dimension_2d)?;

    let size = wgpu::Extent3d {
        width: dims.width,
        height: dims.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        texels,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(dims.width * bytes_per_px),
            rows_per_image: Some(dims.height),
        },
        size,
    );

    log::debug!("Uploaded {label} {dims}");
    Ok(texture)
}
