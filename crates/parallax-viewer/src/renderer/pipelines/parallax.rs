use crate::data::{
    textures,
    types::{grid_instances, FrameUniformStd140 as FrameUniform, GridInstance},
};
use anyhow::Result;
use depthview::{ColorImage, DepthMap, PointGrid};
use wgpu::util::DeviceExt;

/// Instanced point-sprite pipeline that displaces the grid by the depth texture.
pub struct ParallaxPipeline {
    pipeline: wgpu::RenderPipeline,
    texture_layout: wgpu::BindGroupLayout,
    frame_ubo: wgpu::Buffer,
    frame_bind: wgpu::BindGroup,
    quad_vb: wgpu::Buffer,
    sampler: wgpu::Sampler,

    instances: Option<(wgpu::Buffer, u32)>,
    color: Option<wgpu::Texture>,
    depth: Option<wgpu::Texture>,
    texture_bind: Option<wgpu::BindGroup>,
}

impl ParallaxPipeline {
    pub fn new(
        device: &wgpu::Device,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
    ) -> Self {
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame UBO Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<FrameUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Color/Depth Texture Layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let frame_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame UBO"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_ubo.as_entire_binding(),
            }],
        });

        // Nearest texel, clamped: one point per pixel reads exactly its own texel.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Texel Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shaders/parallax_points.wgsl"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../../../shaders/parallax_points.wgsl").into(),
            ),
        });

        // Two triangles covering the sprite, in half-extent units.
        let quad_corners: [[f32; 2]; 6] = [
            [-1.0, -1.0],
            [1.0, -1.0],
            [1.0, 1.0],
            [-1.0, -1.0],
            [1.0, 1.0],
            [-1.0, 1.0],
        ];
        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sprite Quad VB"),
            contents: bytemuck::cast_slice(&quad_corners),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let vbuf_layouts = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    shader_location: 0,
                    offset: 0,
                    format: wgpu::VertexFormat::Float32x2,
                }],
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<GridInstance>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[wgpu::VertexAttribute {
                    shader_location: 1,
                    offset: 0,
                    format: wgpu::VertexFormat::Float32x2,
                }],
            },
        ];

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Parallax PipelineLayout"),
            bind_group_layouts: &[&frame_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Parallax Points Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &vbuf_layouts,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_fmt,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_fmt,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self {
            pipeline,
            texture_layout,
            frame_ubo,
            frame_bind,
            quad_vb,
            sampler,
            instances: None,
            color: None,
            depth: None,
            texture_bind: None,
        }
    }

    /// Uploads one instance per grid point. Topology is fixed afterwards.
    pub fn set_grid(&mut self, device: &wgpu::Device, grid: &PointGrid) {
        let instances = grid_instances(grid.positions());
        let vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid Instance VB"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });
        self.instances = Some((vb, instances.len() as u32));
    }

    pub fn set_color(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &ColorImage,
    ) -> Result<()> {
        self.color = Some(textures::upload_color(device, queue, image)?);
        self.rebind(device);
        Ok(())
    }

    pub fn set_depth(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        depth: &DepthMap,
    ) -> Result<()> {
        self.depth = Some(textures::upload_depth(device, queue, depth)?);
        self.rebind(device);
        Ok(())
    }

    fn rebind(&mut self, device: &wgpu::Device) {
        let (Some(color), Some(depth)) = (&self.color, &self.depth) else {
            return;
        };
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        self.texture_bind = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Color/Depth Bind Group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&depth_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        }));
    }

    pub fn write_frame(&self, queue: &wgpu::Queue, frame: &FrameUniform) {
        queue.write_buffer(&self.frame_ubo, 0, bytemuck::bytes_of(frame));
    }

    /// Grid, color and depth all bound.
    pub fn is_ready(&self) -> bool {
        self.instances.is_some() && self.texture_bind.is_some()
    }

    pub fn point_count(&self) -> u32 {
        self.instances.as_ref().map_or(0, |(_, n)| *n)
    }

    /// Drops all scene resources; the pipeline itself stays usable.
    pub fn clear(&mut self) {
        self.instances = None;
        self.color = None;
        self.depth = None;
        self.texture_bind = None;
    }

    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        let (Some((vb, count)), Some(bind)) = (&self.instances, &self.texture_bind) else {
            return;
        };
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.frame_bind, &[]);
        rpass.set_bind_group(1, bind, &[]);
        rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
        rpass.set_vertex_buffer(1, vb.slice(..));
        rpass.draw(0..6, 0..*count);
    }
}
