//! Point rendering straight from the particle buffer
//!
//! The vertex stage reads the same storage buffer the update pass writes,
//! read-only, and looks records up through the [`IndexStream`]. No vertex
//! data is transformed on the host.

use crate::camera::Camera;
use bytemuck::{Pod, Zeroable};
use flock_core::ParameterSet;
use flock_simulation::{
    build_program, compile_module, GpuContext, IndexStream, ProgramError, ProgramSource,
    ShaderFailurePolicy, SimulationBuffer, UNIFORM_BINDING,
};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Embedded point program
pub const POINTS_PROGRAM: ProgramSource = ProgramSource::Embedded {
    label: "points.wgsl",
    code: include_str!("shaders/points.wgsl"),
};

/// How each particle is rasterized. The default sprite mode trades the
/// one-vertex-per-particle draw for points larger than one pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointMode {
    /// `PointList` topology, one vertex per particle, always one pixel
    Native,
    /// Screen-aligned quad of `point_size` pixels, one instance per particle
    #[default]
    Sprite,
}

impl PointMode {
    fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            PointMode::Native => wgpu::PrimitiveTopology::PointList,
            PointMode::Sprite => wgpu::PrimitiveTopology::TriangleList,
        }
    }

    fn step_mode(self) -> wgpu::VertexStepMode {
        match self {
            PointMode::Native => wgpu::VertexStepMode::Vertex,
            PointMode::Sprite => wgpu::VertexStepMode::Instance,
        }
    }

    fn entry_point(self) -> &'static str {
        match self {
            PointMode::Native => "vs_point",
            PointMode::Sprite => "vs_sprite",
        }
    }

    /// Vertex and instance ranges that draw `count` particles
    pub fn draw_ranges(self, count: u32) -> (std::ops::Range<u32>, std::ops::Range<u32>) {
        match self {
            PointMode::Native => (0..count, 0..1),
            PointMode::Sprite => (0..6, 0..count),
        }
    }
}

/// Mirrors `RenderUniforms` in `points.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct RenderUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// Surface size in pixels
    pub viewport: [f32; 2],
    pub point_size: f32,
    pub _pad: f32,
}

const _: () = assert!(
    std::mem::size_of::<RenderUniforms>() == 80,
    "size of RenderUniforms does not match WGSL"
);
const _: () = assert!(
    std::mem::offset_of!(RenderUniforms, viewport) == 64,
    "offset of RenderUniforms.viewport does not match WGSL"
);
const _: () = assert!(
    std::mem::offset_of!(RenderUniforms, point_size) == 72,
    "offset of RenderUniforms.point_size does not match WGSL"
);

impl RenderUniforms {
    pub fn new(camera: &Camera, params: &ParameterSet, width: u32, height: u32) -> Self {
        Self {
            view_proj: camera.build_view_projection_matrix().to_cols_array_2d(),
            viewport: [width.max(1) as f32, height.max(1) as f32],
            point_size: params.point_size.max(1.0),
            _pad: 0.0,
        }
    }
}

/// Depth attachment sized to the surface
pub struct DepthTarget {
    view: wgpu::TextureView,
}

impl DepthTarget {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        Self {
            view: depth_texture.create_view(&wgpu::TextureViewDescriptor::default()),
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Attachment that clears depth to the far plane
    pub fn attachment(&self) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }
    }
}

/// Depth state shared by every scene pipeline
pub(crate) fn depth_stencil_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Render stage drawing one point per particle.
pub struct RenderStage {
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    mode: PointMode,
    warned_missing: bool,
}

impl RenderStage {
    pub fn new(
        ctx: &GpuContext,
        source: &ProgramSource,
        surface_format: wgpu::TextureFormat,
        mode: PointMode,
        policy: ShaderFailurePolicy,
    ) -> Result<Self, ProgramError> {
        let device = &ctx.device;

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Render Uniform Buffer"),
            size: std::mem::size_of::<RenderUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Points Bind Group Layout"),
            entries: &[
                // Particles (Storage, read-only) - Binding 0
                SimulationBuffer::layout_entry(wgpu::ShaderStages::VERTEX),
                // Render uniforms - Binding 1
                wgpu::BindGroupLayoutEntry {
                    binding: UNIFORM_BINDING,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline = policy.resolve(Self::build_pipeline(
            ctx,
            source,
            surface_format,
            mode,
            &bind_group_layout,
        ))?;
        if pipeline.is_some() {
            log::info!("✓ Render pipeline created from {} ({:?})", source.label(), mode);
        }

        Ok(Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            mode,
            warned_missing: false,
        })
    }

    fn build_pipeline(
        ctx: &GpuContext,
        source: &ProgramSource,
        surface_format: wgpu::TextureFormat,
        mode: PointMode,
        bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Result<wgpu::RenderPipeline, ProgramError> {
        let device = &ctx.device;
        let shader = compile_module(device, source)?;

        build_program(device, &source.label(), || {
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Points Pipeline Layout"),
                bind_group_layouts: &[bind_group_layout],
                push_constant_ranges: &[],
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Points Render Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some(mode.entry_point()),
                    buffers: &[IndexStream::vertex_layout(mode.step_mode())],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: mode.topology(),
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil: Some(depth_stencil_state()),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })
    }

    pub fn is_ready(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn mode(&self) -> PointMode {
        self.mode
    }

    /// Bind group over the particle buffer and the render uniforms.
    /// The buffer never changes, so this is built once.
    pub fn bind(&self, ctx: &GpuContext, buffer: &SimulationBuffer) -> wgpu::BindGroup {
        ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Points Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                buffer.binding(),
                wgpu::BindGroupEntry {
                    binding: UNIFORM_BINDING,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        })
    }

    /// Upload this frame's camera and point size
    pub fn prepare(&self, ctx: &GpuContext, uniforms: &RenderUniforms) {
        ctx.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[*uniforms]));
    }

    /// Draw every particle. Returns false when no program is available.
    ///
    /// Only [`PointMode::Native`] issues a point-list draw of exactly N
    /// vertices. [`PointMode::Sprite`] draws 6 vertices for each of N
    /// instances, so every particle still maps to one index-stream entry.
    pub fn draw(
        &mut self,
        pass: &mut wgpu::RenderPass<'_>,
        bind_group: &wgpu::BindGroup,
        index_stream: &IndexStream,
    ) -> bool {
        let Some(pipeline) = &self.pipeline else {
            if !self.warned_missing {
                log::warn!("Render program unavailable, skipping particle draw");
                self.warned_missing = true;
            }
            return false;
        };

        let (vertices, instances) = self.mode.draw_ranges(index_stream.count());
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.set_vertex_buffer(0, index_stream.buffer().slice(..));
        pass.draw(vertices, instances);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_draw_ranges() {
        assert_eq!(PointMode::Native.draw_ranges(256), (0..256, 0..1));
        assert_eq!(PointMode::Sprite.draw_ranges(256), (0..6, 0..256));
    }

    #[test]
    fn test_default_mode_is_sprite() {
        assert_eq!(PointMode::default(), PointMode::Sprite);
        assert_eq!(
            PointMode::Sprite.topology(),
            wgpu::PrimitiveTopology::TriangleList
        );
        assert_eq!(PointMode::Native.topology(), wgpu::PrimitiveTopology::PointList);
    }

    #[test]
    fn test_uniforms_clamp_point_size() {
        let camera = Camera::new(1920, 1080, Vec3::ZERO);
        let params = ParameterSet {
            point_size: 0.0,
            ..ParameterSet::default()
        };
        let uniforms = RenderUniforms::new(&camera, &params, 1920, 1080);
        assert_eq!(uniforms.point_size, 1.0);
        assert_eq!(uniforms.viewport, [1920.0, 1080.0]);
        assert_eq!(
            uniforms.view_proj,
            camera.build_view_projection_matrix().to_cols_array_2d()
        );
    }
}
