//! World axis lines through the reference point

use crate::render_stage::depth_stencil_state;
use bytemuck::{Pod, Zeroable};
use flock_simulation::{
    build_program, compile_module, GpuContext, ProgramError, ProgramSource, ShaderFailurePolicy,
};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

pub const AXIS_LENGTH: f32 = 1000.0;

pub const AXES_PROGRAM: ProgramSource = ProgramSource::Embedded {
    label: "axes.wgsl",
    code: include_str!("shaders/axes.wgsl"),
};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct AxisVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl AxisVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<AxisVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

fn srgb_to_linear(channel: u8) -> f32 {
    let c = channel as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_rgb(rgb: &catppuccin::Rgb) -> [f32; 3] {
    [srgb_to_linear(rgb.r), srgb_to_linear(rgb.g), srgb_to_linear(rgb.b)]
}

/// Line list of the x (red), y (green) and z (blue) axes, each `length`
/// units long and centred on `center`.
pub fn axis_vertices(center: Vec3, length: f32) -> [AxisVertex; 6] {
    let colors = &catppuccin::PALETTE.mocha.colors;
    let half = length * 0.5;

    let axis = |direction: Vec3, color: [f32; 3]| {
        [
            AxisVertex {
                position: (center - direction * half).to_array(),
                color,
            },
            AxisVertex {
                position: (center + direction * half).to_array(),
                color,
            },
        ]
    };

    let [x0, x1] = axis(Vec3::X, linear_rgb(&colors.red.rgb));
    let [y0, y1] = axis(Vec3::Y, linear_rgb(&colors.green.rgb));
    let [z0, z1] = axis(Vec3::Z, linear_rgb(&colors.blue.rgb));
    [x0, x1, y0, y1, z0, z1]
}

pub struct AxesRenderer {
    pipeline: Option<wgpu::RenderPipeline>,
    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl AxesRenderer {
    pub fn new(
        ctx: &GpuContext,
        surface_format: wgpu::TextureFormat,
        center: Vec3,
        policy: ShaderFailurePolicy,
    ) -> Result<Self, ProgramError> {
        let device = &ctx.device;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Axes Vertex Buffer"),
            contents: bytemuck::cast_slice(&axis_vertices(center, AXIS_LENGTH)),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Axes Uniform Buffer"),
            size: std::mem::size_of::<[[f32; 4]; 4]>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Axes Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Axes Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline = policy.resolve(Self::build_pipeline(
            ctx,
            surface_format,
            &bind_group_layout,
        ))?;

        Ok(Self {
            pipeline,
            vertex_buffer,
            uniform_buffer,
            bind_group,
        })
    }

    fn build_pipeline(
        ctx: &GpuContext,
        surface_format: wgpu::TextureFormat,
        bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Result<wgpu::RenderPipeline, ProgramError> {
        let device = &ctx.device;
        let shader = compile_module(device, &AXES_PROGRAM)?;

        build_program(device, &AXES_PROGRAM.label(), || {
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Axes Pipeline Layout"),
                bind_group_layouts: &[bind_group_layout],
                push_constant_ranges: &[],
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Axes Render Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[AxisVertex::layout()],
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
                    topology: wgpu::PrimitiveTopology::LineList,
                    ..Default::default()
                },
                depth_stencil: Some(depth_stencil_state()),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })
    }

    pub fn prepare(&self, ctx: &GpuContext, view_proj: Mat4) {
        ctx.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&view_proj.to_cols_array_2d()),
        );
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if let Some(pipeline) = &self.pipeline {
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.draw(0..6, 0..1);
        }
    }
}
