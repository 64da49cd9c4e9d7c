//! Compute stage that advances the flock by one step
//!
//! A step binds the update pipeline, uploads the current [`FlockUniforms`],
//! binds the particle buffer and dispatches one workgroup per
//! [`WORK_GROUP_SIZE`] boids in x. The compute pass is closed before
//! returning. wgpu places the storage-buffer barrier at that pass boundary,
//! so any later pass in the same encoder (the render pass, or the next step)
//! sees the written records.

use crate::buffer::{workgroup_count, SimulationBuffer, UNIFORM_BINDING};
use crate::context::GpuContext;
use crate::error::ProgramError;
use crate::program::{build_program, compile_module, ProgramSource, ShaderFailurePolicy};
use crate::uniforms::FlockUniforms;
use flock_core::{ParameterSet, RunState, WORK_GROUP_SIZE};
use glam::Vec3;

/// Embedded flocking program
pub const UPDATE_PROGRAM: ProgramSource = ProgramSource::Embedded {
    label: "flock_update.wgsl",
    code: include_str!("shaders/flock_update.wgsl"),
};

/// Result of one call to [`UpdateStage::step`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Run state is idle, nothing was recorded
    Paused,
    /// No update program is available, nothing was recorded
    Skipped,
    /// A dispatch was recorded and its pass closed
    Dispatched { workgroups: u32 },
}

/// GPU update stage.
pub struct UpdateStage {
    pipeline: Option<wgpu::ComputePipeline>,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    reference_point: Vec3,
    warned_missing: bool,
}

impl UpdateStage {
    /// Build the stage. Under [`ShaderFailurePolicy::Degrade`] a program that
    /// fails to build leaves the stage without a pipeline and every step is
    /// skipped.
    pub fn new(
        ctx: &GpuContext,
        source: &ProgramSource,
        policy: ShaderFailurePolicy,
    ) -> Result<Self, ProgramError> {
        let device = &ctx.device;

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Flock Uniform Buffer"),
            size: std::mem::size_of::<FlockUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Flock Update Bind Group Layout"),
            entries: &[
                // Particles (Storage, read-write) - Binding 0
                SimulationBuffer::layout_entry(wgpu::ShaderStages::COMPUTE),
                // Flock uniforms - Binding 1
                wgpu::BindGroupLayoutEntry {
                    binding: UNIFORM_BINDING,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline = policy.resolve(Self::build_pipeline(ctx, source, &bind_group_layout))?;
        if pipeline.is_some() {
            log::info!("✓ Update pipeline created from {}", source.label());
        }

        Ok(Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            reference_point: Vec3::ZERO,
            warned_missing: false,
        })
    }

    fn build_pipeline(
        ctx: &GpuContext,
        source: &ProgramSource,
        bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Result<wgpu::ComputePipeline, ProgramError> {
        let device = &ctx.device;
        let shader = compile_module(device, source)?;

        build_program(device, &source.label(), || {
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Flock Update Pipeline Layout"),
                bind_group_layouts: &[bind_group_layout],
                push_constant_ranges: &[],
            });

            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("Flock Update Pipeline"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            })
        })
    }

    /// True when the stage has a working program
    pub fn is_ready(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn reference_point(&self) -> Vec3 {
        self.reference_point
    }

    /// Set the point the flock is recentred towards
    pub fn set_reference_point(&mut self, point: Vec3) {
        self.reference_point = point;
    }

    /// Record one step into `encoder` if `run_state` is stepping.
    ///
    /// The uniforms are written through the queue, so they take effect at
    /// the next submit. Record at most one step per submit.
    pub fn step(
        &mut self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        buffer: &SimulationBuffer,
        params: &ParameterSet,
        run_state: RunState,
    ) -> StepOutcome {
        if !run_state.is_stepping() {
            return StepOutcome::Paused;
        }

        let Some(pipeline) = &self.pipeline else {
            if !self.warned_missing {
                log::warn!("Update program unavailable, skipping simulation steps");
                self.warned_missing = true;
            }
            return StepOutcome::Skipped;
        };

        let uniforms = FlockUniforms::new(params, self.reference_point);
        ctx.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Flock Update Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                buffer.binding(),
                wgpu::BindGroupEntry {
                    binding: UNIFORM_BINDING,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let workgroups = workgroup_count(buffer.count());
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Flock Update Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(pipeline);
            compute_pass.set_bind_group(0, &bind_group, &[]);
            // Only dispatching in the x dimension
            compute_pass.dispatch_workgroups(workgroups, 1, 1);
        }

        log::trace!(
            "Dispatched {} workgroups of {} for {} boids",
            workgroups,
            WORK_GROUP_SIZE,
            buffer.count()
        );

        StepOutcome::Dispatched { workgroups }
    }

    /// Record and submit a single step regardless of the run state.
    pub fn step_now(
        &mut self,
        ctx: &GpuContext,
        buffer: &SimulationBuffer,
        params: &ParameterSet,
    ) -> StepOutcome {
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Flock Step Encoder"),
            });

        let outcome = self.step(ctx, &mut encoder, buffer, params, RunState::Stepping);
        ctx.queue.submit(std::iter::once(encoder.finish()));
        outcome
    }
}
