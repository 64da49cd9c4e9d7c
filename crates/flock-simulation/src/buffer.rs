//! Particle storage and identifier streams
//!
//! The particle buffer is bound at the same slot by both programs: read-write
//! from the update pass, read-only from the render vertex stage. The record
//! layout on the WGSL side must match [`ParticleRecord`] field for field; a
//! mismatch shows up as garbage data, never as an error.

use crate::context::GpuContext;
use crate::error::{GpuError, SetupError};
use flock_core::{particle_ids, ParticleRecord, WORK_GROUP_SIZE};
use wgpu::util::DeviceExt;

/// Binding slot of the particle array in group 0 of both programs
pub const PARTICLE_BINDING: u32 = 0;

/// Binding slot of the per-stage uniform block in group 0
pub const UNIFORM_BINDING: u32 = 1;

/// Number of workgroups needed to cover `count` particles
pub fn workgroup_count(count: u32) -> u32 {
    count.div_ceil(WORK_GROUP_SIZE)
}

/// Check every sizing rule for a particle array of `count` records.
pub fn validate_particle_count(
    count: u32,
    max_groups: u32,
    max_binding_size: u64,
) -> Result<(), SetupError> {
    if count == 0 {
        return Err(SetupError::Empty);
    }
    if count % WORK_GROUP_SIZE != 0 {
        return Err(SetupError::UnalignedCount {
            count,
            group_size: WORK_GROUP_SIZE,
        });
    }

    let groups = workgroup_count(count);
    if groups > max_groups {
        return Err(SetupError::DispatchCapacity {
            groups,
            max_groups,
        });
    }

    let size = count as u64 * ParticleRecord::SIZE;
    if size > max_binding_size {
        return Err(SetupError::BufferTooLarge {
            size,
            max_size: max_binding_size,
        });
    }

    Ok(())
}

/// Fixed-capacity GPU array of particle records.
pub struct SimulationBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl SimulationBuffer {
    /// Upload `records` once. The buffer has no `COPY_DST` usage, so after
    /// creation only shaders can change its contents.
    pub fn create(ctx: &GpuContext, records: &[ParticleRecord]) -> Result<Self, SetupError> {
        let count = u32::try_from(records.len()).map_err(|_| SetupError::DispatchCapacity {
            groups: u32::MAX,
            max_groups: ctx.max_dispatch_groups(),
        })?;
        validate_particle_count(
            count,
            ctx.max_dispatch_groups(),
            ctx.max_storage_binding_size(),
        )?;

        let buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Particle Buffer"),
                contents: bytemuck::cast_slice(records),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            });

        log::info!(
            "✓ Particle buffer: {} records × {} bytes = {} bytes",
            count,
            ParticleRecord::SIZE,
            buffer.size()
        );

        Ok(Self { buffer, count })
    }

    /// Check `count` against the device limits, then fill and upload the
    /// array. `seed` only runs once the size is known to fit.
    pub fn create_with<F>(ctx: &GpuContext, count: u32, seed: F) -> Result<Self, SetupError>
    where
        F: FnOnce(u32) -> Vec<ParticleRecord>,
    {
        validate_particle_count(
            count,
            ctx.max_dispatch_groups(),
            ctx.max_storage_binding_size(),
        )?;
        Self::create(ctx, &seed(count))
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Bind group entry exposing the array at [`PARTICLE_BINDING`]
    pub fn binding(&self) -> wgpu::BindGroupEntry<'_> {
        wgpu::BindGroupEntry {
            binding: PARTICLE_BINDING,
            resource: self.buffer.as_entire_binding(),
        }
    }

    /// Layout entry for the array, read-write for compute, read-only otherwise
    pub fn layout_entry(visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
        let read_only = !visibility.contains(wgpu::ShaderStages::COMPUTE);
        wgpu::BindGroupLayoutEntry {
            binding: PARTICLE_BINDING,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(ParticleRecord::SIZE),
            },
            count: None,
        }
    }

    /// Copy the whole array back to the host.
    ///
    /// Blocks until the GPU has finished all submitted work. Meant for tests
    /// and debugging, never for the frame loop.
    pub fn read_records(&self, ctx: &GpuContext) -> Result<Vec<ParticleRecord>, GpuError> {
        let size = self.buffer.size();
        let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Readback Staging Buffer"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Particle Readback Encoder"),
            });
        encoder.copy_buffer_to_buffer(&self.buffer, 0, &staging, 0, size);
        ctx.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        ctx.wait_idle()?;

        rx.recv()
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?;

        let records = {
            let data = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, ParticleRecord>(&data).to_vec()
        };
        staging.unmap();

        Ok(records)
    }
}

/// Immutable `[0, N)` identifier stream bound as vertex attribute 0.
pub struct IndexStream {
    buffer: wgpu::Buffer,
    count: u32,
}

impl IndexStream {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Uint32];

    pub fn create(ctx: &GpuContext, count: u32) -> Self {
        let ids = particle_ids(count);
        let buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Particle Id Buffer"),
                contents: bytemuck::cast_slice(&ids),
                usage: wgpu::BufferUsages::VERTEX,
            });

        Self { buffer, count }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// One `u32` per vertex (or per instance) at shader location 0
    pub fn vertex_layout(step_mode: wgpu::VertexStepMode) -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<u32>() as wgpu::BufferAddress,
            step_mode,
            attributes: &Self::ATTRIBUTES,
        }
    }
}
