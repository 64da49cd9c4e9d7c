//! Uniform block consumed by the update program

use bytemuck::{Pod, Zeroable};
use flock_core::ParameterSet;
use glam::Vec3;

/// Mirrors `FlockUniforms` in `flock_update.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct FlockUniforms {
    pub separation_radius: f32,
    pub cohesion_radius: f32,
    pub align_radius: f32,
    pub separation_strength: f32,

    pub cohesion_strength: f32,
    pub align_strength: f32,
    pub time_step: f32,
    pub boid_speed: f32,

    /// Point the flock is pulled back towards
    pub reference_point: [f32; 3],
    pub color_radius: f32,
}

const _: () = assert!(
    std::mem::size_of::<FlockUniforms>() == 48,
    "size of FlockUniforms does not match WGSL"
);
const _: () = assert!(
    std::mem::offset_of!(FlockUniforms, reference_point) == 32,
    "offset of FlockUniforms.reference_point does not match WGSL"
);
const _: () = assert!(
    std::mem::offset_of!(FlockUniforms, color_radius) == 44,
    "offset of FlockUniforms.color_radius does not match WGSL"
);

impl FlockUniforms {
    pub fn new(params: &ParameterSet, reference_point: Vec3) -> Self {
        Self {
            separation_radius: params.separation_radius,
            cohesion_radius: params.cohesion_radius,
            align_radius: params.align_radius,
            separation_strength: params.separation_strength,
            cohesion_strength: params.cohesion_strength,
            align_strength: params.align_strength,
            time_step: params.time_step,
            boid_speed: params.boid_speed,
            reference_point: reference_point.to_array(),
            color_radius: params.color_radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copies_every_parameter() {
        let params = ParameterSet {
            separation_radius: 1.0,
            cohesion_radius: 2.0,
            align_radius: 3.0,
            separation_strength: 4.0,
            cohesion_strength: 5.0,
            align_strength: 6.0,
            time_step: 7.0,
            boid_speed: 8.0,
            color_radius: 9.0,
            point_size: 10.0,
        };
        let uniforms = FlockUniforms::new(&params, Vec3::new(11.0, 12.0, 13.0));
        let words: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&uniforms));
        assert_eq!(
            words,
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 11.0, 12.0, 13.0, 9.0]
        );
    }
}
