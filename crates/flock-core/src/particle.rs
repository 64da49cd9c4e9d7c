//! Shader-visible particle record

use crate::constants::WORK_GROUP_SIZE;
use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

/// GPU-compatible boid record.
///
/// The layout follows the storage-buffer rules used by `flock_update.wgsl` and
/// `points.wgsl`: every vector starts on a 16-byte boundary and the total size
/// is a multiple of 16. Reordering fields or dropping a padding member shifts
/// every later field in the shader's view without any error being raised.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleRecord {
    /// Current position
    pub position: [f32; 3],
    pub _pad0: f32,

    /// Position at the previous step. Velocity is `position - previous_position`.
    pub previous_position: [f32; 3],
    pub _pad1: f32,

    /// Reserved alignment block, unused by both programs
    pub _reserved: [f32; 4],

    /// RGBA tint written by the update program
    pub color: [f32; 4],

    /// Per-particle velocity decay, fixed at creation
    pub damping: f32,
    pub _pad2: [f32; 3],
}

const _: () = assert!(
    std::mem::size_of::<ParticleRecord>() == 80,
    "size of ParticleRecord does not match WGSL"
);
const _: () = assert!(
    std::mem::size_of::<ParticleRecord>() % 16 == 0,
    "ParticleRecord must be a multiple of 16 bytes"
);
const _: () = assert!(
    std::mem::offset_of!(ParticleRecord, position) == 0,
    "offset of ParticleRecord.position does not match WGSL"
);
const _: () = assert!(
    std::mem::offset_of!(ParticleRecord, previous_position) == 16,
    "offset of ParticleRecord.previous_position does not match WGSL"
);
const _: () = assert!(
    std::mem::offset_of!(ParticleRecord, _reserved) == 32,
    "offset of ParticleRecord._reserved does not match WGSL"
);
const _: () = assert!(
    std::mem::offset_of!(ParticleRecord, color) == 48,
    "offset of ParticleRecord.color does not match WGSL"
);
const _: () = assert!(
    std::mem::offset_of!(ParticleRecord, damping) == 64,
    "offset of ParticleRecord.damping does not match WGSL"
);

impl ParticleRecord {
    /// Size of one record in bytes
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn new(position: Vec3, previous_position: Vec3, color: Vec4, damping: f32) -> Self {
        Self {
            position: position.to_array(),
            previous_position: previous_position.to_array(),
            color: color.to_array(),
            damping,
            ..Self::zeroed()
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn previous_position(&self) -> Vec3 {
        Vec3::from_array(self.previous_position)
    }

    /// Implicit velocity carried between steps
    pub fn velocity(&self) -> Vec3 {
        self.position() - self.previous_position()
    }

    /// True when every non-padding field is bit-identical to `other`
    pub fn same_payload(&self, other: &Self) -> bool {
        fn bits<const N: usize>(values: [f32; N]) -> [u32; N] {
            values.map(f32::to_bits)
        }

        bits(self.position) == bits(other.position)
            && bits(self.previous_position) == bits(other.previous_position)
            && bits(self.color) == bits(other.color)
            && self.damping.to_bits() == other.damping.to_bits()
    }
}

/// Round `count` up to the next multiple of [`WORK_GROUP_SIZE`]
pub fn align_to_work_group(count: u32) -> u32 {
    count.div_ceil(WORK_GROUP_SIZE) * WORK_GROUP_SIZE
}

/// Identifier stream `[0, 1, .., count - 1]` used by the render stage to look
/// up each point's record.
pub fn particle_ids(count: u32) -> Vec<u32> {
    (0..count).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_layout() {
        assert_eq!(ParticleRecord::SIZE, 80);
        assert_eq!(std::mem::align_of::<ParticleRecord>(), 4);
        assert_eq!(std::mem::offset_of!(ParticleRecord, _pad0), 12);
        assert_eq!(std::mem::offset_of!(ParticleRecord, _pad1), 28);
        assert_eq!(std::mem::offset_of!(ParticleRecord, _pad2), 68);
    }

    #[test]
    fn test_padding_is_zeroed() {
        let record = ParticleRecord::new(Vec3::ONE, Vec3::ZERO, Vec4::ONE, 0.97);
        assert_eq!(record._pad0, 0.0);
        assert_eq!(record._pad1, 0.0);
        assert_eq!(record._reserved, [0.0; 4]);
        assert_eq!(record._pad2, [0.0; 3]);
    }

    #[test]
    fn test_byte_view_places_fields_at_offsets() {
        let record = ParticleRecord::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec4::new(0.1, 0.2, 0.3, 0.4),
            0.975,
        );
        let words: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&record));
        assert_eq!(words.len(), 20);
        assert_eq!(&words[0..3], &[1.0, 2.0, 3.0]);
        assert_eq!(&words[4..7], &[4.0, 5.0, 6.0]);
        assert_eq!(&words[12..16], &[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(words[16], 0.975);
    }

    #[test]
    fn test_same_payload_ignores_padding() {
        let a = ParticleRecord::new(Vec3::X, Vec3::Y, Vec4::W, 0.97);
        let mut b = a;
        b._pad0 = 9.0;
        b._reserved = [1.0; 4];
        assert!(a.same_payload(&b));

        b.damping = 0.98;
        assert!(!a.same_payload(&b));
    }

    #[test]
    fn test_velocity() {
        let record = ParticleRecord::new(Vec3::new(3.0, 0.0, 0.0), Vec3::X, Vec4::ONE, 0.97);
        assert_eq!(record.velocity(), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_align_to_work_group() {
        assert_eq!(align_to_work_group(60_000), 60_032);
        assert_eq!(align_to_work_group(128), 128);
        assert_eq!(align_to_work_group(1), 128);
        assert_eq!(align_to_work_group(0), 0);
    }

    #[test]
    fn test_particle_ids() {
        assert_eq!(particle_ids(4), vec![0, 1, 2, 3]);
        assert!(particle_ids(0).is_empty());
    }
}
