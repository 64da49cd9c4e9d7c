//! Initial particle distribution

use crate::constants::{DAMPING_MAX, DAMPING_MIN, INITIAL_COLOR, JITTER, SPAWN_RADIUS};
use crate::particle::ParticleRecord;
use glam::{Vec3, Vec4};
use rand::Rng;

/// Position of particle `index` out of `count` on the seed sphere.
///
/// Azimuth advances by `256π / count` and inclination by `π / count` per
/// index, which winds the particles into a tight spiral from pole to pole.
pub fn sphere_position(index: u32, count: u32, center: Vec3) -> Vec3 {
    let azimuth = 256.0 * std::f32::consts::PI / count as f32;
    let inclination = std::f32::consts::PI / count as f32;
    let i = index as f32;

    let x = SPAWN_RADIUS * (inclination * i).sin() * (azimuth * i).cos();
    let y = SPAWN_RADIUS * (inclination * i).cos();
    let z = SPAWN_RADIUS * (inclination * i).sin() * (azimuth * i).sin();

    center + Vec3::new(x, y, z)
}

/// Uniformly distributed unit vector
pub fn random_unit_vector(rng: &mut impl Rng) -> Vec3 {
    let theta = rng.random::<f32>() * std::f32::consts::TAU;
    let cos_phi = rng.random::<f32>() * 2.0 - 1.0;
    let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();

    Vec3::new(sin_phi * theta.cos(), sin_phi * theta.sin(), cos_phi)
}

/// Build the initial record array.
///
/// Positions are deterministic. The previous position is jittered by a random
/// unit vector scaled by [`JITTER`] and the damping is drawn from
/// `[DAMPING_MIN, DAMPING_MAX]`, both from `rng`.
pub fn seed_particles(count: u32, center: Vec3, rng: &mut impl Rng) -> Vec<ParticleRecord> {
    (0..count)
        .map(|i| {
            let position = sphere_position(i, count, center);
            let previous_position = position + random_unit_vector(rng) * JITTER;
            let damping = rng.random_range(DAMPING_MIN..=DAMPING_MAX);

            ParticleRecord::new(
                position,
                previous_position,
                Vec4::from_array(INITIAL_COLOR),
                damping,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const CENTER: Vec3 = Vec3::new(10.0, 40.0, -5.0);

    #[test]
    fn test_positions_on_sphere() {
        let mut rng = StdRng::seed_from_u64(7);
        let particles = seed_particles(1280, CENTER, &mut rng);
        assert_eq!(particles.len(), 1280);

        for (i, p) in particles.iter().enumerate() {
            let r = (p.position() - CENTER).length();
            assert!(
                (r - SPAWN_RADIUS).abs() < 1e-3,
                "particle {} at radius {}",
                i,
                r
            );
        }
    }

    #[test]
    fn test_first_particle_at_pole() {
        let p = sphere_position(0, 128, CENTER);
        assert_eq!(p, CENTER + Vec3::new(0.0, SPAWN_RADIUS, 0.0));
    }

    #[test]
    fn test_positions_independent_of_rng() {
        let a = seed_particles(256, CENTER, &mut StdRng::seed_from_u64(1));
        let b = seed_particles(256, CENTER, &mut StdRng::seed_from_u64(2));
        for (pa, pb) in a.iter().zip(&b) {
            assert_eq!(pa.position, pb.position);
        }
    }

    #[test]
    fn test_damping_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for p in seed_particles(4096, Vec3::ZERO, &mut rng) {
            assert!((DAMPING_MIN..=DAMPING_MAX).contains(&p.damping));
        }
    }

    #[test]
    fn test_jitter_magnitude() {
        let mut rng = StdRng::seed_from_u64(3);
        for p in seed_particles(1024, Vec3::ZERO, &mut rng) {
            let offset = (p.previous_position() - p.position()).length();
            assert!((offset - JITTER).abs() < 1e-3, "offset {}", offset);
        }
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let a = seed_particles(128, CENTER, &mut StdRng::seed_from_u64(99));
        let b = seed_particles(128, CENTER, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_initial_color() {
        let mut rng = StdRng::seed_from_u64(5);
        let particles = seed_particles(128, CENTER, &mut rng);
        assert!(particles.iter().all(|p| p.color == INITIAL_COLOR));
    }

    #[test]
    fn test_unit_vector_is_normalized() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1000 {
            let v = random_unit_vector(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-5);
        }
    }
}
