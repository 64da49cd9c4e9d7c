use criterion::{criterion_group, criterion_main, Criterion};
use flock_core::*;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_seed(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);

    c.bench_function("seed_60k", |b| {
        b.iter(|| seed_particles(DEFAULT_PARTICLE_COUNT, Vec3::ZERO, &mut rng))
    });
    c.bench_function("ids_60k", |b| b.iter(|| particle_ids(DEFAULT_PARTICLE_COUNT)));
}

criterion_group!(benches, bench_seed);
criterion_main!(benches);
