//! Fixed constants shared by the host code and the WGSL programs
//!
//! The workgroup size must match `@workgroup_size` in `flock_update.wgsl`.

/// Invocations per compute workgroup
pub const WORK_GROUP_SIZE: u32 = 128;

/// Particle count used when no startup argument is given
pub const DEFAULT_PARTICLE_COUNT: u32 = 60_000;

/// Radius of the seed sphere
pub const SPAWN_RADIUS: f32 = 180.0;

/// Offset of the seed sphere center from the reference point
pub const SPAWN_OFFSET: [f32; 3] = [0.0, 40.0, 0.0];

/// Magnitude of the random offset between position and previous position.
/// This seeds the initial apparent velocity.
pub const JITTER: f32 = 10.0;

/// Lower bound of the per-particle damping factor
pub const DAMPING_MIN: f32 = 0.965;

/// Upper bound of the per-particle damping factor
pub const DAMPING_MAX: f32 = 0.985;

/// Seed color for every particle (RGBA)
pub const INITIAL_COLOR: [f32; 4] = [0.2, 0.2, 0.2, 1.0];
