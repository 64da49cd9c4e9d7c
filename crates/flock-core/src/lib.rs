//! # Flock Core
//!
//! Host-side data model for the GPU flocking simulation: the shader-visible
//! particle record, the tunable parameter set and the seed distribution.

pub mod constants;
pub mod params;
pub mod particle;
pub mod seed;

pub use constants::*;
pub use params::*;
pub use particle::*;
pub use seed::*;
