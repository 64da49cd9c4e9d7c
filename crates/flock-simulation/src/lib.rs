//! # Flock Simulation
//!
//! GPU-resident boids simulation: particle storage, program loading and the
//! compute update stage.

pub mod buffer;
pub mod context;
pub mod error;
pub mod program;
pub mod uniforms;
pub mod update;

pub use buffer::*;
pub use context::*;
pub use error::*;
pub use program::*;
pub use uniforms::*;
pub use update::*;
