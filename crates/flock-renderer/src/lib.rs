//! # Flock Renderer
//!
//! Draws the flock directly from the simulation buffer, plus the world axes.

pub mod axes;
pub mod camera;
pub mod render_stage;

pub use axes::*;
pub use camera::*;
pub use render_stage::*;
