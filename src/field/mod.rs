// field/mod.rs
// Force model, line integrator and line point storage

pub mod buffer;
pub mod force;
pub mod integrator;

pub use buffer::{LineWriter, PointBuffer};
pub use force::*;
pub use integrator::LineIntegrator;

use ultraviolet::{DVec2, Vec2};

/// Narrow an integration-precision position to a stored point.
#[inline]
pub fn to_point(pos: DVec2) -> Vec2 {
    Vec2::new(pos.x as f32, pos.y as f32)
}

#[cfg(test)]
mod tests;
