//! Geometry primitives shared by the scene graph and the viewer core.

mod aabb;
mod color;
mod ray;

pub use aabb::Aabb;
pub use color::{RgbColor, RgbaColor};
pub use ray::Ray;

/// Tolerance used for floating point comparisons throughout the workspace.
pub const EPSILON: f32 = 1e-6;
