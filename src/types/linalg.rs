//! Linear algebra aliases for lab-frame geometry
//!
//! All positions are millimetres in the capture system's lab frame.

use nalgebra::{Vector2, Vector3};

pub type Vec3 = Vector3<f64>;
pub type Vec2 = Vector2<f64>;

/// Horizontal (x, y) part of a lab-frame point
pub fn horizontal(point: &Vec3) -> Vec2 {
    Vec2::new(point.x, point.y)
}
