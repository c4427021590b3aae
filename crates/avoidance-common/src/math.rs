//! Math utilities for the avoidance solver

use glam::{Vec2, Vec3};

/// Epsilon below which two planar positions are considered coincident
pub const COINCIDENT_EPSILON: f32 = 1.0e-4;

/// Calculates the cross product of two 2D vectors [(x1,y1), (x2,y2)]
#[inline]
pub fn cross_2d(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    x1 * y2 - y1 * x2
}

/// Signed area of the parallelogram spanned by `a` and `b`.
///
/// Positive when `b` points to the left of `a`, negative when it points to
/// the right and zero when both are parallel.
#[inline]
pub fn left_of(a: Vec2, b: Vec2) -> f32 {
    cross_2d(a.x, a.y, b.x, b.y)
}

/// Clamps a value between min and max
#[inline]
pub fn clamp<T: PartialOrd>(v: T, min: T, max: T) -> T {
    if v < min {
        min
    } else if v > max {
        max
    } else {
        v
    }
}

/// Square a value (x²)
#[inline]
pub fn sqr<T: std::ops::Mul<Output = T> + Copy>(x: T) -> T {
    x * x
}

/// Projects a Y-up world position or velocity onto the XZ plane
#[inline]
pub fn planar(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Lifts a planar vector back into world space at height `y`
#[inline]
pub fn from_planar(v: Vec2, y: f32) -> Vec3 {
    Vec3::new(v.x, y, v.y)
}

/// Checks whether two vertical bands `[y, y + height]` intersect
#[inline]
pub fn height_bands_overlap(a_y: f32, a_height: f32, b_y: f32, b_height: f32) -> bool {
    a_y <= b_y + b_height && b_y <= a_y + a_height
}
