//! 2D geometry operations for velocity-space computations
//!
//! All polygons handled here are convex and wound counter-clockwise, so the
//! interior of every edge lies on its left. Half-planes follow the same
//! convention: the admissible side of a directed line is its left side.

use glam::Vec2;

use crate::math::left_of;
use crate::{PolygonBuffer, Result};

/// Edges whose cross product with a clip line falls below this are treated as parallel
pub const PARALLEL_EPSILON: f32 = 1.0e-6;

/// Tolerance used for inside/outside classification of points
pub const INSIDE_EPSILON: f32 = 1.0e-5;

/// Directed line in the plane; its left side is the admissible half-plane
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Line2 {
    /// Point on the line
    pub point: Vec2,
    /// Direction of the line (not required to be normalized)
    pub direction: Vec2,
}

impl Line2 {
    /// Creates a new line
    pub const fn new(point: Vec2, direction: Vec2) -> Self {
        Self { point, direction }
    }

    /// Signed side of `p`: positive on the left, negative on the right
    #[inline]
    pub fn side(&self, p: Vec2) -> f32 {
        left_of(self.direction, p - self.point)
    }

    /// Checks whether `p` lies in the closed admissible half-plane
    #[inline]
    pub fn is_admissible(&self, p: Vec2) -> bool {
        self.side(p) >= 0.0
    }

    /// Intersection of the segment `a -> b` with this line.
    ///
    /// Returns `None` when the segment is numerically parallel to the line.
    pub fn intersect_segment(&self, a: Vec2, b: Vec2) -> Option<Vec2> {
        let edge = b - a;
        let denom = left_of(self.direction, edge);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = (-self.side(a) / denom).clamp(0.0, 1.0);
        Some(a + edge * t)
    }
}

/// Clips a convex polygon against the admissible side of `line`.
///
/// Sutherland-Hodgman pass: vertices on the admissible side are kept and the
/// line/edge intersection is inserted wherever the side changes. An empty
/// output means the polygon lies entirely outside the half-plane.
pub fn clip_polygon<const N: usize>(
    polygon: &[Vec2],
    line: &Line2,
    output: &mut PolygonBuffer<N>,
) -> Result<()> {
    output.clear();

    let Some(&last) = polygon.last() else {
        return Ok(());
    };

    let mut prev = last;
    let mut prev_inside = line.is_admissible(prev);

    for &current in polygon {
        let current_inside = line.is_admissible(current);

        if prev_inside != current_inside {
            if let Some(hit) = line.intersect_segment(prev, current) {
                output.push(hit)?;
            }
        }
        if current_inside {
            output.push(current)?;
        }

        prev = current;
        prev_inside = current_inside;
    }

    Ok(())
}

/// Checks if a point is inside (or on the border of) a convex CCW polygon
pub fn point_in_convex_polygon(polygon: &[Vec2], p: Vec2) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let n = polygon.len();
    (0..n).all(|i| {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        left_of(b - a, p - a) >= -INSIDE_EPSILON
    })
}

/// Clips the segment `a -> b` against a convex CCW polygon.
///
/// Returns the parametric interval `(t_enter, t_exit)` of the part of the
/// segment inside the polygon, or `None` when the segment misses it.
pub fn clip_segment_to_convex_polygon(polygon: &[Vec2], a: Vec2, b: Vec2) -> Option<(f32, f32)> {
    if polygon.len() < 3 {
        return None;
    }

    let d = b - a;
    let mut t_enter = 0.0f32;
    let mut t_exit = 1.0f32;
    let n = polygon.len();

    for i in 0..n {
        let p = polygon[i];
        let e = polygon[(i + 1) % n] - p;
        let num = left_of(e, a - p);
        let den = left_of(e, d);

        if den.abs() < PARALLEL_EPSILON {
            if num < -INSIDE_EPSILON {
                return None;
            }
            continue;
        }

        let t = -num / den;
        if den > 0.0 {
            t_enter = t_enter.max(t);
        } else {
            t_exit = t_exit.min(t);
        }

        if t_enter > t_exit {
            return None;
        }
    }

    Some((t_enter, t_exit))
}

/// Up to two intersection points between a segment and a circle
#[derive(Debug, Clone, Copy, Default)]
pub struct CircleHits {
    points: [Vec2; 2],
    count: usize,
}

impl CircleHits {
    fn push(&mut self, p: Vec2) {
        if self.count < 2 {
            self.points[self.count] = p;
            self.count += 1;
        }
    }

    /// Intersection points found
    pub fn as_slice(&self) -> &[Vec2] {
        &self.points[..self.count]
    }

    /// Number of intersection points found
    pub fn len(&self) -> usize {
        self.count
    }

    /// Checks whether no intersection was found
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Intersects the segment `a -> b` with the circle of `radius` centered at the origin
pub fn segment_circle_intersections(a: Vec2, b: Vec2, radius: f32) -> CircleHits {
    let mut hits = CircleHits::default();

    let d = b - a;
    let qa = d.length_squared();
    if qa < PARALLEL_EPSILON {
        return hits;
    }
    let qb = 2.0 * a.dot(d);
    let qc = a.length_squared() - radius * radius;
    let discriminant = qb * qb - 4.0 * qa * qc;
    if discriminant < 0.0 {
        return hits;
    }

    let root = discriminant.sqrt();
    let t0 = (-qb - root) / (2.0 * qa);
    let t1 = (-qb + root) / (2.0 * qa);

    if (0.0..=1.0).contains(&t0) {
        hits.push(a + d * t0);
    }
    if root > 0.0 && (0.0..=1.0).contains(&t1) {
        hits.push(a + d * t1);
    }

    hits
}

/// Intersects segment `p0 -> p1` with segment `q0 -> q1`.
///
/// Returns the parameter along the first segment, in `[0, 1]`.
pub fn segment_intersection_2d(p0: Vec2, p1: Vec2, q0: Vec2, q1: Vec2) -> Option<f32> {
    let r = p1 - p0;
    let s = q1 - q0;
    let denom = left_of(r, s);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }

    let qp = q0 - p0;
    let t = left_of(qp, s) / denom;
    let u = left_of(qp, r) / denom;

    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(t)
    } else {
        None
    }
}
