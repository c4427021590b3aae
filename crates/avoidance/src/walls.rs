//! Minimal navigation geometry made of wall segments
//!
//! Stands in for a real navigation mesh where none is available, such as in
//! scenario files and tests. Walls block rays in the plane only.

use avoidance_common::{planar, segment_intersection_2d};
use glam::{Vec2, Vec3};

use crate::actor::NavigationBinding;
use crate::clamp::{MeshId, NavMeshRaycast, RayHit};

/// A blocking segment on the navigable plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallSegment {
    /// First end point
    pub start: Vec2,
    /// Second end point
    pub end: Vec2,
}

impl WallSegment {
    /// Creates a wall between two planar points
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }
}

/// Wall segments with an optional rectangular walkable area.
///
/// Positions outside the area have no enclosing mesh; the area border blocks
/// rays like any other wall.
#[derive(Debug, Clone, Default)]
pub struct WallSegments {
    walls: Vec<WallSegment>,
    bounds: Option<(Vec2, Vec2)>,
}

impl WallSegments {
    /// Creates an unbounded, empty set of walls
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the walkable area to the rectangle `min..max`
    pub fn with_bounds(mut self, min: Vec2, max: Vec2) -> Self {
        self.bounds = Some((min.min(max), min.max(max)));
        self
    }

    /// Adds a wall
    pub fn add_wall(&mut self, wall: WallSegment) {
        self.walls.push(wall);
    }

    /// Walls added so far, without the area border
    pub fn walls(&self) -> &[WallSegment] {
        &self.walls
    }

    /// Walkable area, if restricted
    pub fn bounds(&self) -> Option<(Vec2, Vec2)> {
        self.bounds
    }

    fn border(&self) -> impl Iterator<Item = WallSegment> + '_ {
        self.bounds.into_iter().flat_map(|(min, max)| {
            let corners = [
                min,
                Vec2::new(max.x, min.y),
                max,
                Vec2::new(min.x, max.y),
            ];
            (0..4).map(move |i| WallSegment::new(corners[i], corners[(i + 1) % 4]))
        })
    }
}

impl NavMeshRaycast for WallSegments {
    fn enclosing_mesh(&self, binding: &NavigationBinding, position: Vec3) -> Option<MeshId> {
        if let Some((min, max)) = self.bounds {
            let p = planar(position);
            if p.x < min.x || p.y < min.y || p.x > max.x || p.y > max.y {
                return None;
            }
        }
        Some(MeshId(binding.agent_type.0))
    }

    fn raycast(
        &self,
        _mesh: MeshId,
        _binding: &NavigationBinding,
        from: Vec3,
        to: Vec3,
    ) -> Option<RayHit> {
        let start = planar(from);
        let end = planar(to);

        let t = self
            .walls
            .iter()
            .copied()
            .chain(self.border())
            .filter_map(|wall| segment_intersection_2d(start, end, wall.start, wall.end))
            .fold(None, |nearest: Option<f32>, t| {
                Some(nearest.map_or(t, |n| n.min(t)))
            })?;

        Some(RayHit {
            distance: (end - start).length() * t,
            position: from.lerp(to, t),
        })
    }
}
