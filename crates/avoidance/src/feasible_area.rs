//! Feasible velocity region
//!
//! Starts from a square slightly larger than the agent's speed disc and cuts
//! it with every constraint line in turn. The result is the convex set of
//! velocities admissible by all constraints.

use avoidance_common::{Error, PolygonBuffer, Result, clip_polygon};
use glam::Vec2;

use crate::config::{FEASIBLE_AREA_MAX_VERTEX_COUNT, MAX_FEASIBLE_AREA_CONSTRAINTS};
use crate::constraints::ConstraintLine;

/// Inline polygon used for feasible regions
pub type FeasiblePolygon = PolygonBuffer<FEASIBLE_AREA_MAX_VERTEX_COUNT>;

/// Feasible region of one agent, with its clipping scratch space
#[derive(Debug, Clone, Default)]
pub struct FeasibleArea {
    polygon: FeasiblePolygon,
    scratch: FeasiblePolygon,
}

impl FeasibleArea {
    /// Creates an empty region
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the region for `max_speed` cut by `lines`.
    ///
    /// Fails without touching the polygon buffers when the constraints could
    /// produce more vertices than the inline buffer holds.
    pub fn build(&mut self, lines: &[ConstraintLine], max_speed: f32) -> Result<()> {
        if lines.len() > MAX_FEASIBLE_AREA_CONSTRAINTS {
            log::warn!(
                "Too many constraints for the feasible area: {} (capacity {})",
                lines.len(),
                FEASIBLE_AREA_MAX_VERTEX_COUNT
            );
            self.polygon.clear();
            return Err(Error::FeasibleAreaOverflow {
                constraints: lines.len(),
                capacity: FEASIBLE_AREA_MAX_VERTEX_COUNT,
            });
        }

        let half_extent = 1.0 + max_speed;
        self.polygon.clear();
        self.polygon.push(Vec2::new(-half_extent, -half_extent))?;
        self.polygon.push(Vec2::new(half_extent, -half_extent))?;
        self.polygon.push(Vec2::new(half_extent, half_extent))?;
        self.polygon.push(Vec2::new(-half_extent, half_extent))?;

        for constraint in lines {
            clip_polygon(self.polygon.as_slice(), &constraint.line, &mut self.scratch)?;
            std::mem::swap(&mut self.polygon, &mut self.scratch);

            if self.polygon.is_empty() {
                break;
            }
        }

        Ok(())
    }

    /// Vertices of the region, counter-clockwise
    pub fn vertices(&self) -> &[Vec2] {
        self.polygon.as_slice()
    }

    /// Checks whether the region has no interior
    pub fn is_empty(&self) -> bool {
        self.polygon.len() < 3
    }

    /// Removes all vertices
    pub fn clear(&mut self) {
        self.polygon.clear();
        self.scratch.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintKind;
    use avoidance_common::{Line2, point_in_convex_polygon};

    fn constraint(point: Vec2, direction: Vec2) -> ConstraintLine {
        ConstraintLine {
            line: Line2::new(point, direction),
            object_index: 0,
            kind: ConstraintKind::Obstacle,
        }
    }

    #[test]
    fn test_unconstrained_area_is_bounding_square() -> Result<()> {
        let mut area = FeasibleArea::new();
        area.build(&[], 2.0)?;

        assert_eq!(
            area.vertices(),
            &[
                Vec2::new(-3.0, -3.0),
                Vec2::new(3.0, -3.0),
                Vec2::new(3.0, 3.0),
                Vec2::new(-3.0, 3.0),
            ]
        );
        assert!(!area.is_empty());
        Ok(())
    }

    #[test]
    fn test_single_constraint_halves_square() -> Result<()> {
        let mut area = FeasibleArea::new();
        // Admissible: x <= 0
        area.build(&[constraint(Vec2::ZERO, Vec2::Y)], 1.0)?;

        assert_eq!(area.vertices().len(), 4);
        assert!(area.vertices().iter().all(|v| v.x <= 1.0e-6));
        assert!(point_in_convex_polygon(area.vertices(), Vec2::new(-1.0, 0.0)));
        assert!(!point_in_convex_polygon(area.vertices(), Vec2::new(1.0, 0.0)));
        Ok(())
    }

    #[test]
    fn test_contradicting_constraints_empty_area() -> Result<()> {
        let mut area = FeasibleArea::new();
        let lines = [
            // x <= -1
            constraint(Vec2::new(-1.0, 0.0), Vec2::Y),
            // x >= 1
            constraint(Vec2::new(1.0, 0.0), -Vec2::Y),
            // never reached
            constraint(Vec2::ZERO, Vec2::X),
        ];
        area.build(&lines, 2.0)?;
        assert!(area.is_empty());
        Ok(())
    }

    #[test]
    fn test_too_many_constraints_rejected() {
        let mut area = FeasibleArea::new();
        let lines = vec![
            constraint(Vec2::ZERO, Vec2::X);
            MAX_FEASIBLE_AREA_CONSTRAINTS + 1
        ];

        assert_eq!(
            area.build(&lines, 1.0),
            Err(Error::FeasibleAreaOverflow {
                constraints: lines.len(),
                capacity: FEASIBLE_AREA_MAX_VERTEX_COUNT,
            })
        );
        assert!(area.is_empty());
    }

    #[test]
    fn test_many_constraints_stay_within_capacity() -> Result<()> {
        let mut area = FeasibleArea::new();
        let count = MAX_FEASIBLE_AREA_CONSTRAINTS;

        // Tangents of a circle of radius 1.5, each cutting off a sliver
        let lines: Vec<_> = (0..count)
            .map(|i| {
                let angle = i as f32 / count as f32 * std::f32::consts::TAU;
                let normal = Vec2::new(angle.cos(), angle.sin());
                constraint(normal * 1.5, normal.perp())
            })
            .collect();

        area.build(&lines, 1.0)?;
        assert!(!area.is_empty());
        assert!(area.vertices().len() <= FEASIBLE_AREA_MAX_VERTEX_COUNT);
        assert!(point_in_convex_polygon(area.vertices(), Vec2::ZERO));
        Ok(())
    }
}
