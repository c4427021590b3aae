//! Velocity clamping against the navigation mesh
//!
//! Candidate velocities come from an obstacle-only view of the world; walls
//! are unknown to the solver. A [`VelocityClamp`] is consulted before a
//! candidate is accepted so agents do not steer into geometry.

use avoidance_common::{from_planar, planar};
use glam::{Vec2, Vec3};

use crate::actor::NavigationBinding;

/// Identifier of a navigation mesh returned by [`NavMeshRaycast`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub u32);

/// First blocking point found along a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Planar distance from the ray start to the hit
    pub distance: f32,
    /// Hit position
    pub position: Vec3,
}

/// Raw queries offered by a navigation subsystem
pub trait NavMeshRaycast {
    /// Mesh enclosing `position` for the given binding, if any
    fn enclosing_mesh(&self, binding: &NavigationBinding, position: Vec3) -> Option<MeshId>;

    /// Casts a ray over `mesh` from `from` to `to`; `None` means the path is clear
    fn raycast(
        &self,
        mesh: MeshId,
        binding: &NavigationBinding,
        from: Vec3,
        to: Vec3,
    ) -> Option<RayHit>;
}

/// Restricts a candidate velocity to what the environment allows.
///
/// Implementations must be free of side effects observable by the solver;
/// the same candidate may be clamped more than once per tick.
pub trait VelocityClamp {
    /// Returns the clamped version of `candidate`
    fn clamp_velocity(
        &self,
        binding: &NavigationBinding,
        position: Vec3,
        current_velocity: Vec2,
        candidate: Vec2,
        time_step: f32,
    ) -> Vec2;
}

/// Clamp that leaves every candidate untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClamp;

impl VelocityClamp for NoClamp {
    fn clamp_velocity(
        &self,
        _binding: &NavigationBinding,
        _position: Vec3,
        _current_velocity: Vec2,
        candidate: Vec2,
        _time_step: f32,
    ) -> Vec2 {
        candidate
    }
}

/// Clamps candidates with raycasts against a navigation mesh.
///
/// The ray spans one second of travel at the candidate velocity. When it is
/// blocked the speed is reduced so that a single time step ends at the hit.
#[derive(Debug, Clone)]
pub struct NavMeshVelocityClamp<R> {
    navmesh: R,
}

impl<R: NavMeshRaycast> NavMeshVelocityClamp<R> {
    /// Wraps a navigation subsystem
    pub fn new(navmesh: R) -> Self {
        Self { navmesh }
    }

    /// The wrapped navigation subsystem
    pub fn navmesh(&self) -> &R {
        &self.navmesh
    }
}

impl<R: NavMeshRaycast> VelocityClamp for NavMeshVelocityClamp<R> {
    fn clamp_velocity(
        &self,
        binding: &NavigationBinding,
        position: Vec3,
        _current_velocity: Vec2,
        candidate: Vec2,
        time_step: f32,
    ) -> Vec2 {
        let Some(mesh) = self.navmesh.enclosing_mesh(binding, position) else {
            return candidate;
        };

        let from = position;
        let to = position + from_planar(candidate, 0.0);

        match self.navmesh.raycast(mesh, binding, from, to) {
            Some(hit) => {
                let reachable = hit.distance.max(0.0) / time_step.max(f32::EPSILON);
                candidate.normalize_or_zero() * reachable.min(candidate.length())
            }
            None => planar(to - from),
        }
    }
}

impl<T: VelocityClamp + ?Sized> VelocityClamp for &T {
    fn clamp_velocity(
        &self,
        binding: &NavigationBinding,
        position: Vec3,
        current_velocity: Vec2,
        candidate: Vec2,
        time_step: f32,
    ) -> Vec2 {
        (**self).clamp_velocity(binding, position, current_velocity, candidate, time_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Everything beyond `x = wall_x` is blocked
    struct HalfPlaneMesh {
        wall_x: f32,
        mesh: Option<MeshId>,
    }

    impl NavMeshRaycast for HalfPlaneMesh {
        fn enclosing_mesh(&self, _binding: &NavigationBinding, _position: Vec3) -> Option<MeshId> {
            self.mesh
        }

        fn raycast(
            &self,
            _mesh: MeshId,
            _binding: &NavigationBinding,
            from: Vec3,
            to: Vec3,
        ) -> Option<RayHit> {
            if to.x <= self.wall_x {
                return None;
            }
            let t = (self.wall_x - from.x) / (to.x - from.x);
            let position = from + (to - from) * t;
            Some(RayHit {
                distance: planar(position - from).length(),
                position,
            })
        }
    }

    #[test]
    fn test_no_clamp_is_identity() {
        let v = NoClamp.clamp_velocity(
            &NavigationBinding::default(),
            Vec3::ZERO,
            Vec2::ZERO,
            Vec2::new(3.0, -1.0),
            0.1,
        );
        assert_eq!(v, Vec2::new(3.0, -1.0));
    }

    #[test]
    fn test_clear_ray_keeps_candidate() {
        let clamp = NavMeshVelocityClamp::new(HalfPlaneMesh {
            wall_x: 10.0,
            mesh: Some(MeshId(0)),
        });
        let v = clamp.clamp_velocity(
            &NavigationBinding::default(),
            Vec3::new(1.0, 4.0, 2.0),
            Vec2::ZERO,
            Vec2::new(2.0, 1.0),
            0.1,
        );
        assert!((v - Vec2::new(2.0, 1.0)).length() < 1.0e-6);
    }

    #[test]
    fn test_hit_limits_speed_to_one_step() {
        let clamp = NavMeshVelocityClamp::new(HalfPlaneMesh {
            wall_x: 0.1,
            mesh: Some(MeshId(0)),
        });
        let binding = NavigationBinding::default();

        // Wall 0.1 away: one step of 0.1s may cover it at 1 m/s
        let v = clamp.clamp_velocity(&binding, Vec3::ZERO, Vec2::ZERO, Vec2::new(4.0, 0.0), 0.1);
        assert!((v - Vec2::new(1.0, 0.0)).length() < 1.0e-5);

        // A far enough wall does not slow the agent down
        let v = clamp.clamp_velocity(&binding, Vec3::ZERO, Vec2::ZERO, Vec2::new(0.5, 0.0), 0.1);
        assert!((v - Vec2::new(0.5, 0.0)).length() < 1.0e-6);
    }

    #[test]
    fn test_touching_wall_stops_agent() {
        let clamp = NavMeshVelocityClamp::new(HalfPlaneMesh {
            wall_x: 0.0,
            mesh: Some(MeshId(0)),
        });
        let v = clamp.clamp_velocity(
            &NavigationBinding::default(),
            Vec3::ZERO,
            Vec2::ZERO,
            Vec2::new(2.0, 0.0),
            0.1,
        );
        assert!(v.length() < 1.0e-6);
    }

    #[test]
    fn test_no_enclosing_mesh_passes_candidate() {
        let clamp = NavMeshVelocityClamp::new(HalfPlaneMesh {
            wall_x: 0.0,
            mesh: None,
        });
        let v = clamp.clamp_velocity(
            &NavigationBinding::default(),
            Vec3::ZERO,
            Vec2::ZERO,
            Vec2::new(2.0, 0.0),
            0.1,
        );
        assert_eq!(v, Vec2::new(2.0, 0.0));
    }
}
