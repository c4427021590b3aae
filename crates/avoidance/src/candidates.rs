//! Candidate velocity selection
//!
//! The velocity closest to the desired one inside the feasible region lies
//! either at the desired velocity itself or somewhere on the region border.
//! Border points worth trying are gathered and ranked by distance to the
//! desired velocity; the first one that survives the navmesh clamp wins.

use avoidance_common::{
    clip_segment_to_convex_polygon, point_in_convex_polygon, segment_circle_intersections,
};
use glam::Vec2;
use std::cmp::Ordering;

use crate::clamp::VelocityClamp;
use crate::config::{AvoidanceConfig, MIN_WALKABLE_SPEED};
use crate::snapshot::Agent;

/// A proposed velocity and its ranking cost
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Proposed planar velocity
    pub velocity: Vec2,
    /// Squared distance to the desired velocity
    pub cost: f32,
}

impl Candidate {
    fn new(velocity: Vec2, desired: Vec2) -> Self {
        Self {
            velocity,
            cost: velocity.distance_squared(desired),
        }
    }
}

/// Fills `out` with ranked candidates from the feasible region `polygon`.
///
/// Leaves `out` empty when the region is degenerate. When the desired
/// velocity is admissible and reachable it is the only candidate.
pub fn compute_candidates(
    polygon: &[Vec2],
    desired: Vec2,
    max_speed: f32,
    min_speed: f32,
    out: &mut Vec<Candidate>,
) {
    out.clear();

    if polygon.len() < 3 {
        return;
    }

    let desired_speed = desired.length();
    if desired_speed <= max_speed && point_in_convex_polygon(polygon, desired) {
        out.push(Candidate {
            velocity: desired,
            cost: 0.0,
        });
        return;
    }

    let in_speed_range = |v: Vec2| {
        let speed = v.length();
        speed > min_speed && speed <= max_speed
    };

    // Furthest point along the desired direction that is admissible and
    // reachable
    if desired_speed > 0.0 {
        if let Some((t_enter, t_exit)) = clip_segment_to_convex_polygon(polygon, Vec2::ZERO, desired) {
            let t = t_exit.min(max_speed / desired_speed);
            if t >= t_enter {
                let velocity = desired * t;
                if velocity.length() > min_speed {
                    out.push(Candidate::new(velocity, desired));
                }
            }
        }
    }

    let n = polygon.len();
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];

        if in_speed_range(a) {
            out.push(Candidate::new(a, desired));
        }

        for &hit in segment_circle_intersections(a, b, max_speed).as_slice() {
            if hit.length() > min_speed {
                out.push(Candidate::new(hit, desired));
            }
        }
    }

    out.sort_by(|a, b| a.cost.partial_cmp(&b.cost).unwrap_or(Ordering::Equal));
}

/// Returns the first candidate, in ranked order, that is still a usable
/// velocity after clamping.
///
/// Clamping only happens when the configuration asks for it.
pub fn find_first_walkable_velocity<C: VelocityClamp + ?Sized>(
    candidates: &[Candidate],
    agent: &Agent,
    clamp: &C,
    config: &AvoidanceConfig,
) -> Option<Vec2> {
    candidates.iter().find_map(|candidate| {
        let velocity = if config.clamp_velocities_with_navmesh {
            clamp.clamp_velocity(
                &agent.navigation,
                agent.position,
                agent.current_velocity,
                candidate.velocity,
                config.time_step,
            )
        } else {
            candidate.velocity
        };

        (velocity.length() > MIN_WALKABLE_SPEED).then_some(velocity)
    })
}
